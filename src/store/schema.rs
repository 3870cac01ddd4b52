diesel::table! {
    test_results (id) {
        id -> Integer,
        created_at -> Text,
        topic -> Nullable<Text>,
        score -> Integer,
        total -> Integer,
        percent -> Integer,
        user_answers -> Nullable<Text>,
    }
}

diesel::table! {
    dialogs (id) {
        id -> Integer,
        title -> Text,
        state_json -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    dialog_messages (id) {
        id -> Integer,
        dialog_id -> Integer,
        role -> Text,
        content -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(dialog_messages -> dialogs (dialog_id));
diesel::allow_tables_to_appear_in_same_query!(test_results, dialogs, dialog_messages);
