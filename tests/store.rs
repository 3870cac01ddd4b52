use lumira::domains::message::Role;
use lumira::domains::state::DialogState;
use lumira::store::{calc_average, DEFAULT_DIALOG_TITLE, DEFAULT_MESSAGE_LIMIT};

mod common;

#[tokio::test]
async fn dialogs_round_trip_through_sqlite() {
    let (_db, store) = common::temp_store().await;

    let first = store.create_dialog(None, &DialogState::new()).await.unwrap();
    assert_eq!(first.title, DEFAULT_DIALOG_TITLE);
    let second = store
        .create_dialog(Some("Физика"), &DialogState::new())
        .await
        .unwrap();
    assert!(second.id > first.id);

    store
        .add_dialog_message(first.id, Role::User, "привет")
        .await
        .unwrap();
    store
        .add_dialog_message(first.id, Role::Assistant, "здравствуй")
        .await
        .unwrap();

    let messages = store
        .get_dialog_messages(first.id, DEFAULT_MESSAGE_LIMIT)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[1].content, "здравствуй");

    let limited = store.get_dialog_messages(first.id, 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    let dialogs = store.list_dialogs().await.unwrap();
    assert_eq!(dialogs.len(), 2);

    store.rename_dialog(second.id, "Химия").await.unwrap();
    let record = store.get_dialog(second.id).await.unwrap().unwrap();
    assert_eq!(record.title, "Химия");

    assert!(store.get_dialog(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn dialog_state_is_persisted() {
    let (_db, store) = common::temp_store().await;
    let dialog = store.create_dialog(None, &DialogState::new()).await.unwrap();

    let mut state = DialogState::new();
    state.last_topic = Some("дроби".to_string());
    state.current_test = Some([(1, "A".to_string()), (2, "C".to_string())].into());
    store.update_dialog_state(dialog.id, &state).await.unwrap();

    let record = store.get_dialog(dialog.id).await.unwrap().unwrap();
    let restored = DialogState::normalize(record.state);
    assert_eq!(restored, state);
}

#[tokio::test]
async fn deleting_a_dialog_removes_its_messages() {
    let (_db, store) = common::temp_store().await;
    let dialog = store.create_dialog(None, &DialogState::new()).await.unwrap();
    store
        .add_dialog_message(dialog.id, Role::User, "текст")
        .await
        .unwrap();

    assert!(store.delete_dialog(dialog.id).await.unwrap());
    assert!(!store.delete_dialog(dialog.id).await.unwrap());
    assert!(store.get_dialog(dialog.id).await.unwrap().is_none());
    assert!(store
        .get_dialog_messages(dialog.id, DEFAULT_MESSAGE_LIMIT)
        .await
        .unwrap()
        .is_empty());
    assert!(store.list_dialogs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_results_newest_first_with_topic_filter() {
    let (_db, store) = common::temp_store().await;
    store
        .save_test_result(Some("Планеты"), 4, 5, 80, "1a 2b 3c 4d 5a")
        .await
        .unwrap();
    store
        .save_test_result(Some("Дроби"), 1, 5, 20, "1a")
        .await
        .unwrap();
    store
        .save_test_result(None, 3, 4, 75, "1a 2b 3c 4d")
        .await
        .unwrap();

    let all = store.load_test_results(10, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all[0].topic.is_none());
    assert_eq!(all[2].topic.as_deref(), Some("Планеты"));

    let limited = store.load_test_results(2, None).await.unwrap();
    assert_eq!(limited.len(), 2);

    let filtered = store.load_test_results(10, Some("лане")).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].score, 4);

    let average = calc_average(&all);
    assert_eq!(average.correct, 8);
    assert_eq!(average.total, 14);
    assert_eq!(average.percent, 57);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_writes_wait_for_the_lock() {
    let (_db, store) = common::temp_store().await;
    let dialog_id = store.create_dialog(None, &DialogState::new()).await.unwrap().id;

    let mut handles = Vec::new();
    for i in 0..64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .add_dialog_message(dialog_id, Role::User, &format!("сообщение {i}"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let messages = store
        .get_dialog_messages(dialog_id, DEFAULT_MESSAGE_LIMIT)
        .await
        .unwrap();
    assert_eq!(messages.len(), 64);
}

#[tokio::test]
async fn dialogs_are_listed_by_latest_activity() {
    let (_db, store) = common::temp_store().await;
    let first = store.create_dialog(Some("first"), &DialogState::new()).await.unwrap();
    let second = store.create_dialog(Some("second"), &DialogState::new()).await.unwrap();

    // same second: newer id first
    let ids: Vec<i32> = store.list_dialogs().await.unwrap().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    // timestamps have one-second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    store
        .add_dialog_message(first.id, Role::User, "bump")
        .await
        .unwrap();
    let ids: Vec<i32> = store.list_dialogs().await.unwrap().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    store.rename_dialog(second.id, "renamed").await.unwrap();
    let dialogs = store.list_dialogs().await.unwrap();
    assert_eq!(dialogs[0].id, second.id);
    assert_eq!(dialogs[0].title, "renamed");
    assert!(dialogs[0].updated_at > dialogs[1].updated_at);
}
