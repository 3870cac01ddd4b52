use std::sync::Arc;

use lumira::agents::tutor;
use lumira::domains::message::Role;
use lumira::domains::state::DialogState;
use lumira::services::assistant::{Assistant, EMPTY_REQUEST, NO_TEST_TO_CHECK, UNKNOWN_MODE};

mod common;

use common::QueueLlmProvider;

const EXAM_REPLY: &str = "THEME: Планеты\n\
QUESTIONS:\n\
1. Какая планета ближе всего к Солнцу?\n\
a) Венера\n\
b) Меркурий\n\
c) Марс\n\
d) Земля\n\
2. Самая большая планета?\n\
a) Юпитер\n\
b) Сатурн\n\
c) Нептун\n\
d) Уран\n\
ANSWERS:\n\
1-b\n\
2-a\n";

#[tokio::test]
async fn empty_input_and_progress_skip_the_llm() {
    let llm = Arc::new(QueueLlmProvider::new(Vec::<String>::new()));
    let (_db, store) = common::temp_store().await;
    let assistant = Assistant::new(llm.clone(), store);

    let (answer, _) = assistant.process("   ", DialogState::new()).await.unwrap();
    assert_eq!(answer, EMPTY_REQUEST);

    let (answer, _) = assistant.process("прогресс", DialogState::new()).await.unwrap();
    assert_eq!(answer, "Пока нет ни одного завершённого теста.");

    let (answer, _) = assistant
        .process("progress физика", DialogState::new())
        .await
        .unwrap();
    assert_eq!(answer, "Пока нет ни одного теста по теме, содержащей: 'физика'.");

    let (answer, state) = assistant.process("1a 2b", DialogState::new()).await.unwrap();
    assert_eq!(answer, NO_TEST_TO_CHECK);
    assert!(state.current_test.is_none());

    assert_eq!(llm.call_count().await, 0);
}

#[tokio::test]
async fn exam_then_answers_records_a_result() {
    let llm = Arc::new(QueueLlmProvider::new(["2 1", EXAM_REPLY]));
    let (_db, store) = common::temp_store().await;
    let assistant = Assistant::new(llm.clone(), store.clone());

    let (answer, state) = assistant
        .process("Сделай тест по планетам", DialogState::new())
        .await
        .unwrap();
    assert!(answer.contains("1. Какая планета ближе всего к Солнцу?"));
    assert!(!answer.contains("ANSWERS"));
    assert_eq!(state.last_topic.as_deref(), Some("Планеты"));
    assert_eq!(state.current_test.as_ref().map(|t| t.len()), Some(2));

    let (report, state) = assistant.process("1b 2c", state).await.unwrap();
    assert!(report.starts_with("Результаты проверки:"));
    assert!(report.contains("1: верно (B)"));
    assert!(report.contains("2: неверно (ваш ответ: C, правильный: A)"));
    assert!(report.contains("Итого: 1/2 (50%)"));
    assert!(state.current_test.is_none());
    assert_eq!(llm.call_count().await, 2);

    let results = store.load_test_results(10, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].topic.as_deref(), Some("Планеты"));
    assert_eq!(results[0].percent, 50);

    let progress = assistant.show_progress(Some("План")).await.unwrap();
    assert!(progress.contains("1. Тема: Планеты"));
    assert!(progress.contains("Средний результат: 1/2 (50%)"));
}

#[tokio::test]
async fn problem_solver_walks_through_steps() {
    let llm = Arc::new(QueueLlmProvider::new([
        "4 1",
        "1. Перенесём 2 вправо\n2. Ответ: x = 3",
        "Вычитаем 2 из обеих частей уравнения.",
    ]));
    let (_db, store) = common::temp_store().await;
    let assistant = Assistant::new(llm.clone(), store);

    let (answer, state) = assistant
        .process("Реши x + 2 = 5", DialogState::new())
        .await
        .unwrap();
    assert!(answer.contains("Шаг 1 из 2:\nПеренесём 2 вправо"));
    assert!(state.problem_solver.active);

    let (answer, state) = assistant.process("нет", state).await.unwrap();
    assert!(answer.starts_with("Вычитаем 2"));
    assert!(answer.ends_with("Теперь понятно? (да/нет)"));
    assert_eq!(state.problem_solver.current_step, 0);

    let (answer, state) = assistant.process("да", state).await.unwrap();
    assert!(answer.contains("Шаг 2 из 2:\nОтвет: x = 3"));

    let (answer, state) = assistant.process("да", state).await.unwrap();
    assert!(answer.starts_with("Отлично, задача решена!"));
    assert!(!state.problem_solver.active);
    assert_eq!(llm.call_count().await, 3);
}

#[tokio::test]
async fn tutor_keeps_conversation_history() {
    let llm = Arc::new(QueueLlmProvider::new([
        "1 1",
        "Фотосинтез это процесс...",
        "1 0",
        "Хлорофилл поглощает свет.",
    ]));
    let (_db, store) = common::temp_store().await;
    let assistant = Assistant::new(llm.clone(), store);

    let (answer, state) = assistant
        .process("Что такое фотосинтез?", DialogState::new())
        .await
        .unwrap();
    assert_eq!(answer, "Фотосинтез это процесс...");
    assert_eq!(state.last_topic.as_deref(), Some("Что такое фотосинтез?"));
    assert_eq!(state.tutor_history.len(), 2);

    let (_, state) = assistant
        .process("А зачем нужен хлорофилл?", state)
        .await
        .unwrap();
    assert_eq!(state.tutor_history.len(), 4);
    assert_eq!(state.tutor_history[3].role, Role::Assistant);

    let calls = llm.calls.lock().await;
    let last = calls.last().unwrap();
    assert_eq!(last[0].role, Role::System);
    assert_eq!(last[1].content, "Что такое фотосинтез?");
    assert_eq!(last.last().unwrap().content, "А зачем нужен хлорофилл?");
}

#[tokio::test]
async fn summarizer_and_unknown_mode() {
    let llm = Arc::new(QueueLlmProvider::new(["5 0", "Summary:\nкоротко", "9 0"]));
    let (_db, store) = common::temp_store().await;
    let assistant = Assistant::new(llm.clone(), store);

    let (answer, _) = assistant
        .process("Длинная лекция о клетке ...", DialogState::new())
        .await
        .unwrap();
    assert_eq!(answer, "Summary:\nкоротко");

    let (answer, _) = assistant
        .process("что-то странное", DialogState::new())
        .await
        .unwrap();
    assert_eq!(answer, UNKNOWN_MODE);
}

#[tokio::test]
async fn tutor_history_and_context_are_bounded() {
    let replies: Vec<String> = (0..15).map(|i| format!("ответ {i}")).collect();
    let llm = QueueLlmProvider::new(replies);

    let mut history = Vec::new();
    for i in 0..15 {
        let (answer, next) = tutor::run(&llm, &format!("вопрос {i}"), history)
            .await
            .unwrap();
        assert_eq!(answer, format!("ответ {i}"));
        history = next;
    }

    assert_eq!(history.len(), tutor::MAX_HISTORY);
    assert_eq!(history[0].content, "вопрос 5");
    assert_eq!(history.last().unwrap().content, "ответ 14");

    let calls = llm.calls.lock().await;
    let last = calls.last().unwrap();
    // system prompt, the context window, then the new question
    assert_eq!(last.len(), tutor::CONTEXT_WINDOW + 2);
    assert_eq!(last[0].role, Role::System);
    assert_eq!(last[1].content, "вопрос 9");
    assert_eq!(last[last.len() - 1].content, "вопрос 14");
}
