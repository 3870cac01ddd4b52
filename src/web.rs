use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::client::Lumira;
use crate::config::Config;
use crate::domains::message::Role;
use crate::domains::state::DialogState;
use crate::error::{LumiraError, Result};
use crate::providers::ocr_space::OcrSpaceClient;
use crate::services::assistant::Assistant;
use crate::store::{Dialog, LumiraStore, DEFAULT_DIALOG_TITLE, DEFAULT_MESSAGE_LIMIT};

mod page;

pub const GREETING_TEXT: &str = "Привет! Я готова помочь с учёбой.";
const DIALOG_NOT_FOUND: &str = "Диалог не найден.";
const EMPTY_MESSAGE: &str = "Введите сообщение.";
const UNTITLED: &str = "Без названия";

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub store: Arc<LumiraStore>,
    pub ocr: Option<Arc<OcrSpaceClient>>,
}

impl AppState {
    pub fn from_lumira(lumira: &Lumira) -> Self {
        Self {
            assistant: lumira.assistant(),
            store: lumira.store(),
            ocr: lumira.ocr(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    dialog_id: i32,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Deserialize, Default)]
struct CreateDialogRequest {
    title: Option<String>,
}

#[derive(Deserialize)]
struct RenameDialogRequest {
    title: String,
}

#[derive(Deserialize)]
struct OcrRequest {
    filename: Option<String>,
    content_base64: String,
    language: Option<String>,
}

#[derive(Serialize)]
struct OcrResponse {
    text: String,
    answer: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/style.css", get(stylesheet))
        .route("/health", get(health))
        .route("/dialogs", get(read_dialogs).post(create_dialog))
        .route(
            "/dialogs/:id",
            axum::routing::delete(remove_dialog).patch(rename_dialog),
        )
        .route("/dialogs/:id/messages", get(read_dialog_messages))
        .route("/dialogs/:id/ocr", post(ocr_upload))
        .route("/chat", post(chat))
        .with_state(state)
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

fn failure(err: LumiraError) -> Response {
    let status = match &err {
        LumiraError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LumiraError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    error_response(status, err.to_string())
}

/// Body parse failures keep the `{"detail": ...}` shape the page expects.
fn rejection(err: JsonRejection) -> Response {
    error_response(err.status(), err.body_text())
}

pub async fn create_dialog_with_greeting(
    store: &LumiraStore,
    title: Option<&str>,
) -> Result<Dialog> {
    let dialog = store.create_dialog(title, &DialogState::new()).await?;
    store
        .add_dialog_message(dialog.id, Role::Assistant, GREETING_TEXT)
        .await?;
    Ok(dialog)
}

/// Makes sure the sidebar always has at least one dialog to show.
pub async fn ensure_default_dialog(store: &LumiraStore) -> Result<()> {
    if store.list_dialogs().await?.is_empty() {
        create_dialog_with_greeting(store, Some(DEFAULT_DIALOG_TITLE)).await?;
    }
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        page::STYLE_CSS,
    )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn read_dialogs(State(state): State<AppState>) -> Response {
    match state.store.list_dialogs().await {
        Ok(dialogs) => Json(dialogs).into_response(),
        Err(err) => failure(err),
    }
}

async fn create_dialog(
    State(state): State<AppState>,
    payload: Option<Json<CreateDialogRequest>>,
) -> Response {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    match create_dialog_with_greeting(&state.store, request.title.as_deref()).await {
        Ok(dialog) => Json(dialog).into_response(),
        Err(err) => failure(err),
    }
}

async fn read_dialog_messages(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let dialog = match state.store.get_dialog(id).await {
        Ok(Some(dialog)) => dialog,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, DIALOG_NOT_FOUND),
        Err(err) => return failure(err),
    };
    match state.store.get_dialog_messages(id, DEFAULT_MESSAGE_LIMIT).await {
        Ok(messages) => Json(json!({
            "dialog": {"id": dialog.id, "title": dialog.title},
            "messages": messages,
        }))
        .into_response(),
        Err(err) => failure(err),
    }
}

async fn remove_dialog(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.store.get_dialog(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, DIALOG_NOT_FOUND),
        Err(err) => return failure(err),
    }
    let result = async {
        state.store.delete_dialog(id).await?;
        ensure_default_dialog(&state.store).await
    }
    .await;
    match result {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(err) => failure(err),
    }
}

async fn rename_dialog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: std::result::Result<Json<RenameDialogRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return rejection(err),
    };
    match state.store.get_dialog(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, DIALOG_NOT_FOUND),
        Err(err) => return failure(err),
    }
    let title = payload.title.trim();
    let title = if title.is_empty() { UNTITLED } else { title };
    match state.store.rename_dialog(id, title).await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(err) => failure(err),
    }
}

/// Stores the user turn, runs the assistant and stores its answer together
/// with the updated dialog state.
async fn run_chat_turn(
    state: &AppState,
    dialog_id: i32,
    message: &str,
    dialog_state: DialogState,
) -> Result<String> {
    state
        .store
        .add_dialog_message(dialog_id, Role::User, message)
        .await?;
    let (answer, new_state) = state.assistant.process(message, dialog_state).await?;
    state.store.update_dialog_state(dialog_id, &new_state).await?;
    state
        .store
        .add_dialog_message(dialog_id, Role::Assistant, &answer)
        .await?;
    Ok(answer)
}

async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return rejection(err),
    };
    let message = payload.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, EMPTY_MESSAGE);
    }

    let dialog = match state.store.get_dialog(payload.dialog_id).await {
        Ok(Some(dialog)) => dialog,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, DIALOG_NOT_FOUND),
        Err(err) => return failure(err),
    };
    let dialog_state = DialogState::normalize(dialog.state);

    match run_chat_turn(&state, dialog.id, message, dialog_state).await {
        Ok(answer) => Json(ChatResponse { answer }).into_response(),
        Err(err) => {
            error!(dialog_id = dialog.id, error = %err, "chat turn failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn decode_upload(content: &str) -> Result<Vec<u8>> {
    let encoded = match content.split_once(";base64,") {
        Some((_, data)) => data,
        None => content,
    };
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| LumiraError::InvalidInput(format!("invalid base64 content: {e}")))
}

async fn ocr_upload(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: std::result::Result<Json<OcrRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return rejection(err),
    };
    let Some(ocr) = state.ocr.clone() else {
        return error_response(StatusCode::BAD_REQUEST, "OCR_SPACE_API_KEY is not configured.");
    };
    match state.store.get_dialog(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, DIALOG_NOT_FOUND),
        Err(err) => return failure(err),
    }

    let filename = payload
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload")
        .to_string();

    let result = async {
        let bytes = decode_upload(&payload.content_base64)?;
        let text = ocr
            .parse_image(&filename, &bytes, payload.language.as_deref(), None)
            .await?;
        let answer = if text.trim().is_empty() {
            "Не удалось распознать текст на изображении.".to_string()
        } else {
            state.assistant.summarize(&text).await?
        };
        state
            .store
            .add_dialog_message(id, Role::User, &format!("[Изображение: {filename}]"))
            .await?;
        state
            .store
            .add_dialog_message(id, Role::Assistant, &answer)
            .await?;
        Ok::<_, LumiraError>(OcrResponse { text, answer })
    }
    .await;

    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => failure(err),
    }
}

pub async fn run(config: Config) -> Result<()> {
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            futures::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };
    run_with_shutdown(config, shutdown).await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let lumira = Lumira::from_config(config).await?;
    ensure_default_dialog(&lumira.store()).await?;

    let app = build_router(AppState::from_lumira(&lumira));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LumiraError::Runtime(e.to_string()))?;
    info!(%addr, "lumira web listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LumiraError::Runtime(e.to_string()))?;

    Ok(())
}
