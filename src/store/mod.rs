use std::path::Path;

use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::Serialize;
use serde_json::Value;
use time::{macros::format_description, OffsetDateTime};
use tracing::debug;

use crate::domains::message::Role;
use crate::domains::state::DialogState;
use crate::error::{LumiraError, Result};

mod schema;
use schema::{dialog_messages, dialogs, test_results};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Applied to every pooled connection. Writers wait for the lock instead of
/// failing with `database is locked`.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

pub const DEFAULT_DIALOG_TITLE: &str = "Новый диалог";
pub const DEFAULT_MESSAGE_LIMIT: usize = 200;

type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;
type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(Debug, Clone, Serialize, Queryable)]
pub struct TestResult {
    pub id: i32,
    pub created_at: String,
    pub topic: Option<String>,
    pub score: i32,
    pub total: i32,
    pub percent: i32,
    pub user_answers: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Average {
    pub correct: i64,
    pub total: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize, Queryable)]
pub struct Dialog {
    pub id: i32,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A dialog row together with its decoded assistant state.
#[derive(Debug, Clone, Serialize)]
pub struct DialogRecord {
    pub id: i32,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    /// `None` when the stored JSON cannot be parsed.
    pub state: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Queryable)]
pub struct DialogMessage {
    pub id: i32,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Queryable)]
struct DialogRow {
    id: i32,
    title: String,
    created_at: String,
    updated_at: String,
    state_json: String,
}

#[derive(QueryableByName)]
struct RowId {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[derive(Insertable)]
#[diesel(table_name = test_results)]
struct NewTestResult<'a> {
    created_at: &'a str,
    topic: Option<&'a str>,
    score: i32,
    total: i32,
    percent: i32,
    user_answers: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = dialogs)]
struct NewDialog<'a> {
    title: &'a str,
    state_json: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = dialog_messages)]
struct NewDialogMessage<'a> {
    dialog_id: i32,
    role: &'a str,
    content: &'a str,
    created_at: &'a str,
}

/// SQLite persistence for dialogs, their messages and finished tests.
pub struct LumiraStore {
    pool: SqlitePool,
}

impl LumiraStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| LumiraError::Storage(e.to_string()))?;
        debug!(path = sqlite_path, "opened sqlite store");
        Ok(Self { pool })
    }

    pub async fn save_test_result(
        &self,
        topic: Option<&str>,
        score: i32,
        total: i32,
        percent: i32,
        user_answers: &str,
    ) -> Result<()> {
        let now = now_text()?;
        let new = NewTestResult {
            created_at: &now,
            topic,
            score,
            total,
            percent,
            user_answers: Some(user_answers),
        };
        let mut conn = self.conn().await?;
        diesel::insert_into(test_results::table)
            .values(&new)
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Newest results first. A topic filter keeps rows whose topic contains
    /// the given substring.
    pub async fn load_test_results(
        &self,
        limit: usize,
        topic: Option<&str>,
    ) -> Result<Vec<TestResult>> {
        let mut conn = self.conn().await?;
        let mut query = test_results::table
            .select((
                test_results::id,
                test_results::created_at,
                test_results::topic,
                test_results::score,
                test_results::total,
                test_results::percent,
                test_results::user_answers,
            ))
            .into_boxed();
        if let Some(topic) = topic.filter(|t| !t.is_empty()) {
            query = query.filter(test_results::topic.like(format!("%{topic}%")));
        }
        query
            .order(test_results::id.desc())
            .limit(limit as i64)
            .load::<TestResult>(&mut conn)
            .await
            .map_err(storage_err)
    }

    pub async fn create_dialog(&self, title: Option<&str>, state: &DialogState) -> Result<Dialog> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_DIALOG_TITLE);
        let state_json = encode_state(state)?;
        let now = now_text()?;
        let new = NewDialog {
            title,
            state_json: &state_json,
            created_at: &now,
            updated_at: &now,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(dialogs::table)
            .values(&new)
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        let row: RowId = diesel::sql_query("SELECT last_insert_rowid() AS id")
            .get_result(&mut conn)
            .await
            .map_err(storage_err)?;

        dialogs::table
            .filter(dialogs::id.eq(row.id as i32))
            .select((
                dialogs::id,
                dialogs::title,
                dialogs::created_at,
                dialogs::updated_at,
            ))
            .first::<Dialog>(&mut conn)
            .await
            .map_err(storage_err)
    }

    pub async fn list_dialogs(&self) -> Result<Vec<Dialog>> {
        let mut conn = self.conn().await?;
        dialogs::table
            .select((
                dialogs::id,
                dialogs::title,
                dialogs::created_at,
                dialogs::updated_at,
            ))
            .order((dialogs::updated_at.desc(), dialogs::id.desc()))
            .load::<Dialog>(&mut conn)
            .await
            .map_err(storage_err)
    }

    pub async fn get_dialog(&self, id: i32) -> Result<Option<DialogRecord>> {
        let mut conn = self.conn().await?;
        let row = dialogs::table
            .filter(dialogs::id.eq(id))
            .select((
                dialogs::id,
                dialogs::title,
                dialogs::created_at,
                dialogs::updated_at,
                dialogs::state_json,
            ))
            .first::<DialogRow>(&mut conn)
            .await
            .optional()
            .map_err(storage_err)?;

        Ok(row.map(|row| DialogRecord {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
            state: serde_json::from_str(&row.state_json).ok(),
        }))
    }

    pub async fn update_dialog_state(&self, id: i32, state: &DialogState) -> Result<()> {
        let state_json = encode_state(state)?;
        let now = now_text()?;
        let mut conn = self.conn().await?;
        diesel::update(dialogs::table.filter(dialogs::id.eq(id)))
            .set((
                dialogs::state_json.eq(state_json),
                dialogs::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    pub async fn rename_dialog(&self, id: i32, title: &str) -> Result<()> {
        let now = now_text()?;
        let mut conn = self.conn().await?;
        diesel::update(dialogs::table.filter(dialogs::id.eq(id)))
            .set((dialogs::title.eq(title), dialogs::updated_at.eq(now)))
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    pub async fn delete_dialog(&self, id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        diesel::delete(dialog_messages::table.filter(dialog_messages::dialog_id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        let count = diesel::delete(dialogs::table.filter(dialogs::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(count > 0)
    }

    pub async fn add_dialog_message(&self, dialog_id: i32, role: Role, content: &str) -> Result<()> {
        let now = now_text()?;
        let new = NewDialogMessage {
            dialog_id,
            role: role.as_str(),
            content,
            created_at: &now,
        };
        let mut conn = self.conn().await?;
        diesel::insert_into(dialog_messages::table)
            .values(&new)
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        diesel::update(dialogs::table.filter(dialogs::id.eq(dialog_id)))
            .set(dialogs::updated_at.eq(now.as_str()))
            .execute(&mut conn)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Oldest messages first.
    pub async fn get_dialog_messages(&self, dialog_id: i32, limit: usize) -> Result<Vec<DialogMessage>> {
        let mut conn = self.conn().await?;
        dialog_messages::table
            .filter(dialog_messages::dialog_id.eq(dialog_id))
            .select((
                dialog_messages::id,
                dialog_messages::role,
                dialog_messages::content,
                dialog_messages::created_at,
            ))
            .order(dialog_messages::id.asc())
            .limit(limit as i64)
            .load::<DialogMessage>(&mut conn)
            .await
            .map_err(storage_err)
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        let mut conn = self.pool.get().await.map_err(storage_err)?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .await
            .map_err(storage_err)?;
        Ok(conn)
    }
}

pub fn calc_average(results: &[TestResult]) -> Average {
    let correct: i64 = results.iter().map(|r| i64::from(r.score)).sum();
    let total: i64 = results.iter().map(|r| i64::from(r.total)).sum();
    let percent = if total > 0 { correct * 100 / total } else { 0 };
    Average {
        correct,
        total,
        percent,
    }
}

fn encode_state(state: &DialogState) -> Result<String> {
    serde_json::to_string(state).map_err(|e| LumiraError::Serialization(e.to_string()))
}

fn storage_err(err: impl std::fmt::Display) -> LumiraError {
    LumiraError::Storage(err.to_string())
}

fn now_text() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(storage_err)
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }
    }
    Ok(())
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = SqliteConnection::establish(&database_url).map_err(storage_err)?;
        SimpleConnection::batch_execute(&mut conn, CONNECTION_PRAGMAS).map_err(storage_err)?;
        // journal mode is persistent, so setting it once per database file is enough
        SimpleConnection::batch_execute(&mut conn, "PRAGMA journal_mode = WAL;")
            .map_err(storage_err)?;
        conn.run_pending_migrations(MIGRATIONS).map_err(storage_err)?;
        Ok::<_, LumiraError>(())
    })
    .await
    .map_err(|e| LumiraError::Runtime(e.to_string()))??;
    Ok(())
}
