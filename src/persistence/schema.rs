//! `SQLite` schema bootstrap logic.
//!
//! All definitions use `IF NOT EXISTS` and are safe to re-run on every
//! server startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS report (
    id              TEXT PRIMARY KEY NOT NULL,
    owner_user      TEXT NOT NULL,
    generated_at    TEXT NOT NULL,
    markdown_body   TEXT NOT NULL,
    summary_text    TEXT NOT NULL,
    task_summary    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_report_generated_at ON report(generated_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
