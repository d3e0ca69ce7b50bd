// SQLite Extract Command

use crate::queue::{map_sqlx_error, SqliteQueue};
use async_trait::async_trait;
use drainq_core::domain::validate_keys;
use drainq_core::error::Result;
use drainq_core::port::ExtractCommand;

/// Pops the oldest entries of a key with one DELETE ... RETURNING statement
///
/// A single statement runs under SQLite's write lock, so concurrent pops
/// never return the same row. RETURNING gives no order guarantee, rows are
/// sorted by id afterwards.
pub struct SqlitePopCommand;

#[async_trait]
impl ExtractCommand<SqliteQueue> for SqlitePopCommand {
    async fn execute(
        &self,
        client: &SqliteQueue,
        keys: &[String],
        max_count: usize,
    ) -> Result<Vec<String>> {
        let key = validate_keys(keys)?;
        if max_count == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(max_count).unwrap_or(i64::MAX);

        let mut rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            DELETE FROM queue_entries
            WHERE id IN (
                SELECT id FROM queue_entries
                WHERE queue_key = ?
                ORDER BY id ASC
                LIMIT ?
            )
            RETURNING id, payload
            "#,
        )
        .bind(key)
        .bind(limit)
        .fetch_all(client.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.sort_unstable_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, payload)| payload).collect())
    }
}
