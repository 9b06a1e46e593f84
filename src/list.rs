// Saved-list storage: one row per (email, game, purchase position).
//
// A saved purchase_index is the option's position on the page at save time,
// not a stable SKU. If the storefront reorders its purchase sections, the
// index points at a different offer; see DESIGN.md before "fixing" this.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::FromRow;
use tracing::instrument;

use crate::error::ApiError;
use crate::util::db::Db;

#[derive(Debug, Clone, FromRow)]
pub struct ListRow {
    pub game_id: i64,
    pub purchase_index: i32,
}

/// Insert-if-absent. Returns whether a row was actually written; re-saving an
/// already saved option is a no-op, not an error.
#[instrument(skip(db))]
pub async fn add(db: &Db, email: &str, game_id: i64, purchase_index: i32) -> Result<bool, ApiError> {
    let result = sqlx::query(
        "INSERT INTO list (email, game_id, purchase_index)
         VALUES ($1, $2, $3)
         ON CONFLICT DO NOTHING",
    )
    .bind(email)
    .bind(game_id)
    .bind(purchase_index)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete the row if present. Reports ok whether or not anything matched.
#[instrument(skip(db))]
pub async fn remove(
    db: &Db,
    email: &str,
    game_id: i64,
    purchase_index: i32,
) -> Result<u64, ApiError> {
    let result = sqlx::query(
        "DELETE FROM list WHERE email = $1 AND game_id = $2 AND purchase_index = $3",
    )
    .bind(email)
    .bind(game_id)
    .bind(purchase_index)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected())
}

/// All saved rows for one user.
pub async fn rows_for(db: &Db, email: &str) -> Result<Vec<ListRow>, ApiError> {
    let rows = sqlx::query_as::<_, ListRow>(
        "SELECT game_id, purchase_index FROM list WHERE email = $1",
    )
    .bind(email)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

/// Group saved rows by game so the extractor runs once per distinct game,
/// with the saved positions as its filter. Ordered map keeps responses
/// stable across calls.
pub fn group_by_game(rows: &[ListRow]) -> BTreeMap<i64, BTreeSet<usize>> {
    let mut groups: BTreeMap<i64, BTreeSet<usize>> = BTreeMap::new();
    for row in rows {
        // A negative stored index matches no position on the page; dropping
        // the row beats remapping it onto somebody else's option.
        let Ok(index) = usize::try_from(row.purchase_index) else {
            continue;
        };
        groups.entry(row.game_id).or_default().insert(index);
    }
    groups
}

/// Detail-page URL for a saved game.
pub fn detail_page_url(game_id: i64) -> String {
    format!("{}/app/{}", crate::scrape::STOREFRONT_ROOT, game_id)
}
