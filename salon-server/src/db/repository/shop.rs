//! Shop Repository

use super::{RepoError, RepoResult};
use shared::models::Shop;
use sqlx::SqliteConnection;

#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    id: i64,
    name: String,
    is_active: bool,
    created_at: i64,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Shop>> {
    let row = sqlx::query_as::<_, ShopRow>(
        "SELECT id, name, is_active, created_at FROM shops WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Shop::from))
}

pub async fn create(conn: &mut SqliteConnection, name: &str) -> RepoResult<Shop> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query("INSERT INTO shops (id, name, is_active, created_at) VALUES (?1, ?2, 1, ?3)")
        .bind(id)
        .bind(name)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create shop".into()))
}

pub async fn set_active(conn: &mut SqliteConnection, id: i64, active: bool) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE shops SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Shop {id} not found")));
    }
    Ok(())
}
