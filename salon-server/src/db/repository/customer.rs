//! Customer Repository

use super::{RepoError, RepoResult};
use shared::models::{Customer, NewCustomer};
use sqlx::SqliteConnection;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    tenant_id: i64,
    name: String,
    phone: Option<String>,
    notes: Option<String>,
    last_visit_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            phone: row.phone,
            notes: row.notes,
            last_visit_at: row.last_visit_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> RepoResult<Option<Customer>> {
    let row = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, tenant_id, name, phone, notes, last_visit_at, created_at, updated_at FROM customers WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Customer::from))
}

pub async fn create(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    data: &NewCustomer,
) -> RepoResult<Customer> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO customers (id, tenant_id, name, phone, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(&data.notes)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customer".into()))
}

/// Stamp the last visit; a missing customer is not an error
pub async fn touch_last_visit(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    at_ms: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE customers SET last_visit_at = ?1, updated_at = ?1 WHERE tenant_id = ?2 AND id = ?3",
    )
    .bind(at_ms)
    .bind(tenant_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
