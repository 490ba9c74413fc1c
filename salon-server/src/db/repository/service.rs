//! Service Repository (catalog)

use super::{RepoError, RepoResult, parse_decimal};
use rust_decimal::Decimal;
use shared::models::Service;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    tenant_id: i64,
    name: String,
    price: String,
    duration_minutes: i64,
    is_active: bool,
}

impl TryFrom<ServiceRow> for Service {
    type Error = RepoError;

    fn try_from(row: ServiceRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            price: parse_decimal(&row.price, "services.price")?,
            duration_minutes: row.duration_minutes,
            is_active: row.is_active,
        })
    }
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> RepoResult<Option<Service>> {
    let row = sqlx::query_as::<_, ServiceRow>(
        "SELECT id, tenant_id, name, price, duration_minutes, is_active FROM services WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Service::try_from).transpose()
}

/// Load the tenant's services among `ids` (active or not), ordered by id.
///
/// Ids that do not belong to the tenant are simply absent from the result.
pub async fn find_many(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    ids: &[i64],
) -> RepoResult<Vec<Service>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, tenant_id, name, price, duration_minutes, is_active FROM services WHERE tenant_id = ",
    );
    qb.push_bind(tenant_id);
    qb.push(" AND id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let rows = qb.build_query_as::<ServiceRow>().fetch_all(conn).await?;
    rows.into_iter().map(Service::try_from).collect()
}

pub async fn create(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    name: &str,
    price: Decimal,
    duration_minutes: i64,
) -> RepoResult<Service> {
    if price < Decimal::ZERO {
        return Err(RepoError::Validation("Service price must not be negative".into()));
    }
    if duration_minutes <= 0 {
        return Err(RepoError::Validation("Service duration must be positive".into()));
    }
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO services (id, tenant_id, name, price, duration_minutes, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(price.to_string())
    .bind(duration_minutes)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create service".into()))
}

/// Change the catalog price; booked line items keep their snapshot
pub async fn update_price(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    price: Decimal,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE services SET price = ? WHERE tenant_id = ? AND id = ?")
        .bind(price.to_string())
        .bind(tenant_id)
        .bind(id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Service {id} not found")));
    }
    Ok(())
}

pub async fn set_active(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    active: bool,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE services SET is_active = ? WHERE tenant_id = ? AND id = ?")
        .bind(active)
        .bind(tenant_id)
        .bind(id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Service {id} not found")));
    }
    Ok(())
}
