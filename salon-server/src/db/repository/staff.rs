//! Staff Repository
//!
//! Read side of the staff directory used by scheduling, plus the writes
//! needed to seed it.

use super::{RepoError, RepoResult, parse_decimal};
use rust_decimal::Decimal;
use shared::models::{CommissionTerms, CommissionType, Role, StaffMember};
use sqlx::SqliteConnection;

const STAFF_SELECT: &str = "SELECT id, tenant_id, name, role, commission_type, commission_value, is_active FROM staff";

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: i64,
    tenant_id: i64,
    name: String,
    role: String,
    commission_type: Option<String>,
    commission_value: String,
    is_active: bool,
}

impl TryFrom<StaffRow> for StaffMember {
    type Error = RepoError;

    fn try_from(row: StaffRow) -> RepoResult<Self> {
        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            role: row.role.parse::<Role>()?,
            commission_type: row
                .commission_type
                .as_deref()
                .map(str::parse::<CommissionType>)
                .transpose()?,
            commission_value: parse_decimal(&row.commission_value, "staff.commission_value")?,
            is_active: row.is_active,
        })
    }
}

/// Staff seed payload
#[derive(Debug, Clone)]
pub struct StaffCreate {
    pub name: String,
    pub role: Role,
    pub commission_type: Option<CommissionType>,
    pub commission_value: Decimal,
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> RepoResult<Option<StaffMember>> {
    let sql = format!("{STAFF_SELECT} WHERE tenant_id = ? AND id = ?");
    let row = sqlx::query_as::<_, StaffRow>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(StaffMember::try_from).transpose()
}

/// Commission terms of a staff member, `None` when the member is unknown
pub async fn commission_terms(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
) -> RepoResult<Option<CommissionTerms>> {
    Ok(find_by_id(conn, tenant_id, id)
        .await?
        .map(|member| member.commission_terms()))
}

pub async fn create(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    data: StaffCreate,
) -> RepoResult<StaffMember> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO staff (id, tenant_id, name, role, commission_type, commission_value, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(&data.name)
    .bind(data.role.as_str())
    .bind(data.commission_type.map(|t| t.as_str()))
    .bind(data.commission_value.to_string())
    .bind(now)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create staff member".into()))
}

pub async fn update_commission(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    id: i64,
    terms: CommissionTerms,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE staff SET commission_type = ?1, commission_value = ?2 WHERE tenant_id = ?3 AND id = ?4",
    )
    .bind(terms.commission_type.map(|t| t.as_str()))
    .bind(terms.value.to_string())
    .bind(tenant_id)
    .bind(id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Staff member {id} not found")));
    }
    Ok(())
}
