//! Shop Model (tenant)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: i64,
}
