use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::core::error::{Result, ServerError};
use crate::db::DbService;
use crate::scheduling::SchedulingService;

/// Shared handles for all handlers; cheap to clone
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub scheduling: SchedulingService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(config: Config, db: DbService) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let scheduling = SchedulingService::new(db.pool.clone());
        Self {
            config,
            db,
            scheduling,
            jwt_service,
        }
    }

    /// Open the configured database (running migrations) and build the state
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = DbService::new(&config.database_path)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;
        tracing::info!(path = %config.database_path, "Database ready");
        Ok(Self::new(config.clone(), db))
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn stripe_webhook_secret(&self) -> &str {
        &self.config.stripe_webhook_secret
    }
}
