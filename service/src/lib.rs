use config::Config;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// PostgreSQL schema holding every table of this workspace.
pub const DB_SCHEMA: &str = "social_auth";

pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Database pool config: max_connections={}, min_connections={}, \
         connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let mut opt = ConnectOptions::new::<&str>(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Info)
        .set_schema_search_path(DB_SCHEMA);

    let db = Database::connect(opt).await?;

    Ok(db)
}

/// Creates `DB_SCHEMA` when it does not exist yet.
///
/// Every pooled connection searches only `DB_SCHEMA`, so the migrator cannot create
/// its bookkeeping table on a fresh database until this has run.
pub async fn ensure_schema(db: &impl ConnectionTrait) -> Result<(), DbErr> {
    db.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {DB_SCHEMA}"))
        .await?;
    info!("Database schema {DB_SCHEMA} is in place");
    Ok(())
}

// Service-level state containing only infrastructure concerns
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, db: &Arc<DatabaseConnection>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config: app_config,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}
