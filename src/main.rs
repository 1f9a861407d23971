use clap::{Parser, Subcommand};
use domain::{error::Error as DomainError, social_login};
use dotenvy::dotenv;
use log::{error, info};
use migration::{DbErr, Migrator, MigratorTrait};
use service::{config::Config, logging::Logger, AppState};
use social_auth::network::CallbackParams;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply all pending database migrations
    Migrate,
    /// Start signing in with a provider and print the URL to send the user to
    Initiate { provider: String },
    /// Finish signing in with the parameters the provider called back with
    Callback {
        provider: String,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        code: Option<String>,
        /// Error code reported by the provider instead of a code
        #[arg(long)]
        error: Option<String>,
        #[arg(long)]
        error_description: Option<String>,
    },
    /// Delete expired pending sign-ins
    PurgeStates,
}

#[tokio::main]
async fn main() {
    // Load .env file first
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = Logger::init_logger(&cli.config) {
        eprintln!("Failed to start logger: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting up social_auth_rs [{}] in {} mode",
        cli.config.database_url(),
        cli.config.runtime_env()
    );

    let db = match service::init_database(&cli.config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(cli.config, &db);

    let result = match cli.command {
        Command::Migrate => match migrate(&app_state).await {
            Ok(()) => {
                info!("Database migrations applied");
                Ok(())
            }
            Err(e) => {
                error!("Failed to apply migrations: {e}");
                std::process::exit(1);
            }
        },
        Command::Initiate { provider } => initiate(&app_state, &provider).await,
        Command::Callback {
            provider,
            state,
            code,
            error,
            error_description,
        } => {
            let params: CallbackParams = [
                ("state", state),
                ("code", code),
                ("error", error),
                ("error_description", error_description),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name.to_string(), value)))
            .collect();
            callback(&app_state, &provider, &params).await
        }
        Command::PurgeStates => purge_states(&app_state).await,
    };

    if let Err(e) = result {
        match e.detail() {
            Some(detail) => error!("{e}: {detail}"),
            None => error!("{e}"),
        }
        std::process::exit(1);
    }
}

async fn migrate(app_state: &AppState) -> Result<(), DbErr> {
    let db = app_state.db_conn_ref();
    service::ensure_schema(db).await?;
    Migrator::up(db, None).await
}

fn auth_flow(app_state: &AppState) -> Result<social_login::DbAuthFlow, DomainError> {
    social_login::auth_flow(
        &app_state.config,
        Arc::clone(&app_state.database_connection),
    )
}

async fn initiate(app_state: &AppState, provider: &str) -> Result<(), DomainError> {
    let flow = auth_flow(app_state)?;
    let target = social_login::initiate(&flow, provider).await?;

    println!("{}", target.url);
    Ok(())
}

async fn callback(
    app_state: &AppState,
    provider: &str,
    params: &CallbackParams,
) -> Result<(), DomainError> {
    let flow = auth_flow(app_state)?;
    let outcome = social_login::callback(&flow, provider, params).await?;

    println!("Signed in with {provider}; session state {}", outcome.state);
    Ok(())
}

async fn purge_states(app_state: &AppState) -> Result<(), DomainError> {
    let flow = auth_flow(app_state)?;
    let purged = flow.state_store().purge_expired().await?;

    info!("Purged {purged} expired pending sign-ins");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_callback_parameters() {
        let cli = Cli::parse_from([
            "social_auth_rs",
            "callback",
            "github",
            "--state",
            "aFakeState",
            "--code",
            "abc",
        ]);

        match cli.command {
            Command::Callback {
                provider,
                state,
                code,
                error,
                ..
            } => {
                assert_eq!(provider, "github");
                assert_eq!(state.as_deref(), Some("aFakeState"));
                assert_eq!(code.as_deref(), Some("abc"));
                assert_eq!(error, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_config_flags_before_the_command() {
        let cli = Cli::parse_from([
            "social_auth_rs",
            "--state-ttl-minutes",
            "10",
            "initiate",
            "github",
        ]);

        assert_eq!(cli.config.state_ttl_minutes, 10);
        assert!(matches!(cli.command, Command::Initiate { provider } if provider == "github"));
    }
}
