//! Command line definitions and dispatch.

use clap::{Args, Parser, Subcommand};

use cinebook_auth::JwtEncoder;
use cinebook_core::config::AppConfig;
use cinebook_core::error::AppError;
use cinebook_core::types::id::UserId;
use cinebook_database::DatabasePool;
use cinebook_entity::user::UserRole;

use crate::server;

/// Cinebook seat reservation server
#[derive(Debug, Parser)]
#[command(name = "cinebook-server", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to apply on top of `config/default.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Subcommand to execute; defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server and background worker
    Serve(ServeArgs),
    /// Apply pending database migrations and exit
    Migrate,
    /// Mint a bearer token for local testing
    Token(TokenArgs),
}

/// Arguments for the serve command
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Do not start the refund worker
    #[arg(long)]
    pub no_worker: bool,
}

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// User id; a new one is generated when omitted
    #[arg(long)]
    pub user: Option<String>,

    /// Role claim: `user` or `admin`
    #[arg(long, default_value = "user")]
    pub role: String,
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(&self, mut config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            None => server::run(config).await,
            Some(Commands::Serve(args)) => {
                if let Some(port) = args.port {
                    config.server.port = port;
                }
                if let Some(ref host) = args.host {
                    config.server.host = host.clone();
                }
                if args.no_worker {
                    config.worker.enabled = false;
                }
                server::run(config).await
            }
            Some(Commands::Migrate) => migrate(config).await,
            Some(Commands::Token(args)) => token(&config, args),
        }
    }
}

async fn migrate(mut config: AppConfig) -> Result<(), AppError> {
    if config.database.provider != "postgres" {
        return Err(AppError::configuration(format!(
            "Migrations need the postgres provider, not '{}'",
            config.database.provider
        )));
    }
    config.database.run_migrations = false;

    let db = DatabasePool::connect(&config.database).await?;
    db.migrate().await?;
    db.close().await;
    tracing::info!("All migrations applied");
    Ok(())
}

fn token(config: &AppConfig, args: &TokenArgs) -> Result<(), AppError> {
    let user_id = match &args.user {
        Some(raw) => raw
            .parse::<UserId>()
            .map_err(|_| AppError::validation(format!("Invalid user id: {raw}")))?,
        None => UserId::new(),
    };
    let role: UserRole = args.role.parse()?;

    let token = JwtEncoder::new(&config.auth).encode(user_id, role)?;
    println!("user_id: {user_id}");
    println!("role:    {role}");
    println!("token:   {token}");
    Ok(())
}
