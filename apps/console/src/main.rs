//! GrantDesk permission console.

#![forbid(unsafe_code)]

mod console_commands;
mod console_config;
mod terminal_renderer;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use grantdesk_application::{
    PermissionConsoleService, PermissionTransport, ViewDirective, ViewRenderer,
};
use grantdesk_core::AppResult;
use grantdesk_domain::{FormAction, UserKey};
use grantdesk_infrastructure::{HttpPermissionTransport, InMemoryPermissionTransport, SessionLogin};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use console_commands::FormArgs;
use console_config::ConsoleConfig;
use terminal_renderer::TerminalRenderer;

#[derive(Parser)]
#[command(name = "grantdesk")]
#[command(about = "Grant and revoke database permissions through the permission service")]
#[command(version)]
struct Cli {
    /// Print view directives as JSON lines instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Use a seeded in-memory service instead of the remote one.
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show permission types and required fields for every scope
    Scopes,
    /// List accounts with their permission counts
    Users,
    /// Show the permissions of one account
    Show {
        /// Account name
        username: String,
        /// Host pattern
        host: String,
        /// Treat username and host as percent-encoded path segments
        #[arg(long)]
        encoded: bool,
    },
    /// Check whether an account exists
    Exists {
        /// Account name
        username: String,
        /// Host pattern
        host: String,
    },
    /// Grant permissions to an account
    Grant(FormArgs),
    /// Revoke permissions from an account
    Revoke(FormArgs),
    /// Apply a JSON file of grant or revoke requests in one call
    Batch {
        /// grant or revoke
        action: FormAction,
        /// JSON array of entries
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let renderer = Arc::new(TerminalRenderer::new(cli.json));

    // Errors are shown through the renderer before they get here.
    match run(cli, renderer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            debug!(error = %error, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, renderer: Arc<TerminalRenderer>) -> AppResult<()> {
    if matches!(cli.command, Commands::Scopes) {
        console_commands::print_scopes();
        return Ok(());
    }

    let transport = build_transport(cli.demo).await.map_err(|error| {
        renderer.apply(ViewDirective::from_error(&error));
        error
    })?;
    let service = PermissionConsoleService::new(transport, renderer);

    match cli.command {
        Commands::Scopes => {}
        Commands::Users => {
            service.load_users().await?;
        }
        Commands::Show {
            username,
            host,
            encoded,
        } => {
            let key = if encoded {
                UserKey::from_encoded(&username, &host)
            } else {
                UserKey::from_raw(username, host)
            };
            let key = console_commands::reported(&service, key)?;
            service.view_user_details(&key).await?;
        }
        Commands::Exists { username, host } => {
            let key = console_commands::reported(&service, UserKey::from_raw(username, host))?;
            service.user_exists(&key).await?;
        }
        Commands::Grant(args) => {
            console_commands::run_form(&service, FormAction::Grant, args).await?;
        }
        Commands::Revoke(args) => {
            console_commands::run_form(&service, FormAction::Revoke, args).await?;
        }
        Commands::Batch { action, file } => {
            console_commands::run_batch(&service, action, &file).await?;
        }
    }

    Ok(())
}

async fn build_transport(demo: bool) -> AppResult<Arc<dyn PermissionTransport>> {
    if demo {
        info!("using in-memory permission service");
        let transport = InMemoryPermissionTransport::new();
        for (username, host) in [("alice", "%"), ("bob", "localhost"), ("etl", "10.0.0.%")] {
            transport.create_account(username, host).await;
        }
        return Ok(Arc::new(transport));
    }

    let config = ConsoleConfig::load()?;
    let mut transport = HttpPermissionTransport::new(&config.api_base_url, config.http_timeout)?;
    if let Some(login) = config.login {
        transport = transport.with_login(SessionLogin {
            url: login.url,
            username: login.username,
            password: login.password,
        });
    }

    info!(
        api_base_url = %config.api_base_url,
        timeout_secs = config.http_timeout.as_secs(),
        "permission console started"
    );
    Ok(Arc::new(transport))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
