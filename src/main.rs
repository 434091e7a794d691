use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tracing::{error, info};

use posadmin::{
    api::{AdminBackend, ApiClient, ApiError},
    cli::{format_page, Cli, Commands},
    config::Config,
    console::App,
    models::{EntityKind, ListQuery},
    session::{Credential, Session, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "posadmin=info");
    }
    init_logging(command == Commands::Tui)?;

    let mut config = Config::from_env()?;
    if let Some(ref backend) = cli.backend {
        config = config.with_backend(backend);
    }
    config.validate()?;

    let client = ApiClient::new(config.clone()).context("Failed to build HTTP client")?;
    let mut session = Session::open(TokenStore::new(&config.token_path));

    match command {
        Commands::Tui => run_tui(&config, client, session).await,
        Commands::Login { name, password } => {
            let response = client.login(&name, &password).await?;
            session
                .sign_in(Credential::new(response.token))
                .context("Failed to store credential")?;
            let who = response.data.and_then(|user| user.name).unwrap_or(name);
            println!("Logged in as {}", who);
            Ok(())
        }
        Commands::Logout => {
            let credential = require_credential(&session)?;
            client.logout(&credential).await?;
            session.sign_out().context("Failed to remove credential")?;
            println!("Logged out");
            Ok(())
        }
        Commands::List { entity, page } => {
            let kind = EntityKind::parse(&entity)?;
            let credential = require_credential(&session)?;
            let records = client
                .list(&credential, kind.resource(), ListQuery::new(page, config.per_page))
                .await
                .with_context(|| kind.fetch_error())?;
            for line in format_page(&records, &kind.columns()) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// The console logs to a file only so the terminal is left alone; the
/// one-shot commands also log to stderr.
fn init_logging(tui_mode: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    if tui_mode {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("posadmin.log")
            .context("Failed to open posadmin.log")?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_ansi(false)
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return Ok(());
    }

    let file_appender = tracing_appender::rolling::never(".", "posadmin.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
    Ok(())
}

fn require_credential(session: &Session) -> Result<Credential> {
    session
        .credential()
        .cloned()
        .ok_or_else(|| ApiError::MissingCredential.into())
}

async fn run_tui(config: &Config, client: ApiClient, session: Session) -> Result<()> {
    info!("Starting posadmin console against {}", config.api_backend);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Arc::new(client), session);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result {
        Ok(()) => {
            info!("posadmin console exited");
            Ok(())
        }
        Err(e) => {
            error!("posadmin console failed: {}", e);
            Err(e)
        }
    }
}
