use std::error::Error;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lexi::auth::{AuthAdapter, build_auth};
use lexi::chat::{ChatBackend, HttpChatClient, MockBackend};
use lexi::core::config::{self, CliOverrides, LexiConfig, ResolvedConfig};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger,
};

#[derive(Parser)]
#[command(name = "lexi", about = "Legal assistant for questions about Polish law")]
struct Args {
    /// Base URL of the conversation API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer locally with placeholder replies; no network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP endpoints the client talks to
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
    /// Sign in through the browser without starting the chat
    Login,
    /// Forget the cached sign-in
    Logout,
}

fn init_logging(serving: bool) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let Ok(log_file) = File::create("lexi.log") else {
        return;
    };
    let file_logger = WriteLogger::new(LevelFilter::Debug, log_config.clone(), log_file);
    // The terminal belongs to ratatui unless we are serving
    let _ = if serving {
        CombinedLogger::init(vec![
            TermLogger::new(
                LevelFilter::Info,
                log_config,
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ),
            file_logger,
        ])
    } else {
        CombinedLogger::init(vec![file_logger])
    };
}

fn build_backend(config: &ResolvedConfig, auth: Arc<dyn AuthAdapter>) -> Arc<dyn ChatBackend> {
    if config.offline {
        Arc::new(MockBackend::new(Duration::from_millis(
            config.placeholder_delay_ms,
        )))
    } else {
        Arc::new(HttpChatClient::new(config.api_url.clone(), auth))
    }
}

async fn login(auth: &dyn AuthAdapter) -> Result<(), Box<dyn Error>> {
    let code = auth.start_login().await?;
    println!("Open {} and enter the code {}", code.url(), code.user_code);
    let state = auth.complete_login(&code).await?;
    match state.user {
        Some(profile) => println!("Signed in as {}", profile.display_name()),
        None => println!("Signed in"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(matches!(args.command, Some(Command::Serve { .. })));

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Ignoring config file: {e}");
        log::warn!("Ignoring config file: {}", e);
        LexiConfig::default()
    });
    let bind = match &args.command {
        Some(Command::Serve { bind }) => bind.clone(),
        _ => None,
    };
    let overrides = CliOverrides {
        api_url: args.api_url,
        offline: args.offline,
        bind,
    };
    let config = config::resolve(&file_config, &overrides);

    match args.command {
        Some(Command::Serve { .. }) => {
            log::info!("Lexi server starting on {}", config.bind);
            lexi::server::serve(&config).await?;
        }
        Some(Command::Login) => {
            let auth = build_auth(&config);
            login(auth.as_ref()).await?;
        }
        Some(Command::Logout) => {
            build_auth(&config).logout().await;
            println!("Signed out");
        }
        None => {
            let auth = build_auth(&config);
            let backend = build_backend(&config, Arc::clone(&auth));
            log::info!("Lexi starting up with backend: {}", backend.name());
            lexi::tui::run(backend, auth)?;
        }
    }
    Ok(())
}
