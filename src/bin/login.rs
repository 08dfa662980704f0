//! One-shot login check
//!
//! Brings up a browser, runs the full login orchestration once and prints
//! a JSON verdict. Useful for warming the cookie jar for an account before
//! enabling the scheduler, and for completing a verification challenge
//! interactively with `--headed`.
//!
//! # Usage
//!
//! ```bash
//! fbauto-login --email recruiting@example.com --password '...' --headed
//! ```

use clap::Parser;
use fbauto::browser::ChromiumSession;
use fbauto::config::ConfigLoader;
use fbauto::session::LoginOrchestrator;
use fbauto::types::LoginVerdict;
use std::path::PathBuf;

/// One-shot login check that warms the cookie jar
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Login email (overrides configuration)
    #[arg(long)]
    email: Option<String>,

    /// Login password (overrides configuration)
    #[arg(long)]
    password: Option<String>,

    /// Account identifier keying the cookie jar (defaults to the email)
    #[arg(long)]
    account_id: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show the browser window (needed for manual challenge completion)
    #[arg(long)]
    headed: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let loader = ConfigLoader::new();
    let config_path = cli.config.or_else(ConfigLoader::default_config_path);
    let mut settings = loader.load(config_path.as_deref())?;

    if let Some(email) = cli.email {
        settings.account.email = email;
    }
    if let Some(password) = cli.password {
        settings.account.password = password;
    }
    if let Some(account_id) = cli.account_id {
        settings.account.account_id = account_id;
    }
    if cli.headed {
        settings.browser.headless = false;
    }

    if settings.account.email.is_empty() || settings.account.password.is_empty() {
        anyhow::bail!("No credentials: pass --email/--password or configure [account]");
    }

    let credentials = settings.credentials();
    let browser = ChromiumSession::new(settings.browser.clone());
    browser.start().await?;

    let orchestrator = LoginOrchestrator::new(settings);
    let logged_in = match orchestrator.ensure_logged_in(&browser, &credentials).await {
        Ok(logged_in) => logged_in,
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            false
        }
    };

    browser.stop().await?;

    let verdict = LoginVerdict::new(&credentials.account_id, logged_in);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    if !logged_in {
        std::process::exit(1);
    }
    Ok(())
}
