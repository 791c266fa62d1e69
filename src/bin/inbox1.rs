use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use inbox1::config::load_config;
use inbox1::domain::account::AccountSecret;
use inbox1::services::Services;
use inbox1::terminal::run_tui;

#[derive(Parser)]
#[command(name = "inbox1")]
#[command(about = "Terminal mail client (inbox, accounts, settings)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the TUI (default)
    Tui {
        /// Open this account instead of the configured default
        #[arg(long)]
        account: Option<String>,
    },

    /// Fetch unread inbox summaries once and print them
    Fetch {
        #[arg(long)]
        account: Option<String>,

        /// Print JSON instead of one line per message
        #[arg(long)]
        json: bool,
    },

    /// List stored accounts
    Accounts,

    /// Store the password for an account (read from stdin)
    SetPassword {
        #[arg(long)]
        account: String,
    },

    /// Show or clear the local message cache
    Cache {
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let services = Services::from_config(&cfg)?;
    services.init()?;

    let result = match cli.cmd.unwrap_or(Command::Tui { account: None }) {
        Command::Tui { account } => {
            let preferred = account.or_else(|| cfg.default_account.clone());
            run_tui(&services, preferred.as_deref())
        }
        Command::Fetch { account, json } => {
            let preferred = account.or_else(|| cfg.default_account.clone());
            fetch_once(&services, preferred.as_deref(), json)
        }
        Command::Accounts => list_accounts(&services),
        Command::SetPassword { account } => set_password(&services, &account),
        Command::Cache { clear } => show_cache(&services, clear),
    };

    if let Err(e) = services.teardown() {
        log::warn!("teardown failed: {e:#}");
    }
    result
}

fn fetch_once(services: &Services, preferred: Option<&str>, json: bool) -> Result<()> {
    let account = services
        .pick_account(preferred)?
        .ok_or_else(|| anyhow!("no account configured; add one in the TUI Settings tab"))?;
    let (account, secret) = services
        .load_credentials(&account.id)?
        .ok_or_else(|| anyhow!("no password stored for {}; run set-password", account.id))?;

    let emails = services.sync_inbox(&account, &secret)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&emails)?);
        return Ok(());
    }
    if emails.is_empty() {
        println!("No messages yet.");
    }
    for e in &emails {
        let marker = if e.unread == Some(true) { "*" } else { " " };
        println!(
            "{marker} {:<12} {:<30} {}",
            e.received_at, e.from, e.subject
        );
    }
    Ok(())
}

fn list_accounts(services: &Services) -> Result<()> {
    let accounts = services.accounts.list_accounts()?;
    if accounts.is_empty() {
        println!("Add your first account to start syncing mail.");
    }
    for a in accounts {
        println!(
            "{}  {}  {}://{}:{} ({})",
            a.id, a.email, a.protocol, a.host, a.port, a.security
        );
    }
    Ok(())
}

fn set_password(services: &Services, id: &str) -> Result<()> {
    let account = services
        .accounts
        .get_account(id)?
        .ok_or_else(|| anyhow!("unknown account {id}"))?;

    eprintln!("Paste password (end with Ctrl-D):");
    let mut password = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(anyhow!("password is empty"));
    }

    services
        .accounts
        .save_account(&account, &AccountSecret::new(password))?;
    println!("Saved password for {}", account.id);
    Ok(())
}

fn show_cache(services: &Services, clear: bool) -> Result<()> {
    if clear {
        services.cache.clear_cache()?;
        println!("Cache cleared");
        return Ok(());
    }
    for e in services.cache.list_cached_emails()? {
        println!(
            "{:<20} {:<12} {:<30} {}",
            e.account_id, e.summary.received_at, e.summary.from, e.summary.subject
        );
    }
    Ok(())
}
