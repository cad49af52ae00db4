//! CLI administration tool for shortkey.
//!
//! Manages accounts, issues tokens, and inspects records and statistics
//! directly against the backing store, without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create an account
//! cargo run --bin admin -- user create --username alice
//!
//! # Issue a bearer token for an existing account
//! cargo run --bin admin -- token issue alice
//!
//! # List an account's short URLs
//! cargo run --bin admin -- urls list alice
//!
//! # Show statistics for one key
//! cargo run --bin admin -- stats aB3x_9Qz
//!
//! # Check store connection
//! cargo run --bin admin -- store check
//! ```
//!
//! # Environment Variables
//!
//! Reads the same variables as the server (see `shortkey::config`);
//! `JWT_SECRET` is required.

use shortkey::AppState;
use shortkey::config::{self, Config};
use shortkey::domain::repositories::AccountRepository;
use shortkey::infrastructure::persistence::KvAccountRepository;
use shortkey::server::connect_store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};

/// CLI tool for managing shortkey.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Inspect an account's short URLs
    Urls {
        #[command(subcommand)]
        action: UrlsAction,
    },

    /// Show click statistics for a short key
    Stats {
        /// Short key to inspect
        short_key: String,
    },

    /// Store operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account (prompts for missing values)
    Create {
        #[arg(short, long)]
        username: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for an existing account
    Issue {
        username: String,
    },
}

#[derive(Subcommand)]
enum UrlsAction {
    /// List the records owned by an account
    List {
        username: String,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Check store connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let store = connect_store(&config)
        .await
        .context("Failed to connect to store")?;
    let (state, _visit_rx) = AppState::build(store, &config);

    match cli.command {
        Commands::User {
            action: UserAction::Create { username, yes },
        } => create_user(&state, username, yes).await?,
        Commands::Token {
            action: TokenAction::Issue { username },
        } => issue_token(&state, &config, &username).await?,
        Commands::Urls {
            action: UrlsAction::List { username },
        } => list_urls(&state, &username).await?,
        Commands::Stats { short_key } => show_stats(&state, &short_key).await?,
        Commands::Store {
            action: StoreAction::Check,
        } => check_store(&state, &config).await?,
    }

    Ok(())
}

/// Creates an account with interactive prompts.
///
/// The password is always read from the terminal, never from arguments, so
/// it does not end up in shell history.
async fn create_user(state: &AppState, username: Option<String>, skip_confirm: bool) -> Result<()> {
    println!("{}", "👤 Create Account".bright_blue().bold());
    println!();

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Create account '{username}'?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let account = state
        .account_service
        .register(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create account: {e}"))?;

    println!();
    println!("{}", "✅ Account created".green().bold());
    println!("  Username: {}", account.username.cyan());
    println!(
        "  Created:  {}",
        account
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!();

    Ok(())
}

/// Issues a bearer token for an existing account without a password check.
async fn issue_token(state: &AppState, config: &Config, username: &str) -> Result<()> {
    println!("{}", "🔑 Issue Token".bright_blue().bold());
    println!();

    let accounts = KvAccountRepository::new(state.store.clone());
    accounts
        .find(username)
        .await
        .map_err(|e| anyhow::anyhow!("Store error: {e}"))?
        .context("Account not found")?;

    let token = state
        .identity
        .issue(username)
        .map_err(|e| anyhow::anyhow!("Failed to issue token: {e}"))?;

    println!("  Account: {}", username.cyan());
    println!(
        "  Expires: in {} hours",
        config.token_ttl_hours.to_string().bright_white()
    );
    println!("  Token:   {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -X POST -H \"Authorization: Bearer {}\" \"{}/shorten?url=https://example.com\"",
        token.bright_yellow(),
        state.base_url
    );
    println!();

    Ok(())
}

/// Lists an account's live records with click counts.
async fn list_urls(state: &AppState, username: &str) -> Result<()> {
    println!(
        "{}",
        format!("📋 Short URLs of {username}").bright_blue().bold()
    );
    println!();

    let records = state
        .link_service
        .list_owned(username)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list records: {e}"))?;

    if records.is_empty() {
        println!("{}", "  No short URLs found".yellow());
        return Ok(());
    }

    println!(
        "  {:<17} {:<8} {:<17} {}",
        "Key".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Original URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for record in &records {
        let clicks = state
            .analytics
            .stats(&record.short_key)
            .await
            .map(|s| s.count.to_string())
            .unwrap_or_else(|_| "?".to_string());
        let expires = record
            .expires_at
            .map(|e| e.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<17} {:<8} {:<17} {}",
            record.short_key.cyan(),
            clicks.bright_green(),
            expires.bright_black(),
            record.original_url
        );
    }

    println!();
    println!(
        "  Total: {}",
        records.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Displays a record and its visit statistics.
async fn show_stats(state: &AppState, short_key: &str) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let record = state
        .link_service
        .get_record(short_key)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let stats = state
        .analytics
        .stats(short_key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read stats: {e}"))?;

    println!("  Key:             {}", record.short_key.cyan());
    println!("  Original URL:    {}", record.original_url);
    println!(
        "  Creator:         {}",
        record.creator.as_deref().unwrap_or("anonymous")
    );
    println!(
        "  Clicks:          {}",
        stats.count.to_string().bright_green().bold()
    );
    println!(
        "  Unique visitors: {}",
        stats.unique_visitors().to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

async fn check_store(state: &AppState, config: &Config) -> Result<()> {
    println!(
        "{}",
        format!("🔍 Checking {} store...", config.store_backend).bright_blue()
    );

    state
        .store
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("Store check failed: {e}"))?;

    println!("{}", "✅ Store connection OK".green().bold());

    Ok(())
}
