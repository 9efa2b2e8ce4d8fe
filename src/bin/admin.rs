//! CLI administration tool for branded-links.
//!
//! Provides commands for managing accounts and API tokens, viewing
//! statistics, and performing database operations without requiring HTTP
//! API access.
//!
//! # Usage
//!
//! ```bash
//! # Create an account
//! cargo run --bin admin -- account create --email ops@example.com --role admin
//!
//! # Create a new API token for it
//! cargo run --bin admin -- token create --account ops@example.com
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token
//! cargo run --bin admin -- token revoke "Production API"
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET` (required for `token create`): must match the server's
//!
//! # Features
//!
//! - **Account Management**: Create and list accounts
//! - **Token Management**: Create, list, and revoke API tokens
//! - **Statistics**: View link, visit and account counts
//! - **Database Tools**: Connection checks and info queries
//! - **Interactive Prompts**: User-friendly CLI with confirmation dialogs
//! - **Colored Output**: Terminal-friendly formatting using `colored` crate

use branded_links::application::services::AuthService;
use branded_links::domain::entities::{Admin, AdminFilter, NewAdmin, Role};
use branded_links::domain::repositories::{AdminRepository, LinkRepository, TokenRepository};
use branded_links::infrastructure::persistence::{
    PgAdminRepository, PgLinkRepository, PgTokenRepository,
};
use branded_links::utils::validation::email_error;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Select};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Storage calls from the CLI are interactive; allow them more time.
const CLI_STORAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI tool for managing branded-links.
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
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Account management subcommands.
#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        /// One of: user, admin, super_admin
        #[arg(short, long)]
        role: Option<String>,
    },

    /// List all accounts
    List,
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Email of the account that will own the token
        #[arg(short, long)]
        account: Option<String>,

        /// Token name (e.g., "Production API", "CI")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (optional, auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List {
        /// Only tokens owned by this account
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Account { action } => handle_account_action(action, &pool).await?,
        Commands::Token { action } => handle_token_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches account management commands.
async fn handle_account_action(action: AccountAction, pool: &PgPool) -> Result<()> {
    let repo = PgAdminRepository::new(Arc::new(pool.clone()));

    match action {
        AccountAction::Create { email, name, role } => {
            create_account(&repo, email, name, role).await?;
        }
        AccountAction::List => {
            list_accounts(&repo).await?;
        }
    }

    Ok(())
}

async fn create_account(
    repo: &PgAdminRepository,
    email: Option<String>,
    name: Option<String>,
    role: Option<String>,
) -> Result<()> {
    println!("{}", "👤 Create Account".bright_blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let email = email.trim().to_lowercase();
    if let Some(problem) = email_error(&email) {
        anyhow::bail!("{}", problem);
    }

    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Name").interact_text()?,
    };

    let role = match role {
        Some(r) => r.parse::<Role>().map_err(|e| anyhow::anyhow!("{}", e))?,
        None => {
            let roles = [Role::User, Role::Admin, Role::SuperAdmin];
            let labels: Vec<&str> = roles.iter().map(Role::as_str).collect();
            let picked = Select::new()
                .with_prompt("Role")
                .items(&labels)
                .default(0)
                .interact()?;
            roles[picked]
        }
    };

    let admin = repo
        .create(NewAdmin {
            email,
            name: name.trim().to_string(),
            role,
        })
        .await
        .context("Failed to create account")?;

    println!();
    println!("{}", "✅ Account created successfully!".green().bold());
    println!("  ID:    {}", admin.id.to_string().bright_black());
    println!("  Email: {}", admin.email.cyan());
    println!("  Role:  {}", admin.role.as_str().bright_white());
    println!();
    println!(
        "  Issue a token with: {} admin -- token create --account {}",
        "cargo run --bin".bright_cyan(),
        admin.email
    );
    println!();

    Ok(())
}

async fn list_accounts(repo: &PgAdminRepository) -> Result<()> {
    println!("{}", "📋 Accounts".bright_blue().bold());
    println!();

    let filter = AdminFilter {
        limit: 100,
        ..AdminFilter::default()
    };
    let (accounts, total) = tokio::try_join!(repo.list(&filter), repo.count(&filter))
        .context("Failed to list accounts")?;

    if accounts.is_empty() {
        println!("{}", "  No accounts found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<35} {:<25} {:<12}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Name".bright_white().bold(),
        "Role".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for admin in &accounts {
        let role = match admin.role {
            Role::SuperAdmin => admin.role.as_str().magenta(),
            Role::Admin => admin.role.as_str().green(),
            Role::User => admin.role.as_str().normal(),
        };

        println!(
            "  {:<5} {:<35} {:<25} {}",
            admin.id.to_string().bright_black(),
            admin.email.cyan(),
            admin.name,
            role
        );
    }

    println!();
    println!("  Total: {}", total.to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn find_account(admins: &PgAdminRepository, email: &str) -> Result<Admin> {
    admins
        .find_by_email(email.trim())
        .await
        .context("Failed to look up account")?
        .with_context(|| format!("No account with email {email}"))
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let tokens = Arc::new(PgTokenRepository::new(pool.clone()));
    let admins = Arc::new(PgAdminRepository::new(pool));

    match action {
        TokenAction::Create {
            account,
            name,
            token,
            yes,
        } => {
            create_token(tokens, admins, account, name, token, yes).await?;
        }
        TokenAction::List { account } => {
            list_tokens(tokens, admins, account).await?;
        }
        TokenAction::Revoke { name_or_id } => {
            revoke_token(tokens, name_or_id).await?;
        }
    }

    Ok(())
}

/// Creates a new API token with interactive prompts.
///
/// # Flow
///
/// 1. Resolve the owning account
/// 2. Prompt for token name (or use provided)
/// 3. Generate random token or use provided value
/// 4. Confirm creation (unless `--yes` flag)
/// 5. Store the HMAC-SHA256 hash
/// 6. Display the raw token once with usage instructions
async fn create_token(
    tokens: Arc<PgTokenRepository>,
    admins: Arc<PgAdminRepository>,
    account: Option<String>,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let signing_secret =
        std::env::var("TOKEN_SIGNING_SECRET").context("TOKEN_SIGNING_SECRET must be set")?;

    let account = match account {
        Some(a) => a,
        None => Input::new().with_prompt("Account email").interact_text()?,
    };
    let owner = find_account(&admins, &account).await?;

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Production API")
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "⚠️  Using provided token value".yellow());
            t
        }
        None => {
            let generated = AuthService::generate_token()
                .context("Failed to generate token")?;
            println!("{}", "✨ Generated new token".green());
            generated
        }
    };

    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Owner: {} ({})", owner.email.cyan(), owner.role.as_str());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let auth = AuthService::new(tokens, admins, signing_secret, CLI_STORAGE_TIMEOUT);
    auth.register_token(owner.id, &token_name, &token_value)
        .await
        .context("Failed to create token")?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token_value.bright_yellow()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/me",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists API tokens with status indicators.
///
/// # Output Format
///
/// ```text
/// 📋 API Tokens
///
///   ID  Owner  Name                           Created              Status
///   ───────────────────────────────────────────────────────────────────────
///   1   1      Production API                 2026-01-15 10:30     ACTIVE
///   2   1      Mobile App                     2026-01-16 14:20     REVOKED
/// ```
async fn list_tokens(
    tokens: Arc<PgTokenRepository>,
    admins: Arc<PgAdminRepository>,
    account: Option<String>,
) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let owner_id = match account {
        Some(email) => Some(find_account(&admins, &email).await?.id),
        None => None,
    };

    let tokens = tokens
        .list_tokens(owner_id)
        .await
        .context("Failed to list tokens")?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!();
        println!(
            "  Create one with: {} admin -- token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<6} {:<30} {:<20} {:<10}",
        "ID".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for token in &tokens {
        let status = if token.is_revoked() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<4} {:<6} {:<30} {:<20} {}",
            token.id.to_string().bright_black(),
            token.admin_id.to_string().bright_black(),
            token.name.cyan(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        tokens.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a token by name or ID with confirmation prompt.
///
/// # Lookup
///
/// - If input is numeric, lookup by ID
/// - Otherwise, lookup by name (exact match, most recent)
async fn revoke_token(repo: Arc<PgTokenRepository>, name_or_id: String) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo
            .find_by_id(id)
            .await
            .context("Database error")?,
        Err(_) => repo
            .find_by_name(&name_or_id)
            .await
            .context("Database error")?,
    };

    let token = token.context("Token not found")?;

    if token.is_revoked() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .context("Failed to revoke token")?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Link counts, active and inactive
/// - Total recorded visits
/// - Number of accounts and active API tokens
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links = PgLinkRepository::new(Arc::new(pool.clone()));
    let summary = links
        .summary()
        .await
        .context("Failed to load link summary")?;

    let accounts_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;

    let tokens_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!(
        "  Links:         {} ({} active, {} inactive)",
        summary.total.to_string().bright_green().bold(),
        summary.active,
        summary.inactive
    );
    println!(
        "  Visits:        {}",
        summary.total_visits.to_string().bright_green().bold()
    );
    println!(
        "  Accounts:      {}",
        accounts_count.to_string().bright_green().bold()
    );
    println!(
        "  Active tokens: {}",
        tokens_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations applied: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
