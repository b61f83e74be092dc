//! Trading journal terminal client
//!
//! Authenticates against the journal backend, persists the session
//! credential locally, and renders per-account KPIs, the equity curve,
//! and the trade history.

mod api;
mod auth;
mod dashboard;
mod error;
mod models;
mod session;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{ApiGateway, CsvImportResult, TradeListQuery};
use crate::auth::{LoginForm, RegisterForm, submit_login, submit_register};
use crate::dashboard::Dashboard;
use crate::error::GatewayError;
use crate::models::FetchState;
use crate::session::Session;
use crate::store::CredentialStore;

/// Trading journal CLI.
#[derive(Parser)]
#[command(name = "tradelog")]
#[command(about = "Terminal client for a personal trading journal", long_about = None)]
struct Cli {
    /// Journal API base address
    #[arg(
        long,
        env = "JOURNAL_API_BASE",
        default_value = "http://localhost:8000/api/v1"
    )]
    api_base: String,

    /// Session database URL (holds the persisted credential)
    #[arg(
        long,
        env = "JOURNAL_SESSION_DB",
        default_value = "sqlite:./journal-session.db?mode=rwc"
    )]
    session_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session credential
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create a new user (does not log in)
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Discard the persisted session credential
    Logout,

    /// List brokerage accounts
    Accounts,

    /// Show KPIs and the equity curve for an account
    Dashboard {
        /// Account id (defaults to the first account)
        #[arg(short, long)]
        account: Option<i64>,

        /// Window start, RFC 3339 (defaults to one month ago)
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Window end, RFC 3339 (defaults to now)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// List trade history for the primary account
    Trades {
        /// Filter by instrument symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// Result page
        #[arg(long, default_value = "1")]
        page: u32,

        /// Trades per page
        #[arg(long, default_value = "50")]
        page_size: u32,
    },

    /// Upload a CSV broker statement into an account
    Import {
        /// Account id to import into
        #[arg(short, long)]
        account: i64,

        /// CSV file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Wire up the session: one gateway, one store, one binding.
    let gateway = Arc::new(ApiGateway::new(cli.api_base.clone())?);
    let store = CredentialStore::new(&cli.session_db).await?;
    let session = Arc::new(Session::initialize(store, gateway.clone()).await?);

    match cli.command {
        Commands::Login { email, password } => {
            let form = LoginForm { email, password };
            match submit_login(&session, &form).await {
                Ok(()) => println!("Logged in."),
                Err(e) => println!("{}", e),
            }
        }

        Commands::Register { email, password } => {
            let form = RegisterForm { email, password };
            match submit_register(&gateway, &form).await {
                Ok(()) => println!("Registered. Log in with 'tradelog login'."),
                Err(e) => println!("{}", e),
            }
        }

        Commands::Logout => {
            session.logout().await?;
            println!("Logged out.");
        }

        Commands::Accounts => {
            let Some(dashboard) = open_dashboard(&gateway, &session).await? else {
                return Ok(());
            };

            match dashboard.accounts().await {
                FetchState::Ready(accounts) => {
                    println!(
                        "\n{:<6} {:<16} {:<16} {:<8} {:<12}",
                        "ID", "CODE", "NAME", "CCY", "BROKER"
                    );
                    println!("{}", "-".repeat(62));
                    for account in &accounts {
                        println!(
                            "{:<6} {:<16} {:<16} {:<8} {:<12}",
                            account.id,
                            truncate(&account.code, 14),
                            truncate(account.display_name(), 14),
                            account.currency.as_deref().unwrap_or("-"),
                            account.broker.as_deref().unwrap_or("-"),
                        );
                    }
                }
                FetchState::Failed(reason) => println!("Failed to load accounts: {}", reason),
                _ => println!("No accounts loaded."),
            }
        }

        Commands::Dashboard {
            account,
            start,
            end,
        } => {
            let Some(dashboard) = open_dashboard(&gateway, &session).await? else {
                return Ok(());
            };

            if let Some(reason) = dashboard.accounts().await.failure() {
                println!("Failed to load accounts: {}", reason);
                return Ok(());
            }
            if dashboard.selected_account().await.is_none() {
                println!("No accounts yet. Import a broker statement first.");
                return Ok(());
            }

            if let Some(id) = account {
                dashboard.select_account(id).await?;
            }

            // An explicit window always wins; otherwise the account switch
            // has already fetched the default window.
            let window = match (start, end) {
                (None, None) => None,
                (s, e) => {
                    let (default_start, default_end) = Dashboard::default_window();
                    Some((s.unwrap_or(default_start), e.unwrap_or(default_end)))
                }
            };
            match window {
                Some((window_start, window_end)) => {
                    dashboard
                        .refresh_metrics_and_equity(window_start, window_end)
                        .await?;
                }
                None if account.is_none() => {
                    let (window_start, window_end) = Dashboard::default_window();
                    dashboard
                        .refresh_metrics_and_equity(window_start, window_end)
                        .await?;
                }
                None => {}
            }

            render_dashboard(&dashboard).await;
        }

        Commands::Trades {
            symbol,
            page,
            page_size,
        } => {
            let Some(dashboard) = open_dashboard(&gateway, &session).await? else {
                return Ok(());
            };

            if let Some(reason) = dashboard.accounts().await.failure() {
                println!("Failed to load accounts: {}", reason);
                return Ok(());
            }

            let query = TradeListQuery {
                symbol,
                start: None,
                end: None,
                page: Some(page),
                page_size: Some(page_size),
            };
            dashboard.load_trades(&query).await?;

            match dashboard.trades().await {
                FetchState::Ready(trades) => {
                    println!(
                        "\n{:<20} {:<10} {:<5} {:>12} {:>12}",
                        "DATE", "SYMBOL", "SIDE", "QTY", "PRICE"
                    );
                    println!("{}", "-".repeat(64));
                    for trade in &trades {
                        println!(
                            "{:<20} {:<10} {:<5} {:>12} {:>12.2}",
                            trade.executed_at.format("%Y-%m-%d %H:%M:%S"),
                            truncate(&trade.symbol, 10),
                            trade.side.as_str(),
                            trade.qty,
                            trade.price,
                        );
                    }
                    println!("\n{} trades (page {})", trades.len(), page);
                }
                FetchState::Failed(reason) => println!("Failed to load trades: {}", reason),
                FetchState::Idle => println!("No accounts yet."),
                FetchState::Loading => {}
            }
        }

        Commands::Import { account, file } => {
            if !session.is_authenticated() {
                println!("Not logged in. Use 'tradelog login' first.");
                return Ok(());
            }

            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "statement.csv".to_string());
            let bytes = tokio::fs::read(&file).await?;

            info!(account_id = account, file = %file.display(), "uploading statement");

            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str("text/csv")?;
            let form = reqwest::multipart::Form::new().part("file", part);

            let result: Result<CsvImportResult, GatewayError> = gateway
                .post_multipart(&format!("/accounts/{}/upload-csv", account), form)
                .await;

            match result {
                Ok(outcome) => println!(
                    "Imported {} trades into account {} ({} rows ignored).",
                    outcome.imported_trades, outcome.account_id, outcome.ignored_rows
                ),
                Err(e) if e.is_unauthorized() => {
                    session.expire().await;
                    println!("Session expired. Use 'tradelog login' to sign in again.");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Status => {
            println!("API base: {}", gateway.base_url());
            println!(
                "Session:  {}",
                if session.is_authenticated() {
                    "authenticated"
                } else {
                    "unauthenticated"
                }
            );
        }
    }

    Ok(())
}

/// Build the orchestrator and load the account list, printing the standard
/// guidance when the user is not logged in. Returns `None` when the command
/// should stop early.
async fn open_dashboard(
    gateway: &Arc<ApiGateway>,
    session: &Arc<Session>,
) -> Result<Option<Dashboard>> {
    if !session.is_authenticated() {
        println!("Not logged in. Use 'tradelog login' first.");
        return Ok(None);
    }

    let dashboard = Dashboard::new(gateway.clone(), session.clone());
    dashboard.load_accounts().await?;

    // A rejected credential surfaces here as a failed slot and an expired
    // session; tell the user instead of showing the raw failure.
    if !session.is_authenticated() {
        println!("Session expired. Use 'tradelog login' to sign in again.");
        return Ok(None);
    }

    Ok(Some(dashboard))
}

/// Render the metric tiles and the equity curve.
async fn render_dashboard(dashboard: &Dashboard) {
    let selected = dashboard.selected_account().await;
    let accounts = dashboard.accounts().await;
    let code = accounts
        .ready()
        .and_then(|list| list.iter().find(|a| Some(a.id) == selected))
        .map(|a| a.display_name().to_string())
        .unwrap_or_else(|| "?".to_string());

    println!("\n=== Dashboard: {} ===", code);

    match dashboard.metrics().await {
        FetchState::Ready(m) => {
            println!("\n--- Performance ---");
            println!("Win Rate:       {}", fmt_pct(m.win_rate));
            println!("Avg Win:        {}", fmt_money(m.avg_win));
            println!("Avg Loss:       {}", fmt_money(m.avg_loss));
            println!("Profit Factor:  {}", fmt_num(m.profit_factor));
            println!("Expectancy:     {}", fmt_money(m.expectancy));
            println!("Max Drawdown:   {}", fmt_pct(m.max_drawdown));
            println!("Total Trades:   {}", m.total_trades);
        }
        FetchState::Failed(reason) => println!("\nMetrics unavailable: {}", reason),
        _ => println!("\nMetrics not loaded."),
    }

    match dashboard.equity().await {
        FetchState::Ready(points) => {
            println!("\n--- Equity Curve ---");
            println!("{:<12} {:>14} {:>12}", "DATE", "EQUITY", "DAY P&L");
            println!("{}", "-".repeat(40));
            for point in &points {
                println!(
                    "{:<12} {:>14.2} {:>12.2}",
                    point.date, point.equity, point.net_pnl_day
                );
            }
        }
        FetchState::Failed(reason) => println!("\nEquity curve unavailable: {}", reason),
        _ => println!("\nEquity curve not loaded."),
    }
}

fn fmt_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_num(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_money(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
