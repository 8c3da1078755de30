use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use stocksim_core::ConfigLoader;
use stocksim_data::DatabaseClient;
use stocksim_engine::TradeEngine;

#[derive(Parser)]
#[command(name = "stocksim")]
#[command(about = "Classroom trading simulator", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema (idempotent)
    InitSchema,
    /// Show the institution's quote board
    Board {
        /// Institution ID
        #[arg(long)]
        institution: i64,
    },
    /// Show price history for an instrument
    History {
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// Maximum number of points (clamped server-side)
        #[arg(long, default_value_t = 30)]
        limit: i64,
    },
    /// Show current price and change since the previous point
    Change {
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
    },
    /// Record a manager-set price point
    RecordPrice {
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// New price (must be positive)
        #[arg(long)]
        price: Decimal,
    },
    /// Buy shares at the current price
    Buy {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// Shares to buy
        #[arg(long)]
        quantity: i64,
    },
    /// Sell shares at the current price
    Sell {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// Shares to sell
        #[arg(long)]
        quantity: i64,
    },
    /// Open a short contract at the current price
    ShortOpen {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// Shares to short
        #[arg(long)]
        quantity: i64,
        /// Contract lifetime in seconds
        #[arg(long)]
        duration: i64,
    },
    /// Close shorted shares at the current price
    ShortClose {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Institution ID
        #[arg(long)]
        institution: i64,
        /// Instrument ID
        #[arg(long)]
        stock: i64,
        /// Shares to close
        #[arg(long)]
        quantity: i64,
    },
    /// Force-close every expired short in an institution
    Sweep {
        /// Institution ID
        #[arg(long)]
        institution: i64,
    },
    /// Show a user's portfolio snapshot
    Portfolio {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Institution ID
        #[arg(long)]
        institution: i64,
    },
    /// Show a user's recent trades
    Activity {
        /// User ID
        #[arg(long)]
        user: i64,
        /// Maximum number of entries (clamped server-side)
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Show the institution's short-duration menu
    Durations {
        /// Institution ID
        #[arg(long)]
        institution: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::load_from(&cli.config)?;
    let db = DatabaseClient::new(&config.database.url, config.database.max_connections).await?;

    if matches!(cli.command, Commands::InitSchema) {
        db.init_schema().await?;
        println!("schema initialized");
        return Ok(());
    }

    let engine = TradeEngine::new(db.pool(), config.simulation);

    match cli.command {
        Commands::InitSchema => unreachable!("handled above"),
        Commands::Board { institution } => commands::board(&engine, institution).await,
        Commands::History {
            institution,
            stock,
            limit,
        } => commands::history(&engine, institution, stock, limit).await,
        Commands::Change { institution, stock } => {
            commands::change(&engine, institution, stock).await
        }
        Commands::RecordPrice {
            institution,
            stock,
            price,
        } => commands::record_price(&engine, institution, stock, price).await,
        Commands::Buy {
            user,
            institution,
            stock,
            quantity,
        } => commands::buy(&engine, user, institution, stock, quantity).await,
        Commands::Sell {
            user,
            institution,
            stock,
            quantity,
        } => commands::sell(&engine, user, institution, stock, quantity).await,
        Commands::ShortOpen {
            user,
            institution,
            stock,
            quantity,
            duration,
        } => commands::short_open(&engine, user, institution, stock, quantity, duration).await,
        Commands::ShortClose {
            user,
            institution,
            stock,
            quantity,
        } => commands::short_close(&engine, user, institution, stock, quantity).await,
        Commands::Sweep { institution } => commands::sweep(&engine, institution).await,
        Commands::Portfolio { user, institution } => {
            commands::portfolio(&engine, user, institution).await
        }
        Commands::Activity { user, limit } => commands::activity(&engine, user, limit).await,
        Commands::Durations { institution } => commands::durations(&engine, institution).await,
    }
}
