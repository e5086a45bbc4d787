//! A terminal client for the budget service.
//!
//! Useful for poking at the transaction feed and budget maths without
//! running the app: pages through a month's transactions the same way the
//! feed screen does, and reports budget spend recomputed from the
//! transactions themselves.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use pocketbook::{
    Error,
    api::ApiClient,
    config::ClientConfig,
    feed::{FeedCoordinator, FeedFilters, LoadOutcome},
    money,
};

/// A terminal client for the pocketbook budget service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the budget service API.
    #[arg(long, default_value = "http://localhost:8000/api/v1")]
    base_url: String,

    /// The number of transactions to fetch per page.
    #[arg(long, default_value_t = 10)]
    page_size: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through a month's transactions.
    Transactions {
        /// The month to list (1-12).
        #[arg(short, long)]
        month: u8,

        /// The year to list.
        #[arg(short, long)]
        year: i32,

        /// Only show transactions whose category matches this text.
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Show the month's budgets with spend recomputed from transactions.
    Budgets {
        /// The month to report on (1-12).
        #[arg(short, long)]
        month: u8,

        /// The year to report on.
        #[arg(short, long)]
        year: i32,
    },
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();
    let config = ClientConfig {
        base_url: args.base_url,
        page_size: args.page_size,
        ..ClientConfig::default()
    };
    let client = ApiClient::new(&config).expect("could not create the API client");

    let outcome = match args.command {
        Command::Transactions {
            month,
            year,
            search,
        } => list_transactions(client, &config, month, year, &search).await,
        Command::Budgets { month, year } => report_budgets(client, &config, month, year).await,
    };

    if let Err(error) = outcome {
        tracing::error!("{error}");
        std::process::exit(1);
    }
}

/// Page through the feed, printing each page as it arrives.
async fn list_transactions(
    client: ApiClient,
    config: &ClientConfig,
    month: u8,
    year: i32,
    search: &str,
) -> Result<(), Error> {
    let filters = FeedFilters::new(month, year, search)?;
    let coordinator = FeedCoordinator::new(client, filters, config.page_size);

    loop {
        match coordinator.request_next_page().await? {
            LoadOutcome::Appended(count) => {
                let items = coordinator.items()?;

                for transaction in &items[items.len() - count..] {
                    println!(
                        "{}  {:>12}  {}",
                        transaction.date,
                        money::format_currency(transaction.amount),
                        transaction.category
                    );
                }
            }
            LoadOutcome::EndOfFeed => break,
            // A single sequential caller cannot race itself or change
            // filters mid-loop, but the loop must still terminate.
            LoadOutcome::AlreadyLoading | LoadOutcome::StaleDiscarded => break,
        }
    }

    let items = coordinator.items()?;
    let total = money::sum_amounts(items.iter().map(|transaction| transaction.amount));
    println!(
        "{} transactions, net {}",
        items.len(),
        money::format_currency(total)
    );

    Ok(())
}

/// Print each budget for the month with its spend recomputed from the
/// month's transactions.
async fn report_budgets(
    client: ApiClient,
    config: &ClientConfig,
    month: u8,
    year: i32,
) -> Result<(), Error> {
    let budgets = client.list_budgets(month, year).await?;

    let filters = FeedFilters::new(month, year, "")?;
    let coordinator = FeedCoordinator::new(client, filters, config.page_size);
    while let LoadOutcome::Appended(_) = coordinator.request_next_page().await? {}
    let transactions = coordinator.items()?;

    for mut budget in budgets {
        budget.recompute_spent(&transactions);

        let standing = if budget.is_over() {
            format!("over by {}", money::format_currency(budget.overspend()))
        } else {
            format!("{} left", money::format_currency(budget.remaining()))
        };

        println!(
            "{:<20} {:>12} of {:>12}  ({standing})",
            budget.category,
            money::format_currency(budget.spent),
            money::format_currency(budget.limit),
        );
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty().with_filter(filter))
        .init();
}
