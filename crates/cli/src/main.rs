//! Shopmate CLI - Catalog browsing, cart quotes and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! shopmate catalog --category electronics --limit 5
//! shopmate catalog --search phone
//! shopmate catalog --related 3
//!
//! # Price a saved cart
//! shopmate quote --items cart.json --tier express --promo WELCOME20
//!
//! # Walk through a full shopping session against in-memory collaborators
//! shopmate demo
//!
//! # Generate a session cache key
//! shopmate keygen
//!
//! # Create the document store schema (postgres feature)
//! shopmate migrate
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse the product catalog
//! - `quote` - Price a cart file
//! - `demo` - Register, shop, check out and log back in
//! - `keygen` - Print a fresh `SHOPMATE_SESSION_CACHE_KEY`
//! - `migrate` - Run document store migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sentry::integrations::tracing as sentry_tracing;
use shopmate_client::config::ClientConfig;
use shopmate_core::DeliveryTier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopmate")]
#[command(author, version, about = "Shopmate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive match on name, category or brand
        #[arg(short, long, conflicts_with = "category")]
        search: Option<String>,

        /// List category names instead of products
        #[arg(long, conflicts_with_all = ["category", "search"])]
        categories: bool,

        /// Products related to the one with this id
        #[arg(long, conflicts_with_all = ["category", "search", "categories"])]
        related: Option<i64>,

        /// Maximum number of products to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Price a cart saved as JSON
    Quote {
        /// Cart file (array of `{ product, quantity }` lines)
        #[arg(short, long)]
        items: PathBuf,

        /// Delivery tier
        #[arg(short, long, value_enum, default_value_t = TierArg::Standard)]
        tier: TierArg,

        /// Promo code
        #[arg(short, long)]
        promo: Option<String>,

        /// Use the cart summary pricing instead of the configured policy
        #[arg(long)]
        summary: bool,
    },
    /// Run a scripted shopping session against in-memory collaborators
    Demo {
        /// Pick products from the live catalog instead of built-in samples
        #[arg(long)]
        live_catalog: bool,
    },
    /// Print a new base64 session cache key
    Keygen,
    /// Run document store migrations
    #[cfg(feature = "postgres")]
    Migrate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TierArg {
    Standard,
    Express,
    SameDay,
}

impl From<TierArg> for DeliveryTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Standard => Self::Standard,
            TierArg::Express => Self::Express,
            TierArg::SameDay => Self::SameDay,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Default log filter: this binary and the client library at info.
fn default_log_filter() -> String {
    format!("{}=info,shopmate_client=info", env!("CARGO_CRATE_NAME"))
}

impl Commands {
    /// Whether the command reads `ClientConfig`.
    const fn needs_config(&self) -> bool {
        !matches!(self, Self::Keygen)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // keygen has to work while the session cache settings are incomplete
    let config = cli.command.needs_config().then(ClientConfig::from_env);

    // Sentry must be up before the subscriber so the layer has a client
    let _sentry_guard = config
        .as_ref()
        .and_then(|config| config.as_ref().ok())
        .and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_log_filter().into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config.transpose() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Option<ClientConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = move || config.ok_or("configuration was not loaded");

    match cli.command {
        Commands::Catalog {
            category,
            search,
            categories,
            related,
            limit,
        } => {
            let filter = if categories {
                commands::catalog::Filter::Categories
            } else if let Some(id) = related {
                commands::catalog::Filter::Related(id)
            } else if let Some(category) = category {
                commands::catalog::Filter::Category(category)
            } else if let Some(query) = search {
                commands::catalog::Filter::Search(query)
            } else {
                commands::catalog::Filter::All
            };
            commands::catalog::list(&loaded()?, filter, limit).await?;
        }
        Commands::Quote {
            items,
            tier,
            promo,
            summary,
        } => {
            let pricing = if summary {
                shopmate_core::PricingPolicy::cart_summary()
            } else {
                loaded()?.pricing
            };
            commands::quote::quote(&items, &pricing, tier.into(), promo.as_deref()).await?;
        }
        Commands::Demo { live_catalog } => commands::demo::run(loaded()?, live_catalog).await?,
        Commands::Keygen => commands::keygen::print_key(),
        #[cfg(feature = "postgres")]
        Commands::Migrate => commands::migrate::run(&loaded()?).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_binary_target() {
        let filter = default_log_filter();
        assert!(filter.split(',').any(|d| d == "shopmate=info"));
        assert!(tracing_subscriber::EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_keygen_does_not_load_config() {
        let keygen = Cli::try_parse_from(["shopmate", "keygen"]).unwrap();
        assert!(!keygen.command.needs_config());

        let quote = Cli::try_parse_from(["shopmate", "quote", "--items", "cart.json"]).unwrap();
        assert!(quote.command.needs_config());
    }

    #[test]
    fn test_related_conflicts_with_search() {
        assert!(Cli::try_parse_from(["shopmate", "catalog", "--related", "3"]).is_ok());
        assert!(
            Cli::try_parse_from(["shopmate", "catalog", "--related", "3", "--search", "milk"])
                .is_err()
        );
    }
}
