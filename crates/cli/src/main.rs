//! Go Marketplace CLI - Inspect and edit the stored shopping cart.
//!
//! # Usage
//!
//! ```bash
//! # Add a product to the cart
//! gm-cli add --id a1 --title Shirt --image-url https://cdn.example.com/a1.png --price 9.99
//!
//! # Bump or lower a quantity
//! gm-cli increment a1
//! gm-cli decrement a1
//!
//! # Show the cart
//! gm-cli list
//! ```
//!
//! # Commands
//!
//! - `add` - Add a product, or bump its quantity if already present
//! - `increment` / `decrement` - Change the quantity of a product in the cart
//! - `list` - Print the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use go_marketplace_cart::CartConfig;
use go_marketplace_core::{CatalogProduct, Price, ProductId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::cart::{self, CartAction};

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(author, version, about = "Go Marketplace cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product to the cart
    Add {
        /// Catalog product ID
        #[arg(long)]
        id: ProductId,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 9.99)
        #[arg(long)]
        price: Price,
    },
    /// Increase the quantity of a product by one
    Increment {
        /// Catalog product ID
        id: ProductId,
    },
    /// Decrease the quantity of a product by one
    Decrement {
        /// Catalog product ID
        id: ProductId,
    },
    /// Print the cart
    List,
}

impl From<Commands> for CartAction {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Add {
                id,
                title,
                image_url,
                price,
            } => Self::Add(CatalogProduct {
                id,
                title,
                image_url,
                price,
            }),
            Commands::Increment { id } => Self::Increment(id),
            Commands::Decrement { id } => Self::Decrement(id),
            Commands::List => Self::List,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
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
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not set up yet
            report_startup_error(&e);
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so the cart listing on stdout stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "go_marketplace_cli=info,go_marketplace_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let store = cart::open_store(&config).await;

    match cart::run(&store, cli.command.into()).await {
        Ok(contents) => print_cart(&cart::render(&contents)),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

#[allow(clippy::print_stderr)]
fn report_startup_error(error: &go_marketplace_cart::ConfigError) {
    eprintln!("Failed to load configuration: {error}");
}

#[allow(clippy::print_stdout)]
fn print_cart(listing: &str) {
    print!("{listing}");
}
