//! ShopKart CLI - drive the storefront client core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog and shop as a guest
//! sk-cli products list --search tee --max-price 600
//! sk-cli products show 3
//! sk-cli cart add --product 3 --variant 7 --qty 2
//! sk-cli cart show
//!
//! # Sign in (the guest cart is merged into yours)
//! sk-cli register --name Asha --email asha@shop.test
//! sk-cli login --email asha@shop.test
//! sk-cli addresses add --alias Home --line1 "12 MG Road" --city Pune --state MH --zip 411001
//!
//! # Check stock, pay and place the order
//! sk-cli cart check
//! sk-cli checkout --address 5
//!
//! # Order history
//! sk-cli orders list --limit 10
//! sk-cli orders invoice 11 --out invoice-11.pdf
//! ```
//!
//! Configuration comes from the environment (see
//! `shopkart_storefront::config`). Carts and the credential are kept in
//! `SHOPKART_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use shopkart_core::{AddressId, OrderId};
use shopkart_storefront::config::StorefrontConfig;
use shopkart_storefront::models::{AddressInput, AddressUpdate, ProductQuery};
use shopkart_storefront::state::StorefrontContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sk-cli")]
#[command(author, version, about = "ShopKart storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and merge the guest cart
    Login {
        /// Account email; the password is read from stdin unless given
        #[arg(short, long, required_unless_present = "token")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
        /// Use an already issued JWT instead of email and password
        #[arg(short, long, conflicts_with = "email")]
        token: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored credential
    Logout,
    /// Show who the cart belongs to
    Whoami,
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// Manage saved shipping addresses (lists them by default)
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Pay for the cart and place an order
    Checkout {
        /// Shipping address ID (see `addresses`)
        #[arg(short, long)]
        address: Option<AddressId>,
    },
    /// Past orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add a product variant, or increase its quantity
    Add {
        #[arg(short, long)]
        product: String,
        #[arg(short, long)]
        variant: String,
        /// Unit price; taken from the catalog when omitted
        #[arg(long)]
        price: Option<Decimal>,
        /// Units to add (default 1)
        #[arg(short, long)]
        qty: Option<u32>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Decrease a line, removing it at zero
    Dec {
        #[arg(short, long)]
        product: String,
        #[arg(short, long)]
        variant: String,
        #[arg(long, default_value_t = 1)]
        by: u32,
    },
    /// Remove a line
    Remove {
        #[arg(short, long)]
        product: String,
        #[arg(short, long)]
        variant: String,
    },
    /// Empty the cart
    Clear,
    /// Check the cart against current stock
    Check,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show a product and its variants
    Show { product_id: String },
    /// Suggest product names for a partial term
    Suggest {
        term: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        alias: String,
        #[arg(long)]
        line1: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        zip: i64,
    },
    /// Change fields of a saved address
    Update {
        address_id: AddressId,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        line1: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        zip: Option<i64>,
    },
    /// Delete a saved address
    Delete { address_id: AddressId },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Download an order's PDF invoice
    Invoice {
        order_id: OrderId,
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
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
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopkart_storefront=info,shopkart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = StorefrontContext::open(config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            token,
        } => match (token, email) {
            (Some(token), _) => commands::session::login(&mut ctx, &token)?,
            (None, Some(email)) => commands::account::login(&mut ctx, &email, password).await?,
            (None, None) => return Err("either --email or --token is required".into()),
        },
        Commands::Register {
            name,
            email,
            phone,
            password,
        } => commands::account::register(&ctx, &name, &email, phone, password).await?,
        Commands::Logout => commands::session::logout(&mut ctx)?,
        Commands::Whoami => commands::session::whoami(&ctx),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&mut ctx),
            CartAction::Add {
                product,
                variant,
                price,
                qty,
                name,
                size,
                color,
            } => {
                commands::cart::add(
                    &mut ctx,
                    commands::cart::NewLine {
                        product,
                        variant,
                        price,
                        qty,
                        name,
                        size,
                        color,
                    },
                )
                .await?;
            }
            CartAction::Dec {
                product,
                variant,
                by,
            } => commands::cart::decrement(&mut ctx, &product, &variant, by),
            CartAction::Remove { product, variant } => {
                commands::cart::remove(&mut ctx, &product, &variant);
            }
            CartAction::Clear => commands::cart::clear(&mut ctx),
            CartAction::Check => commands::cart::check(&mut ctx).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                brand,
                min_price,
                max_price,
                limit,
                offset,
            } => {
                let query = ProductQuery {
                    search,
                    category_id: category,
                    brand,
                    min_price,
                    max_price,
                    limit,
                    offset,
                };
                commands::catalog::list(&ctx, &query).await?;
            }
            ProductsAction::Show { product_id } => commands::catalog::show(&ctx, &product_id).await?,
            ProductsAction::Suggest { term, limit } => {
                commands::catalog::suggest(&ctx, &term, limit).await?;
            }
        },
        Commands::Categories => commands::catalog::categories(&ctx).await?,
        Commands::Addresses { action } => match action.unwrap_or(AddressAction::List) {
            AddressAction::List => commands::account::addresses(&ctx).await?,
            AddressAction::Add {
                alias,
                line1,
                city,
                state,
                zip,
            } => {
                let input = AddressInput {
                    alias,
                    address_line1: line1,
                    city,
                    state,
                    zip_code: zip,
                };
                commands::account::add_address(&ctx, input).await?;
            }
            AddressAction::Update {
                address_id,
                alias,
                line1,
                city,
                state,
                zip,
            } => {
                let update = AddressUpdate {
                    alias,
                    address_line1: line1,
                    city,
                    state,
                    zip_code: zip,
                };
                commands::account::update_address(&ctx, address_id, update).await?;
            }
            AddressAction::Delete { address_id } => {
                commands::account::delete_address(&ctx, address_id).await?;
            }
        },
        Commands::Checkout { address } => commands::checkout::run(&mut ctx, address).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List { limit, offset } => {
                commands::orders::list(&ctx, limit, offset).await?;
            }
            OrdersAction::Invoice { order_id, out } => {
                commands::orders::invoice(&ctx, order_id, &out).await?;
            }
        },
    }
    Ok(())
}
