//! Blood Orange CLI - storefront client composition root.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! bo-cli catalog list
//! bo-cli catalog show citrus-tee
//!
//! # Manage the local cart
//! bo-cli cart add citrus-tee --variant v2
//! bo-cli cart set-quantity BO-TEE-M 3
//! bo-cli cart show
//!
//! # Wishlist (requires login)
//! bo-cli login ada@example.com
//! bo-cli wishlist toggle v2
//! bo-cli wishlist sync
//! ```
//!
//! # Environment
//!
//! - `BLOOD_ORANGE_API_BASE_URL` - backend base URL (required)
//! - `BLOOD_ORANGE_STATE_DIR` - cart/wishlist/credentials directory
//!   (default: `.blood-orange`)
//! - `BLOOD_ORANGE_PASSWORD` - password for `login` when `--password`
//!   is not given

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod context;

use context::AppContext;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Blood Orange storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Log in and store the session credentials
    Login {
        /// Account email address
        email: String,

        /// Account password (falls back to `BLOOD_ORANGE_PASSWORD`)
        #[arg(long, env = "BLOOD_ORANGE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored session credentials
    Logout,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List a page of products
    List {
        /// Opaque page cursor from a previous listing
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Show one product by handle
    Show {
        /// Product handle
        handle: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and totals
    Show,
    /// Add one unit of a product's variant
    Add {
        /// Product handle
        handle: String,

        /// Variant id (defaults to the first available variant)
        #[arg(long)]
        variant: Option<String>,
    },
    /// Remove a line item
    Remove {
        /// Line item sku
        sku: String,
    },
    /// Set a line item's quantity (0 removes it)
    SetQuantity {
        /// Line item sku
        sku: String,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List liked variants
    List,
    /// Toggle a variant on or off the wishlist
    Toggle {
        /// Variant id
        variant_id: String,
    },
    /// Reconcile the local wishlist against the server
    Sync,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "bo_cli=info,blood_orange_client=info,blood_orange_stores=info".into()
    });
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::from_env().await?;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { cursor } => {
                commands::catalog::list(&ctx, cursor.as_deref()).await?;
            }
            CatalogAction::Show { handle } => commands::catalog::show(&ctx, &handle).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { handle, variant } => {
                commands::cart::add(&ctx, &handle, variant.as_deref()).await?;
            }
            CartAction::Remove { sku } => commands::cart::remove(&ctx, &sku),
            CartAction::SetQuantity { sku, quantity } => {
                commands::cart::set_quantity(&ctx, &sku, quantity);
            }
            CartAction::Clear => commands::cart::clear(&ctx),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::List => commands::wishlist::list(&ctx),
            WishlistAction::Toggle { variant_id } => {
                commands::wishlist::toggle(&ctx, &variant_id).await?;
            }
            WishlistAction::Sync => commands::wishlist::sync(&ctx).await?,
        },
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx)?,
    }

    // Mutations persist fire-and-forget; drain them before the process
    // exits.
    ctx.settle().await;
    Ok(())
}
