//! SriSri CLI - Catalog administration from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from SRISRI_PASSWORD)
//! srisri login -e admin@srisriethnics.in
//!
//! # Browse the catalog
//! srisri products list --category sarees --sort price-asc
//! srisri categories list --active true
//!
//! # Upload images and create a product
//! srisri products create --name "Silk Saree" --price 5999 --category sarees --image front.jpg
//!
//! # Contact links for a product
//! srisri contact --product p-123
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Manage the stored session
//! - `products` - List, show, create, update and delete products
//! - `categories` - List, show, create, update and delete categories
//! - `upload` - Upload images and print their URLs
//! - `contact` - Print phone and WhatsApp links
//!
//! Configuration comes from `SRISRI_*` environment variables (see
//! `srisri_client::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use srisri_client::{CatalogClient, ClientConfig};

mod commands;

use commands::categories::CategoryAction;
use commands::products::ProductAction;

#[derive(Parser)]
#[command(name = "srisri")]
#[command(author, version, about = "SriSri Ethnics catalog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as an admin
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long, env = "SRISRI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Upload images and print their public URLs
    Upload {
        /// Image files (jpg, jpeg, png, webp; at most 5 MiB each)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print contact links
    Contact {
        /// Pre-fill the WhatsApp message for this product ID
        #[arg(long)]
        product: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays valid JSON
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "srisri=info,srisri_client=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = CatalogClient::new(ClientConfig::from_env()?)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&client, &email, password).await?;
        }
        Commands::Logout => commands::auth::logout(&client)?,
        Commands::Whoami => commands::auth::whoami(&client)?,
        Commands::Products { action } => commands::products::run(&client, action).await?,
        Commands::Categories { action } => commands::categories::run(&client, action).await?,
        Commands::Upload { paths } => commands::upload::run(&client, &paths).await?,
        Commands::Contact { product } => commands::contact::run(&client, product).await?,
    }
    Ok(())
}
