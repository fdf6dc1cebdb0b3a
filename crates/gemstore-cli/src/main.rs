mod quote;

use clap::{Parser, Subcommand};
use gemstore_core::MetalCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gemstore-cli")]
#[command(about = "Resolve carat-based prices against the storefront pricing API")]
struct Cli {
    /// Print machine-readable JSON instead of a summary line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the price of one product configuration
    Quote {
        /// Product ID
        #[arg(long)]
        product: String,
        /// Index into the product's sorted carat options (clamped)
        #[arg(long, default_value_t = 0)]
        carat_index: usize,
        /// Metal purity: 14k or 18k
        #[arg(long, default_value_t = MetalCode::K14)]
        metal: MetalCode,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },
    /// List the product's carat options in index order
    Options {
        /// Product ID
        #[arg(long)]
        product: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = gemstore_core::load_pricing_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Quote {
            product,
            carat_index,
            metal,
            color,
            size,
        } => {
            let selection = quote::QuoteSelection {
                carat_index,
                metal,
                color,
                size,
            };
            quote::run_quote(&config, &product, selection, cli.json).await?;
        }
        Commands::Options { product } => {
            quote::run_options(&config, &product, cli.json).await?;
        }
    }

    Ok(())
}
