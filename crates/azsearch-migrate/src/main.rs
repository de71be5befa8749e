//! Azure Search Migration CLI
//!
//! CLI tool for copying a search index, schema and documents, between two
//! Azure Cognitive Search services.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use azsearch_migrate::{Migration, MigrationConfig, SearchClient};

#[derive(Parser)]
#[command(name = "azsearch-migrate")]
#[command(version)]
#[command(about = "Copy a search index (schema and documents) between services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "AZSEARCH_MIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Dry run mode (read everything, write nothing)
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Page size override
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migration from config file
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Show the source index schema and document count
    Schema {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Run { config }) => {
            run_migration(&config, cli.dry_run, cli.page_size).await?;
        }
        Some(Commands::Validate { config }) => {
            validate_config(&config)?;
        }
        Some(Commands::Schema { config }) => {
            show_schema(&config).await?;
        }
        Some(Commands::Init { output }) => {
            generate_config(&output)?;
        }
        None => {
            // Default: run migration if config provided
            if let Some(config) = cli.config {
                run_migration(&config, cli.dry_run, cli.page_size).await?;
            } else {
                eprintln!("Usage: azsearch-migrate --config <FILE> or azsearch-migrate <COMMAND>");
                eprintln!("Try 'azsearch-migrate --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_migration(
    config_path: &PathBuf,
    dry_run: bool,
    page_size: Option<usize>,
) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = MigrationConfig::from_file(config_path)?;

    if dry_run {
        config.options.dry_run = true;
    }

    if let Some(size) = page_size {
        config.options.page_size = size;
    }

    let migration = Migration::new(config)?;
    let report = migration.run().await?;

    let headline = if report.dry_run {
        "✅ Dry Run Complete!"
    } else if report.counts_match() == Some(false) || !report.failed_fields.is_empty() {
        "⚠️ Migration Complete (with warnings)"
    } else {
        "✅ Migration Complete!"
    };

    println!("\n{headline}");
    print!("{report}");
    println!(
        "Duration: {:.2}s ({:.0} docs/sec)",
        report.duration_secs,
        report.throughput()
    );

    Ok(())
}

fn validate_config(config_path: &PathBuf) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    println!("✅ Configuration is valid!");
    println!(
        "   Source: {} index '{}'",
        config.source.endpoint_url()?,
        config.source.index
    );
    println!(
        "   Target: {} index '{}'",
        config.target.endpoint_url()?,
        config.target.index
    );
    println!("   Page size: {}", config.options.page_size);

    Ok(())
}

async fn show_schema(config_path: &PathBuf) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    let client = SearchClient::new(&config.source)?;

    let index = client.get_index(&config.source.index).await?;
    let total = client.count_documents(&config.source.index).await?;

    println!("\n📊 Source Index:");
    println!("   Endpoint:  {}", client.endpoint());
    println!("   Name:      {}", index.name);
    println!("   Documents: {}", total);
    println!("   Fields:");
    for field in &index.fields {
        println!("     - {}", field);
    }

    Ok(())
}

fn generate_config(output: &PathBuf) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: azsearch-migrate run --config {:?}",
        output
    );

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# Azure Search Migration Configuration
source:
  service: legacy-search  # endpoint becomes https://legacy-search.search.windows.net
  # endpoint: http://localhost:8080  # Overrides service; for emulators/sovereign clouds
  api_key: your-source-admin-key
  index: your-index
  # api_version: 2020-06-30

target:
  service: new-search
  api_key: your-target-admin-key
  index: your-index

options:
  page_size: 50              # documents per search page and upload batch (max 1000)
  settle_secs: 5             # wait before the first verification count
  verify_timeout_secs: 30    # stop polling the target count after this long
  dry_run: false             # read everything, write nothing
  trace_documents: false     # debug-log every copied document key
  continue_on_schema_error: false  # keep copying documents after a schema failure
"#;
