//! Synchronizes a BigQuery dataset with a directory of table schemas.
//!
//! Usage:
//!     bq-schema-sync --dataset analytics --schemas-path ./schemas \
//!         --table-prefix raw_ --table-suffix _v1
//!
//! Credentials come from `ADC_ENCODED` (base64 bundle) or
//! `GOOGLE_APPLICATION_CREDENTIALS` (bundle path).

use clap::Parser;
use integrations_bigquery::credentials::EnvironmentCredentials;
use integrations_bigquery::schema::{load_schema_dir, SchemaSync};
use integrations_bigquery::{BigQueryClient, BigQueryResult};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "bq-schema-sync", version, about)]
struct Args {
    /// Dataset to create and sync
    #[arg(long, env = "BQ_DATASET")]
    dataset: String,

    /// Directory holding `<table>.schema.json` files
    #[arg(long, env = "BQ_SCHEMAS_PATH")]
    schemas_path: PathBuf,

    /// Prefix added to every table name
    #[arg(long, env = "BQ_TABLE_PREFIX", default_value = "")]
    table_prefix: String,

    /// Suffix added to every table name
    #[arg(long, env = "BQ_TABLE_SUFFIX", default_value = "")]
    table_suffix: String,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> BigQueryResult<()> {
    let client = BigQueryClient::from_source(&EnvironmentCredentials::new()).await?;
    let schemas = load_schema_dir(&args.schemas_path).await?;

    SchemaSync::new(args.dataset)
        .table_prefix(args.table_prefix)
        .table_suffix(args.table_suffix)
        .run(&client, &schemas)
        .await?;

    tracing::info!("Schema sync complete");
    Ok(())
}
