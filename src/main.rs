//! pairs-scout - Cointegrated pairs screening
//!
//! Batch entry point: load configuration, run the pipeline, print the result.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (path overrides go here, not in the config)
    dotenvy::dotenv().ok();

    let app = pairs_scout::adapters::cli::init();
    pairs_scout::adapters::cli::execute(app).await
}
