//! reportforge binary entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reportforge::cli::run().await
}
