use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    clientlib_cli::main_entry().await
}
