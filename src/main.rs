#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keycast_lib::run().await
}
