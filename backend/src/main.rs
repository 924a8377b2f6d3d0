#[tokio::main]
async fn main() -> anyhow::Result<()> {
    omnifood::start_server().await
}
