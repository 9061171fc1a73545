#[tokio::main]
async fn main() -> anyhow::Result<()> {
    exercise_player::run().await
}
