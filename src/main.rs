use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    chatbot::run().await
}
