#[tokio::main]
async fn main() {
    sociable::start_server().await;
}
