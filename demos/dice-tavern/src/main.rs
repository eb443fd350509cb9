//! Runs a Tavern server with the demo room seeded.
//!
//! ```text
//! cargo run -p dice-tavern [bind-addr]
//! ```

use tavern::{DEMO_ROOM_ID, TavernError, TavernServer};

#[tokio::main]
async fn main() -> Result<(), TavernError> {
    tavern::logging::init("info");

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = TavernServer::builder().bind(&addr).build().await?;
    tracing::info!(room_id = DEMO_ROOM_ID, "demo room ready");

    server.run().await
}
