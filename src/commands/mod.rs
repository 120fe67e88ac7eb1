pub mod discover;
pub mod generate;
pub mod stats;

use tokio::sync::watch;

// Re-export command functions for convenience
pub use discover::discover;
pub use generate::generate;
pub use stats::stats;

/// Channel that flips to `true` on the first Ctrl-C
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            println!("\nInterrupted: finishing in-flight entities...");
            let _ = tx.send(true);
        }
    });
    rx
}
