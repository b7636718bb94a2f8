//! Error handling example.
//!
//! Demonstrates branching on walletmux errors, both as typed
//! [`WalletError`] values and as wire payloads a host receives.
//!
//! Run with: cargo run --example error_handling

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use walletmux::backends::mock::{MockWallet, UserResponse};
use walletmux::dispatcher::{Dispatcher, Request};
use walletmux::{Config, WalletBackend, WalletError};

#[tokio::main]
async fn main() -> walletmux::Result<()> {
    println!("=== Error Handling Example ===\n");

    let wallet = Arc::new(MockWallet::new());
    let backend: Arc<dyn WalletBackend> = wallet.clone();
    let dispatcher = Arc::new(Dispatcher::new(backend, &Config::default())?);

    // Example 1: argument validation happens before any work
    println!("1. Handling invalid arguments:");
    match Request::parse("addWalletCard", &json!({"path": 42})) {
        Ok(request) => println!("   Parsed: {:?}", request),
        Err(WalletError::InvalidArgument(msg)) => println!("   ✓ Rejected: {}", msg),
        Err(e) => println!("   Unexpected error: {}", e),
    }

    // Example 2: missing files
    println!("\n2. Handling FileNotFound:");
    match dispatcher
        .execute(Request::AddWalletCard {
            path: "/nonexistent/ticket.pkpass".to_string(),
        })
        .await
    {
        Ok(added) => println!("   Added: {}", added),
        Err(WalletError::FileNotFound(path)) => println!("   ✓ '{}' does not exist", path),
        Err(e) => println!("   Unexpected error: {}", e),
    }

    // Example 3: wire payloads for the host
    println!("\n3. Error payloads:");
    let err = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": "NOPE"}))
        .await;
    if let Err(payload) = err {
        println!("   ✓ code={} message={}", payload.code, payload.message);
    }

    // Example 4: only one add-flow at a time
    println!("\n4. Handling AddInProgress:");
    let ticket = pass_bytes("T-1");
    let first = {
        let dispatcher = dispatcher.clone();
        let ticket = ticket.clone();
        tokio::spawn(async move { add_bytes(&dispatcher, &ticket).await })
    };
    while !wallet.has_pending_presentation() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    match add_bytes(&dispatcher, &pass_bytes("T-2")).await {
        Err(WalletError::AddInProgress) => println!("   ✓ Second add rejected while the sheet is up"),
        other => println!("   Unexpected: {:?}", other),
    }
    wallet.respond(UserResponse::Accept).await;
    println!("   First add finished: {:?}", first.await);

    // Example 5: teardown cancels whoever is still waiting
    println!("\n5. Handling Cancelled on shutdown:");
    let waiting = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            add_bytes(&dispatcher, &pass_bytes("T-3")).await
        })
    };
    while !wallet.has_pending_presentation() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    dispatcher.shutdown().await?;
    match waiting.await {
        Ok(Err(WalletError::Cancelled)) => println!("   ✓ Pending add cancelled"),
        other => println!("   Unexpected: {:?}", other),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

fn pass_bytes(serial: &str) -> Vec<u8> {
    json!({"serialNumber": serial, "organizationName": "Acme Events"})
        .to_string()
        .into_bytes()
}

/// Adds a pass from raw bytes by going through a temporary file.
async fn add_bytes(dispatcher: &Dispatcher, bytes: &[u8]) -> walletmux::Result<bool> {
    let path = std::env::temp_dir().join(format!("walletmux-{}.pkpass", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| WalletError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

    let result = dispatcher
        .execute(Request::AddWalletCard {
            path: path.display().to_string(),
        })
        .await;
    let _ = tokio::fs::remove_file(&path).await;
    result.map(|added| added.as_bool().unwrap_or(false))
}
