//! Basic usage example with the mock backend.
//!
//! Run with: cargo run --example basic

use serde_json::json;
use std::sync::Arc;
use walletmux::backends::mock::{MockWallet, UserResponse};
use walletmux::dispatcher::Dispatcher;
use walletmux::logging::{init_logging, LogConfig};
use walletmux::{Config, WalletBackend};

#[tokio::main]
async fn main() -> walletmux::Result<()> {
    init_logging(&LogConfig::default());

    // A mock wallet whose "user" taps Add on every sheet
    let mut wallet = MockWallet::new();
    wallet.response = Some(UserResponse::Accept);
    let wallet = Arc::new(wallet);
    let backend: Arc<dyn WalletBackend> = wallet.clone();

    let dispatcher = Dispatcher::new(backend, &Config::default())?;
    println!("Backend: {}", dispatcher.backend().name());

    let available = dispatcher.handle("isWalletAvailable", &json!({})).await;
    println!("Wallet available: {:?}", available);

    // Write a pass file the mock understands
    let dir = std::env::temp_dir().join("walletmux-basic");
    std::fs::create_dir_all(&dir).map_err(|e| walletmux::WalletError::FileReadError {
        path: dir.display().to_string(),
        source: e,
    })?;
    let path = dir.join("boarding.pkpass");
    let pass = json!({
        "serialNumber": "ABC123",
        "organizationName": "Acme Air",
        "description": "Boarding pass LHR-SFO",
        "passTypeIdentifier": "pass.com.acme.boarding",
    });
    std::fs::write(&path, pass.to_string()).map_err(|e| walletmux::WalletError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    // Validate, add, then inspect
    let validation = dispatcher.handle("validatePass", &json!({"path": path})).await;
    println!("Validation: {:?}", validation);

    let added = dispatcher.handle("addWalletCard", &json!({"path": path})).await;
    println!("Added: {:?}", added);

    let present = dispatcher
        .handle("isWalletCardAdded", &json!({"serialNumber": "ABC123"}))
        .await;
    println!("In wallet: {:?}", present);

    let info = dispatcher
        .handle("getPassInfo", &json!({"serialNumber": "ABC123"}))
        .await;
    println!("Pass info: {:?}", info);

    // A second add of the same pass is refused before any UI is shown
    let again = dispatcher.handle("addWalletCard", &json!({"path": path})).await;
    println!("Added again: {:?}", again);

    let viewed = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": "ABC123"}))
        .await;
    println!("Opened in wallet: {:?} ({:?})", viewed, wallet.opened_urls());

    dispatcher.shutdown().await?;
    Ok(())
}
