//! End-to-end dispatch tests against the mock wallet.
//!
//! Run with:
//!   cargo test --test dispatcher

#![cfg(feature = "mock")]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use walletmux::backends::mock::{MockWallet, UserResponse};
use walletmux::correlator::FlowPhase;
use walletmux::dispatcher::Dispatcher;
use walletmux::{Config, PassHandle, WalletBackend, WalletError};

fn pass_json(serial: &str) -> String {
    json!({
        "serialNumber": serial,
        "organizationName": "Acme Air",
        "description": "Boarding pass",
        "passTypeIdentifier": "pass.com.acme.boarding",
    })
    .to_string()
}

fn write_pass(dir: &Path, name: &str, serial: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pass_json(serial)).unwrap();
    path
}

fn setup(wallet: MockWallet) -> (Arc<MockWallet>, Arc<Dispatcher>) {
    let wallet = Arc::new(wallet);
    let backend: Arc<dyn WalletBackend> = wallet.clone();
    let dispatcher = Dispatcher::new(backend, &Config::default()).unwrap();
    (wallet, Arc::new(dispatcher))
}

fn accepting() -> MockWallet {
    let mut wallet = MockWallet::new();
    wallet.response = Some(UserResponse::Accept);
    wallet
}

async fn wait_for_presentation(wallet: &MockWallet, dispatcher: &Dispatcher) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !wallet.has_pending_presentation()
            || dispatcher.correlator().phase() != FlowPhase::Presenting
        {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("add UI was never presented");
}

#[tokio::test]
async fn test_add_wallet_card_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write_pass(dir.path(), "boarding.pkpass", "ABC123");
    let (wallet, dispatcher) = setup(accepting());

    let result = dispatcher
        .handle("addWalletCard", &json!({"path": path}))
        .await;
    assert_eq!(result, Ok(json!(true)));
    assert_eq!(wallet.presented(), vec![vec!["ABC123".to_string()]]);

    let added = dispatcher
        .handle("isWalletCardAdded", &json!({"serialNumber": "ABC123"}))
        .await;
    assert_eq!(added, Ok(json!(true)));
    assert_eq!(dispatcher.correlator().phase(), FlowPhase::Idle);
}

#[tokio::test]
async fn test_add_wallet_card_cancelled_by_user() {
    let dir = TempDir::new().unwrap();
    let path = write_pass(dir.path(), "boarding.pkpass", "ABC123");
    let mut wallet = MockWallet::new();
    wallet.response = Some(UserResponse::Cancel);
    let (_wallet, dispatcher) = setup(wallet);

    let result = dispatcher
        .handle("addWalletCard", &json!({"path": path}))
        .await;
    assert_eq!(result, Ok(json!(false)));
}

#[tokio::test]
async fn test_unreadable_path_is_file_not_found() {
    let (wallet, dispatcher) = setup(accepting());

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": "/nonexistent/boarding.pkpass"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "FILE_NOT_FOUND");
    assert!(err.message.contains("/nonexistent/boarding.pkpass"));
    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_already_present_pass_is_rejected_without_ui() {
    let dir = TempDir::new().unwrap();
    let path = write_pass(dir.path(), "boarding.pkpass", "ABC123");
    let (wallet, dispatcher) = setup(accepting());
    wallet
        .set_pass(PassHandle::new("ABC123", "Acme Air", "Boarding pass", "pass.com.acme.boarding"))
        .await;

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": path}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "PASS_ALREADY_EXISTS");
    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_invalid_pass_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pkpass");
    std::fs::write(&path, b"PK\x03\x04 zipped bytes").unwrap();
    let (wallet, dispatcher) = setup(accepting());

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": path}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_PASS_FORMAT");
    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_add_multiple_presents_one_batch() {
    let dir = TempDir::new().unwrap();
    let a = write_pass(dir.path(), "a.pass", "A");
    let b = write_pass(dir.path(), "b.pass", "B");
    let (wallet, dispatcher) = setup(accepting());

    let result = dispatcher
        .handle("addMultipleWalletCards", &json!({"paths": [a, b]}))
        .await;
    assert_eq!(result, Ok(json!(true)));
    assert_eq!(
        wallet.presented(),
        vec![vec!["A".to_string(), "B".to_string()]]
    );
    assert_eq!(wallet.list_passes().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_multiple_fails_whole_batch_on_missing_file() {
    let dir = TempDir::new().unwrap();
    let a = write_pass(dir.path(), "a.pass", "A");
    let missing = dir.path().join("missing.pass");
    let (wallet, dispatcher) = setup(accepting());

    let err = dispatcher
        .handle("addMultipleWalletCards", &json!({"paths": [a, missing]}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "FILE_NOT_FOUND");
    assert!(err.message.contains("missing.pass"));
    assert!(wallet.presented().is_empty());
    assert!(wallet.list_passes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_is_wallet_card_added_on_empty_store() {
    let (_wallet, dispatcher) = setup(MockWallet::new());

    let result = dispatcher
        .handle("isWalletCardAdded", &json!({"serialNumber": "X"}))
        .await;
    assert_eq!(result, Ok(json!(false)));
}

#[tokio::test]
async fn test_is_wallet_card_added_propagates_store_errors() {
    let mut wallet = MockWallet::new();
    wallet.list_error = Some(WalletError::Other(anyhow::anyhow!("library unavailable")));
    let (_wallet, dispatcher) = setup(wallet);

    let err = dispatcher
        .handle("isWalletCardAdded", &json!({"serialNumber": "X"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "PLATFORM_ERROR");
}

#[tokio::test]
async fn test_availability_errors_read_as_false() {
    let mut wallet = MockWallet::new();
    wallet.availability_error = Some(WalletError::Other(anyhow::anyhow!("sdk crashed")));
    let (_wallet, dispatcher) = setup(wallet);

    let result = dispatcher.handle("isWalletAvailable", &json!({})).await;
    assert_eq!(result, Ok(json!(false)));
}

#[tokio::test]
async fn test_second_add_while_first_is_on_screen() {
    let dir = TempDir::new().unwrap();
    let a = write_pass(dir.path(), "a.pkpass", "A");
    let b = write_pass(dir.path(), "b.pkpass", "B");
    let (wallet, dispatcher) = setup(MockWallet::new());

    let first = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.handle("addWalletCard", &json!({"path": a})).await })
    };
    wait_for_presentation(&wallet, &dispatcher).await;

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": b}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "ADD_IN_PROGRESS");

    assert!(wallet.respond(UserResponse::Accept).await);
    assert_eq!(first.await.unwrap(), Ok(json!(true)));
    assert_eq!(wallet.presented().len(), 1);
    assert_eq!(dispatcher.correlator().phase(), FlowPhase::Idle);
}

#[tokio::test]
async fn test_second_add_rejected_before_loading() {
    let dir = TempDir::new().unwrap();
    let a = write_pass(dir.path(), "a.pkpass", "A");
    let stored = write_pass(dir.path(), "stored.pkpass", "STORED");
    let missing = dir.path().join("missing.pkpass");
    let (wallet, dispatcher) = setup(MockWallet::new());
    wallet.set_pass(PassHandle::new("STORED", "", "", "")).await;

    let first = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.handle("addWalletCard", &json!({"path": a})).await })
    };
    wait_for_presentation(&wallet, &dispatcher).await;

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": missing}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "ADD_IN_PROGRESS");

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": stored}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "ADD_IN_PROGRESS");

    let err = dispatcher
        .handle("addMultipleWalletCards", &json!({"paths": [missing]}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "ADD_IN_PROGRESS");

    // Non-add calls keep working while the sheet is up.
    let added = dispatcher
        .handle("isWalletCardAdded", &json!({"serialNumber": "STORED"}))
        .await;
    assert_eq!(added, Ok(json!(true)));

    assert!(wallet.respond(UserResponse::Accept).await);
    assert_eq!(first.await.unwrap(), Ok(json!(true)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let file = write_pass(dir.path(), "a.pkpass", "A");
    let (wallet, dispatcher) = setup(accepting());

    let err = dispatcher
        .handle("addWalletCard", &json!({"path": file.join("child")}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "FILE_READ_ERROR");
    assert!(err.message.contains("child"));
    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_shutdown_cancels_pending_add() {
    let dir = TempDir::new().unwrap();
    let a = write_pass(dir.path(), "a.pkpass", "A");
    let (wallet, dispatcher) = setup(MockWallet::new());

    let pending = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.handle("addWalletCard", &json!({"path": a})).await })
    };
    wait_for_presentation(&wallet, &dispatcher).await;

    dispatcher.shutdown().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err.code, "CANCELLED");
    assert!(!wallet.has_pending_presentation());
    assert_eq!(dispatcher.correlator().phase(), FlowPhase::Idle);
}

#[tokio::test]
async fn test_validate_pass() {
    let dir = TempDir::new().unwrap();
    let good = write_pass(dir.path(), "good.pkpass", "ABC123");
    let bad = dir.path().join("bad.pkpass");
    std::fs::write(&bad, b"garbage").unwrap();
    let (wallet, dispatcher) = setup(MockWallet::new());

    let result = dispatcher
        .handle("validatePass", &json!({"path": good}))
        .await
        .unwrap();
    assert_eq!(result["isValid"], json!(true));
    assert_eq!(result["serialNumber"], json!("ABC123"));
    assert_eq!(result["passTypeIdentifier"], json!("pass.com.acme.boarding"));

    let result = dispatcher
        .handle("validatePass", &json!({"path": bad}))
        .await
        .unwrap();
    assert_eq!(result["isValid"], json!(false));
    assert!(result["error"].is_string());

    let result = dispatcher
        .handle("validatePass", &json!({"path": dir.path().join("missing.pkpass")}))
        .await
        .unwrap();
    assert_eq!(result["isValid"], json!(false));

    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_get_pass_info() {
    let (wallet, dispatcher) = setup(MockWallet::new());
    wallet
        .set_pass(
            PassHandle::new("ABC123", "Acme Air", "Boarding pass", "pass.com.acme.boarding")
                .with_view_url("shoebox://card/ABC123"),
        )
        .await;

    let info = dispatcher
        .handle("getPassInfo", &json!({"serialNumber": "ABC123"}))
        .await
        .unwrap();
    assert_eq!(info["organizationName"], json!("Acme Air"));
    assert_eq!(info["viewURL"], json!("shoebox://card/ABC123"));

    let err = dispatcher
        .handle("getPassInfo", &json!({"serialNumber": "NOPE"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "PASS_NOT_FOUND");
}

#[tokio::test]
async fn test_view_wallet_card() {
    let (wallet, dispatcher) = setup(MockWallet::new());
    wallet.set_pass(PassHandle::new("ABC123", "", "", "")).await;

    let result = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": "ABC123"}))
        .await;
    assert_eq!(result, Ok(json!(true)));
    assert_eq!(wallet.opened_urls(), vec!["mock://wallet/ABC123".to_string()]);

    let err = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": "NOPE"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "PASS_NOT_FOUND");
}

#[tokio::test]
async fn test_view_wallet_card_without_url() {
    let mut wallet = MockWallet::new();
    wallet.view_urls = false;
    let (wallet, dispatcher) = setup(wallet);
    wallet.set_pass(PassHandle::new("ABC123", "", "", "")).await;

    let err = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": "ABC123"}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "NO_VIEW_URL");
    assert!(wallet.opened_urls().is_empty());
}

#[tokio::test]
async fn test_argument_errors_reach_the_host_as_payloads() {
    let (wallet, dispatcher) = setup(accepting());

    let err = dispatcher
        .handle("addWalletCard", &Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");

    let err = dispatcher
        .handle("viewWalletCardInWallet", &json!({"serialNumber": ""}))
        .await
        .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");

    let err = dispatcher.handle("scanQrCode", &json!({})).await.unwrap_err();
    assert_eq!(err.code, "NOT_IMPLEMENTED");

    assert!(wallet.presented().is_empty());
}

#[tokio::test]
async fn test_platform_version() {
    let (_wallet, dispatcher) = setup(MockWallet::new());
    let version = dispatcher.handle("getPlatformVersion", &json!({})).await;
    assert_eq!(version, Ok(json!("mock 1.0")));
}

#[tokio::test]
async fn test_from_config_uses_registered_mock() {
    let dispatcher = Dispatcher::from_config(Config::default()).unwrap();
    assert_eq!(dispatcher.backend().name(), "mock");
    assert_eq!(
        dispatcher.handle("isWalletAvailable", &json!({})).await,
        Ok(json!(true))
    );
}
