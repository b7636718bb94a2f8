//! Environment-based configuration example.
//!
//! Run with: cargo run --example environment_config
//!
//! Environment variables:
//! - WALLETMUX_PLATFORM: mock, passkit, google
//! - WALLETMUX_DOWNLOAD_TIMEOUT_SECS: pass download timeout
//! - WALLETMUX_GOOGLE_ENVIRONMENT: production or test
//! - RUST_LOG: log filter

use serde_json::json;
use walletmux::dispatcher::Dispatcher;
use walletmux::logging::{init_logging, LogConfig, LogFormat};
use walletmux::Config;

#[tokio::main]
async fn main() -> walletmux::Result<()> {
    init_logging(&LogConfig {
        level: "debug".to_string(),
        format: LogFormat::Json,
    });

    let config = Config::from_env()?;
    println!("Platform:           {}", config.platform);
    println!("Download timeout:   {:?}", config.download_timeout);
    println!("User agent:         {}", config.user_agent);
    println!("Google environment: {}", config.google_environment);
    println!("Save request code:  {}", config.request_code);

    // PassKit and Google Wallet need a host bridge; only the mock
    // registers itself.
    match Dispatcher::from_config(config) {
        Ok(dispatcher) => {
            let version = dispatcher.handle("getPlatformVersion", &json!({})).await;
            let available = dispatcher.handle("isWalletAvailable", &json!({})).await;
            println!("\nVersion: {:?}\nAvailable: {:?}", version, available);
        }
        Err(e) => println!("\nNo backend: {}", e),
    }

    Ok(())
}
