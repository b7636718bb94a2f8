//! Validation of arguments arriving from the host.

use crate::{Result, WalletError};
use reqwest::Url;

/// Maximum allowed length for serial numbers and object ids.
const MAX_SERIAL_LENGTH: usize = 255;

/// Validates a pass serial number (or Google Wallet object id).
///
/// Rejects empty values, values longer than 255 characters and values
/// containing control characters.
///
/// # Example
///
/// ```
/// use walletmux::validation::validate_serial_number;
///
/// assert!(validate_serial_number("ABC123").is_ok());
/// assert!(validate_serial_number("3388000000012345678.member-42").is_ok());
///
/// assert!(validate_serial_number("").is_err());
/// assert!(validate_serial_number("abc\u{0}def").is_err());
/// ```
pub fn validate_serial_number(serial: &str) -> Result<()> {
    if serial.is_empty() {
        return Err(WalletError::InvalidArgument(
            "serial number cannot be empty".to_string(),
        ));
    }

    if serial.len() > MAX_SERIAL_LENGTH {
        return Err(WalletError::InvalidArgument(format!(
            "serial number exceeds maximum length of {} characters",
            MAX_SERIAL_LENGTH
        )));
    }

    if serial.chars().any(|c| c.is_control()) {
        return Err(WalletError::InvalidArgument(
            "serial number contains control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a local pass file path.
pub fn validate_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(WalletError::InvalidArgument(
            "path cannot be empty".to_string(),
        ));
    }

    if path.contains('\0') {
        return Err(WalletError::InvalidArgument(
            "path contains null byte".to_string(),
        ));
    }

    Ok(())
}

/// Validates and parses a pass download URL.
///
/// Only `http` and `https` URLs are accepted.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| WalletError::InvalidArgument(format!("invalid url {}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(WalletError::InvalidArgument(format!(
            "unsupported url scheme: {}",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_serials() {
        assert!(validate_serial_number("ABC123").is_ok());
        assert!(validate_serial_number("issuer.object-id_1").is_ok());
        assert!(validate_serial_number("E5982H-I2").is_ok());
    }

    #[test]
    fn test_empty_serial() {
        let result = validate_serial_number("");
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_serial_too_long() {
        let long = "a".repeat(256);
        let result = validate_serial_number(&long);
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_serial_control_characters() {
        let result = validate_serial_number("abc\ndef");
        assert!(result.unwrap_err().to_string().contains("control"));
    }

    #[test]
    fn test_paths() {
        assert!(validate_path("/var/mobile/boarding.pkpass").is_ok());
        assert!(validate_path("  ").is_err());
        assert!(validate_path("a\0b").is_err());
    }

    #[test]
    fn test_urls() {
        assert!(validate_url("https://example.com/pass.pkpass").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/p").is_ok());

        let err = validate_url("ftp://example.com/p").unwrap_err();
        assert!(err.to_string().contains("unsupported url scheme"));

        assert!(matches!(
            validate_url("not a url"),
            Err(WalletError::InvalidArgument(_))
        ));
    }
}
