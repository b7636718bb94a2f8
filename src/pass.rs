//! Pass data structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// A reference to a pass known to the platform wallet.
///
/// Handles come from two places: a backend parsing pass bytes (the handle then
/// carries those bytes in `data` so the platform can present them), or a
/// backend listing the wallet store. This crate never creates or deletes
/// stored passes itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassHandle {
    /// Platform-assigned unique identifier
    pub serial_number: String,

    /// Issuing organization
    pub organization_name: String,

    /// Short description shown by the wallet
    pub description: String,

    /// Pass type identifier (PassKit) or class id (Google Wallet)
    pub type_identifier: String,

    /// Persistent URL opening the pass in the wallet, when the platform has one
    #[serde(rename = "viewURL", skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,

    /// Raw pass content handed to the platform when presenting
    #[serde(skip)]
    pub data: Option<Arc<[u8]>>,
}

impl PassHandle {
    /// Creates a handle with the given metadata.
    ///
    /// # Example
    ///
    /// ```
    /// use walletmux::PassHandle;
    ///
    /// let pass = PassHandle::new("ABC123", "Acme Air", "Boarding pass", "pass.com.acme.boarding")
    ///     .with_view_url("shoebox://card/ABC123");
    /// assert_eq!(pass.serial_number, "ABC123");
    /// assert!(pass.view_url.is_some());
    /// ```
    pub fn new(
        serial_number: impl Into<String>,
        organization_name: impl Into<String>,
        description: impl Into<String>,
        type_identifier: impl Into<String>,
    ) -> Self {
        Self {
            serial_number: serial_number.into(),
            organization_name: organization_name.into(),
            description: description.into(),
            type_identifier: type_identifier.into(),
            view_url: None,
            data: None,
        }
    }

    /// Attaches a view URL.
    pub fn with_view_url(mut self, url: impl Into<String>) -> Self {
        self.view_url = Some(url.into());
        self
    }

    /// Attaches the raw pass content.
    pub fn with_data(mut self, data: impl Into<Arc<[u8]>>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Where a pass artifact was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOrigin {
    /// Local file system path
    LocalPath(PathBuf),
    /// Remote URL
    Url(String),
}

impl std::fmt::Display for PassOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Pass bytes as loaded, before any platform has looked at them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassArtifact {
    bytes: Arc<[u8]>,
    origin: PassOrigin,
}

impl PassArtifact {
    /// Wraps loaded bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>, origin: PassOrigin) -> Self {
        Self {
            bytes: bytes.into(),
            origin,
        }
    }

    /// Returns the pass content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns where the content came from.
    pub fn origin(&self) -> &PassOrigin {
        &self.origin
    }
}
