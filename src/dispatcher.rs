//! Named-call dispatch for host applications.
//!
//! Hosts hand over a method name and an untyped argument map. The map is
//! checked against the schema of that method and turned into a [`Request`]
//! before any file, network or wallet work starts.
//!
//! | Method | Arguments | Result |
//! |---|---|---|
//! | `isWalletAvailable` | - | bool |
//! | `getPlatformVersion` | - | string |
//! | `addWalletCard` | `path` | bool |
//! | `addWalletCardFromUrl` | `url` | bool |
//! | `addMultipleWalletCards` | `paths` | bool |
//! | `saveWalletPassWithJwt` | `jwt` | bool |
//! | `isWalletCardAdded` | `serialNumber` | bool |
//! | `viewWalletCardInWallet` | `serialNumber` | bool |
//! | `validatePass` | `path` | `{isValid, ...}` |
//! | `getPassInfo` | `serialNumber` | pass metadata |
//! | `createWalletPassLink` | `objectId` | string |
//!
//! Earlier plugin method names (`isGoogleWalletAvailable`,
//! `addGoogleWalletCard`, `didAddedToTheWallet`, ...) are accepted as aliases.

use crate::correlator::{AddFlowCorrelator, FlowPhase};
use crate::loader::PassLoader;
use crate::validation::{validate_path, validate_serial_number, validate_url};
use crate::{factory, Config, ErrorPayload, PassHandle, Result, WalletBackend, WalletError};
use serde_json::{json, Value};
use std::sync::Arc;

/// A validated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Can passes be added on this device?
    IsWalletAvailable,
    /// Platform version string
    GetPlatformVersion,
    /// Add the pass file at `path`
    AddWalletCard {
        /// Local pass file
        path: String,
    },
    /// Download and add the pass at `url`
    AddWalletCardFromUrl {
        /// http(s) URL
        url: String,
    },
    /// Add every pass file in one UI
    AddMultipleWalletCards {
        /// Local pass files
        paths: Vec<String>,
    },
    /// Add a pass from a signed save JWT
    SavePassWithJwt {
        /// The token
        jwt: String,
    },
    /// Is a pass with this serial number stored?
    IsWalletCardAdded {
        /// Serial number or object id
        serial_number: String,
    },
    /// Open a stored pass in the wallet
    ViewWalletCardInWallet {
        /// Serial number or object id
        serial_number: String,
    },
    /// Check that a pass file parses, and describe it
    ValidatePass {
        /// Local pass file
        path: String,
    },
    /// Metadata of a stored pass
    GetPassInfo {
        /// Serial number or object id
        serial_number: String,
    },
    /// Google Wallet save link for an object
    CreatePassLink {
        /// Object id
        object_id: String,
    },
}

impl Request {
    /// Validates `args` against the schema of `method`.
    ///
    /// # Errors
    ///
    /// - [`WalletError::NotImplemented`]: unknown method
    /// - [`WalletError::InvalidArgument`]: missing or mistyped argument
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use walletmux::dispatcher::Request;
    ///
    /// let request = Request::parse("addWalletCard", &json!({"path": "/tmp/a.pkpass"})).unwrap();
    /// assert_eq!(request, Request::AddWalletCard { path: "/tmp/a.pkpass".to_string() });
    ///
    /// assert!(Request::parse("addWalletCard", &json!({})).is_err());
    /// ```
    pub fn parse(method: &str, args: &Value) -> Result<Self> {
        let request = match method {
            "isWalletAvailable" | "isGoogleWalletAvailable" => Self::IsWalletAvailable,
            "getPlatformVersion" => Self::GetPlatformVersion,
            "addWalletCard" | "addGoogleWalletCard" => Self::AddWalletCard {
                path: required_path(args, "path")?,
            },
            "addWalletCardFromUrl" => {
                let url = required_str(args, "url")?;
                validate_url(&url)?;
                Self::AddWalletCardFromUrl { url }
            }
            "addMultipleWalletCards" => {
                let paths = required_str_list(args, "paths")?;
                if paths.is_empty() {
                    return Err(WalletError::InvalidArgument(
                        "paths cannot be empty".to_string(),
                    ));
                }
                for path in &paths {
                    validate_path(path)?;
                }
                Self::AddMultipleWalletCards { paths }
            }
            "saveWalletPassWithJwt" | "saveGoogleWalletPassWithJwt" => {
                let jwt = required_str(args, "jwt")?;
                if jwt.trim().is_empty() {
                    return Err(WalletError::InvalidArgument("jwt cannot be empty".to_string()));
                }
                Self::SavePassWithJwt { jwt }
            }
            "isWalletCardAdded" | "didAddedToTheWallet" => Self::IsWalletCardAdded {
                serial_number: required_serial(args, "serialNumber")?,
            },
            "isGoogleWalletCardAdded" => Self::IsWalletCardAdded {
                serial_number: required_serial(args, "objectId")?,
            },
            "viewWalletCardInWallet" => Self::ViewWalletCardInWallet {
                serial_number: required_serial(args, "serialNumber")?,
            },
            "viewGoogleWalletCard" => Self::ViewWalletCardInWallet {
                serial_number: required_serial(args, "objectId")?,
            },
            "validatePass" => Self::ValidatePass {
                path: required_path(args, "path")?,
            },
            "getPassInfo" => Self::GetPassInfo {
                serial_number: required_serial(args, "serialNumber")?,
            },
            "createWalletPassLink" | "createGoogleWalletPassLink" => Self::CreatePassLink {
                object_id: required_serial(args, "objectId")?,
            },
            other => return Err(WalletError::NotImplemented(other.to_string())),
        };
        Ok(request)
    }

    /// Whether this request starts an add-flow.
    pub fn is_add(&self) -> bool {
        matches!(
            self,
            Self::AddWalletCard { .. }
                | Self::AddWalletCardFromUrl { .. }
                | Self::AddMultipleWalletCards { .. }
                | Self::SavePassWithJwt { .. }
        )
    }

    /// Canonical method name of this request.
    pub fn method(&self) -> &'static str {
        match self {
            Self::IsWalletAvailable => "isWalletAvailable",
            Self::GetPlatformVersion => "getPlatformVersion",
            Self::AddWalletCard { .. } => "addWalletCard",
            Self::AddWalletCardFromUrl { .. } => "addWalletCardFromUrl",
            Self::AddMultipleWalletCards { .. } => "addMultipleWalletCards",
            Self::SavePassWithJwt { .. } => "saveWalletPassWithJwt",
            Self::IsWalletCardAdded { .. } => "isWalletCardAdded",
            Self::ViewWalletCardInWallet { .. } => "viewWalletCardInWallet",
            Self::ValidatePass { .. } => "validatePass",
            Self::GetPassInfo { .. } => "getPassInfo",
            Self::CreatePassLink { .. } => "createWalletPassLink",
        }
    }
}

fn required_str(args: &Value, key: &str) -> Result<String> {
    match args.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Null) | None => Err(WalletError::InvalidArgument(format!("{} is required", key))),
        Some(_) => Err(WalletError::InvalidArgument(format!("{} must be a string", key))),
    }
}

fn required_path(args: &Value, key: &str) -> Result<String> {
    let path = required_str(args, key)?;
    validate_path(&path)?;
    Ok(path)
}

fn required_serial(args: &Value, key: &str) -> Result<String> {
    let serial = required_str(args, key)?;
    validate_serial_number(&serial)?;
    Ok(serial)
}

fn required_str_list(args: &Value, key: &str) -> Result<Vec<String>> {
    let items = match args.get(key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => {
            return Err(WalletError::InvalidArgument(format!("{} is required", key)))
        }
        Some(_) => {
            return Err(WalletError::InvalidArgument(format!(
                "{} must be a list of strings",
                key
            )))
        }
    };

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                WalletError::InvalidArgument(format!("{} must be a list of strings", key))
            })
        })
        .collect()
}

/// Routes named calls to the loader, backend and add-flow correlator.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use walletmux::backends::mock::MockWallet;
/// use walletmux::dispatcher::Dispatcher;
/// use walletmux::Config;
///
/// #[tokio::main]
/// async fn main() {
///     let dispatcher = Dispatcher::new(Arc::new(MockWallet::new()), &Config::default()).unwrap();
///
///     let available = dispatcher.handle("isWalletAvailable", &json!({})).await;
///     assert_eq!(available, Ok(json!(true)));
///
///     let err = dispatcher.handle("isWalletCardAdded", &json!({})).await.unwrap_err();
///     assert_eq!(err.code, "INVALID_ARGUMENT");
/// }
/// ```
pub struct Dispatcher {
    backend: Arc<dyn WalletBackend>,
    loader: PassLoader,
    correlator: AddFlowCorrelator,
}

impl Dispatcher {
    /// Creates a dispatcher over an existing backend.
    pub fn new(backend: Arc<dyn WalletBackend>, config: &Config) -> Result<Self> {
        Ok(Self {
            backend,
            loader: PassLoader::new(config)?,
            correlator: AddFlowCorrelator::new(),
        })
    }

    /// Creates a dispatcher over the backend registered for `config.platform`.
    pub fn from_config(config: Config) -> Result<Self> {
        crate::init();
        let loader = PassLoader::new(&config)?;
        let backend: Arc<dyn WalletBackend> = Arc::from(factory::new_backend(config)?);
        Ok(Self {
            backend,
            loader,
            correlator: AddFlowCorrelator::new(),
        })
    }

    /// Returns the backend in use.
    pub fn backend(&self) -> &dyn WalletBackend {
        &*self.backend
    }

    /// Returns the add-flow correlator.
    pub fn correlator(&self) -> &AddFlowCorrelator {
        &self.correlator
    }

    /// Handles a named call and shapes the outcome for the host.
    #[tracing::instrument(skip(self, args))]
    pub async fn handle(
        &self,
        method: &str,
        args: &Value,
    ) -> std::result::Result<Value, ErrorPayload> {
        let result = match Request::parse(method, args) {
            Ok(request) => self.execute(request).await,
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            tracing::debug!(code = err.code(), error = %err, "call failed");
            err.to_payload()
        })
    }

    /// Executes a validated request.
    ///
    /// Add requests are rejected with [`WalletError::AddInProgress`] before
    /// any file or network work while another add-flow is in flight.
    pub async fn execute(&self, request: Request) -> Result<Value> {
        if request.is_add() {
            self.ensure_no_add_in_flight()?;
        }

        match request {
            Request::IsWalletAvailable => Ok(Value::Bool(self.backend.is_available().await)),
            Request::GetPlatformVersion => Ok(Value::String(self.backend.platform_version().await)),
            Request::AddWalletCard { path } => {
                let artifact = self.loader.load_from_path(&path).await?;
                self.add_one(artifact.bytes()).await.map(Value::Bool)
            }
            Request::AddWalletCardFromUrl { url } => {
                let artifact = self.loader.load_from_url(&url).await?;
                self.add_one(artifact.bytes()).await.map(Value::Bool)
            }
            Request::AddMultipleWalletCards { paths } => {
                let artifacts = self.loader.load_multiple(&paths[..]).await?;
                let mut passes = Vec::with_capacity(artifacts.len());
                for artifact in &artifacts {
                    passes.push(self.backend.parse_pass(artifact.bytes()).await?);
                }
                self.correlator
                    .run(&*self.backend, &passes)
                    .await
                    .map(Value::Bool)
            }
            Request::SavePassWithJwt { jwt } => self.add_one(jwt.as_bytes()).await.map(Value::Bool),
            Request::IsWalletCardAdded { serial_number } => {
                let found = self.find_pass(&serial_number).await?;
                Ok(Value::Bool(found.is_some()))
            }
            Request::ViewWalletCardInWallet { serial_number } => {
                let pass = self
                    .find_pass(&serial_number)
                    .await?
                    .ok_or_else(|| WalletError::PassNotFound(serial_number.clone()))?;
                let url = self
                    .backend
                    .resolve_view_url(&pass)
                    .ok_or(WalletError::NoViewUrl(serial_number))?;
                self.backend.open_url(&url).await.map(Value::Bool)
            }
            Request::ValidatePass { path } => Ok(self.validate_pass(&path).await),
            Request::GetPassInfo { serial_number } => {
                let pass = self
                    .find_pass(&serial_number)
                    .await?
                    .ok_or_else(|| WalletError::PassNotFound(serial_number.clone()))?;
                Ok(self.pass_info(&pass))
            }
            Request::CreatePassLink { object_id } => create_pass_link(&object_id),
        }
    }

    /// Routes a platform result callback (Android activity result).
    pub fn on_activity_result(&self, request_code: i32, result_code: i32) -> bool {
        self.backend.on_platform_result(request_code, result_code)
    }

    /// Tears down: a pending add is answered with `Cancelled`.
    pub async fn shutdown(&self) -> Result<()> {
        if self.correlator.cancel_pending() {
            tracing::info!("pending add-pass flow cancelled on shutdown");
        }
        self.backend.close().await
    }

    fn ensure_no_add_in_flight(&self) -> Result<()> {
        match self.correlator.phase() {
            FlowPhase::Idle => Ok(()),
            phase => {
                tracing::warn!(?phase, "rejecting add request while another is in flight");
                Err(WalletError::AddInProgress)
            }
        }
    }

    async fn add_one(&self, bytes: &[u8]) -> Result<bool> {
        let pass = self.backend.parse_pass(bytes).await?;
        if self.backend.contains_pass(&pass).await? {
            return Err(WalletError::PassAlreadyExists(pass.serial_number));
        }
        self.correlator.run(&*self.backend, &[pass]).await
    }

    async fn find_pass(&self, serial_number: &str) -> Result<Option<PassHandle>> {
        let passes = self.backend.list_passes().await?;
        Ok(passes
            .into_iter()
            .find(|pass| pass.serial_number == serial_number))
    }

    async fn validate_pass(&self, path: &str) -> Value {
        let parsed = match self.loader.load_from_path(path).await {
            Ok(artifact) => self.backend.parse_pass(artifact.bytes()).await,
            Err(err) => Err(err),
        };

        match parsed {
            Ok(pass) => json!({
                "isValid": true,
                "serialNumber": pass.serial_number,
                "organizationName": pass.organization_name,
                "description": pass.description,
                "passTypeIdentifier": pass.type_identifier,
            }),
            Err(err) => json!({
                "isValid": false,
                "error": err.to_string(),
            }),
        }
    }

    fn pass_info(&self, pass: &PassHandle) -> Value {
        let mut info = json!({
            "serialNumber": pass.serial_number,
            "organizationName": pass.organization_name,
            "description": pass.description,
            "passTypeIdentifier": pass.type_identifier,
        });
        if let Some(url) = self.backend.resolve_view_url(pass) {
            info["viewURL"] = Value::String(url);
        }
        info
    }
}

#[cfg(feature = "google")]
fn create_pass_link(object_id: &str) -> Result<Value> {
    Ok(Value::String(crate::backends::google::save_link(object_id)))
}

#[cfg(not(feature = "google"))]
fn create_pass_link(_object_id: &str) -> Result<Value> {
    Err(WalletError::NotImplemented("createWalletPassLink".to_string()))
}
