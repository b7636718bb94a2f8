//! Google Wallet save requests.
//!
//! A save request is either a signed JWT (`header.claims.signature`, each part
//! base64url) or the same claims as plain JSON. The claims' `payload` holds
//! per-vertical arrays of classes and objects. Only the payload is inspected
//! here; signatures are produced and checked by Google.

use crate::{PassHandle, Result, WalletError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

const SAVE_URL_BASE: &str = "https://pay.google.com/gp/v/save/";

const VERTICALS: &[&str] = &[
    "generic",
    "loyalty",
    "offer",
    "giftCard",
    "eventTicket",
    "flight",
    "transit",
];

/// Returns the save link for a Google Wallet object (or signed JWT).
///
/// ```
/// use walletmux::backends::google::save_link;
///
/// assert_eq!(
///     save_link("3388000000012345678.member-42"),
///     "https://pay.google.com/gp/v/save/3388000000012345678.member-42"
/// );
/// ```
pub fn save_link(object_id: &str) -> String {
    format!("{}{}", SAVE_URL_BASE, object_id)
}

/// A parsed save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SavePayload {
    /// Signed JWT, kept verbatim, with its decoded claims
    Jwt {
        /// The token as issued
        token: String,
        /// Decoded claims segment
        claims: Value,
    },
    /// Unsigned JSON: full claims or the bare payload
    Json(Value),
}

impl SavePayload {
    /// Parses pass file content into a save request.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidPassFormat`] when the content is neither a
    /// well-formed JWT nor a JSON object.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| WalletError::InvalidPassFormat("save request is not UTF-8".to_string()))?
            .trim();

        if text.starts_with('{') {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| WalletError::InvalidPassFormat(format!("invalid JSON: {}", e)))?;
            return Ok(Self::Json(value));
        }

        let segments: Vec<&str> = text.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(WalletError::InvalidPassFormat(
                "expected a JSON save request or a signed JWT".to_string(),
            ));
        }

        let decoded = URL_SAFE_NO_PAD
            .decode(segments[1].trim_end_matches('='))
            .map_err(|e| WalletError::InvalidPassFormat(format!("invalid JWT claims: {}", e)))?;
        let claims: Value = serde_json::from_slice(&decoded)
            .map_err(|e| WalletError::InvalidPassFormat(format!("invalid JWT claims: {}", e)))?;

        Ok(Self::Jwt {
            token: text.to_string(),
            claims,
        })
    }

    /// Returns the `payload` object holding classes and objects.
    fn payload(&self) -> Result<&Map<String, Value>> {
        let root = match self {
            Self::Jwt { claims, .. } => claims.get("payload").unwrap_or(&Value::Null),
            Self::Json(value) => value.get("payload").unwrap_or(value),
        };
        root.as_object().ok_or_else(|| {
            WalletError::InvalidPassFormat("save request has no payload object".to_string())
        })
    }

    /// Describes the first object in the request as a pass handle.
    ///
    /// The object id becomes the serial number and its class id the type
    /// identifier.
    pub fn describe(&self) -> Result<PassHandle> {
        let payload = self.payload()?;

        for vertical in VERTICALS {
            let objects = payload
                .get(&format!("{}Objects", vertical))
                .and_then(Value::as_array);
            let Some(object) = objects.and_then(|o| o.first()) else {
                continue;
            };

            let id = object.get("id").and_then(Value::as_str).ok_or_else(|| {
                WalletError::InvalidPassFormat(format!("{}Objects entry has no id", vertical))
            })?;
            let class_id = object.get("classId").and_then(Value::as_str).unwrap_or("");
            let class = payload
                .get(&format!("{}Classes", vertical))
                .and_then(Value::as_array)
                .and_then(|classes| {
                    classes
                        .iter()
                        .find(|c| c.get("id").and_then(Value::as_str) == Some(class_id))
                });

            let organization = class
                .and_then(|c| c.get("issuerName"))
                .and_then(Value::as_str)
                .or_else(|| localized(&object["cardTitle"]))
                .unwrap_or("");
            let description = localized(&object["header"])
                .or_else(|| class.and_then(|c| c.get("programName")).and_then(Value::as_str))
                .or_else(|| class.and_then(|c| localized(&c["eventName"])))
                .unwrap_or("");

            return Ok(PassHandle::new(id, organization, description, class_id)
                .with_view_url(save_link(id)));
        }

        Err(WalletError::InvalidPassFormat(
            "save request contains no wallet objects".to_string(),
        ))
    }

    /// Combines several JSON save requests into one.
    ///
    /// Class and object arrays are concatenated; the claims wrapper of the
    /// first request is kept.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::CannotPresent`] if any request is a signed JWT,
    /// since its signature covers exactly its own payload.
    pub fn merge(requests: &[SavePayload]) -> Result<SavePayload> {
        let mut merged = Map::new();
        for request in requests {
            if matches!(request, Self::Jwt { .. }) {
                return Err(WalletError::CannotPresent(
                    "signed JWT save requests cannot be combined".to_string(),
                ));
            }
            for (key, value) in request.payload()? {
                match (merged.get_mut(key), value) {
                    (Some(Value::Array(existing)), Value::Array(items)) => {
                        existing.extend(items.iter().cloned())
                    }
                    (None, _) => {
                        merged.insert(key.clone(), value.clone());
                    }
                    _ => {}
                }
            }
        }

        let combined = match requests.first() {
            Some(Self::Json(first)) if first.get("payload").is_some() => {
                let mut claims = first.clone();
                claims["payload"] = Value::Object(merged);
                claims
            }
            _ => Value::Object(merged),
        };
        Ok(Self::Json(combined))
    }

    /// Returns the intent extra carrying this request (`jwt` or `json`).
    pub fn intent_extra(&self) -> (&'static str, String) {
        match self {
            Self::Jwt { token, .. } => ("jwt", token.clone()),
            Self::Json(value) => ("json", value.to_string()),
        }
    }
}

fn localized(value: &Value) -> Option<&str> {
    value
        .get("defaultValue")
        .and_then(|d| d.get("value"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loyalty_request(object_id: &str) -> Value {
        json!({
            "iss": "issuer@example.iam.gserviceaccount.com",
            "aud": "google",
            "typ": "savetowallet",
            "payload": {
                "loyaltyClasses": [{
                    "id": "3388.rewards",
                    "issuerName": "Acme Coffee",
                    "programName": "Acme Rewards"
                }],
                "loyaltyObjects": [{
                    "id": object_id,
                    "classId": "3388.rewards",
                    "state": "ACTIVE"
                }]
            }
        })
    }

    fn jwt_for(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.c2lnbmF0dXJl", header, body)
    }

    #[test]
    fn test_describe_json_claims() {
        let bytes = loyalty_request("3388.member-42").to_string();
        let pass = SavePayload::parse(bytes.as_bytes()).unwrap().describe().unwrap();

        assert_eq!(pass.serial_number, "3388.member-42");
        assert_eq!(pass.type_identifier, "3388.rewards");
        assert_eq!(pass.organization_name, "Acme Coffee");
        assert_eq!(pass.description, "Acme Rewards");
        assert_eq!(
            pass.view_url.as_deref(),
            Some("https://pay.google.com/gp/v/save/3388.member-42")
        );
    }

    #[test]
    fn test_describe_bare_generic_payload() {
        let bytes = json!({
            "genericObjects": [{
                "id": "3388.badge-7",
                "classId": "3388.badge",
                "cardTitle": {"defaultValue": {"language": "en", "value": "Acme Corp"}},
                "header": {"defaultValue": {"language": "en", "value": "Visitor badge"}}
            }]
        })
        .to_string();
        let pass = SavePayload::parse(bytes.as_bytes()).unwrap().describe().unwrap();

        assert_eq!(pass.serial_number, "3388.badge-7");
        assert_eq!(pass.organization_name, "Acme Corp");
        assert_eq!(pass.description, "Visitor badge");
    }

    #[test]
    fn test_parse_jwt() {
        let token = jwt_for(&loyalty_request("3388.member-1"));
        let request = SavePayload::parse(token.as_bytes()).unwrap();

        assert!(matches!(request, SavePayload::Jwt { .. }));
        assert_eq!(request.describe().unwrap().serial_number, "3388.member-1");
        assert_eq!(request.intent_extra(), ("jwt", token));
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in [&b"hello"[..], b"a.b", b"{not json", b"a.!!!.c", b"\xff\xfe"] {
            assert!(
                matches!(SavePayload::parse(bad), Err(WalletError::InvalidPassFormat(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_request_without_objects_is_invalid() {
        let request = SavePayload::parse(br#"{"payload": {"loyaltyClasses": []}}"#).unwrap();
        assert!(matches!(
            request.describe(),
            Err(WalletError::InvalidPassFormat(_))
        ));

        let request = SavePayload::parse(br#"{"genericObjects": [{"classId": "c"}]}"#).unwrap();
        let err = request.describe().unwrap_err();
        assert!(err.to_string().contains("no id"));
    }

    #[test]
    fn test_merge_concatenates_objects() {
        let a = SavePayload::Json(loyalty_request("3388.a"));
        let b = SavePayload::Json(loyalty_request("3388.b"));

        let merged = SavePayload::merge(&[a, b]).unwrap();
        let SavePayload::Json(value) = &merged else {
            panic!("merge should produce JSON");
        };
        assert_eq!(value["typ"], "savetowallet");
        assert_eq!(value["payload"]["loyaltyObjects"].as_array().unwrap().len(), 2);
        assert_eq!(merged.describe().unwrap().serial_number, "3388.a");
    }

    #[test]
    fn test_merge_refuses_jwt() {
        let token = jwt_for(&loyalty_request("3388.a"));
        let jwt = SavePayload::parse(token.as_bytes()).unwrap();
        let json = SavePayload::Json(loyalty_request("3388.b"));

        assert!(matches!(
            SavePayload::merge(&[json, jwt]),
            Err(WalletError::CannotPresent(_))
        ));
    }
}
