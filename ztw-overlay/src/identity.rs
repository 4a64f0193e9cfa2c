//! Overlay identity (enrollment) files.
//!
//! An identity file is the JSON document produced by overlay enrollment:
//! the controller endpoint plus the client certificate material. A missing or
//! malformed file is fatal — the workflow must not fall back to the
//! unprotected network path.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use url::Url;
use ztw_core::{Result, ZtwError};

/// Default local tunneler proxy endpoint used when the identity file does not
/// name one explicitly.
pub const DEFAULT_TUNNELER_PROXY: &str = "http://127.0.0.1:12080";

/// Client certificate material embedded in an identity file.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityMaterial {
    pub cert: String,
    pub key: String,
    #[serde(default)]
    pub ca: Option<String>,
}

/// A loaded overlay identity.
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayIdentity {
    /// Controller API endpoint for this identity.
    #[serde(rename = "ztAPI")]
    pub controller: String,
    /// Certificate material authenticating this identity.
    pub id: IdentityMaterial,
    /// Local tunneler proxy endpoint, when not running at the default address.
    #[serde(rename = "ztProxy", default)]
    pub proxy: Option<String>,
}

impl OverlayIdentity {
    /// Load and validate an identity file.
    ///
    /// Fails with [`ZtwError::IdentityLoad`] when the file is missing,
    /// unreadable, not valid JSON, or missing required material.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ZtwError::IdentityLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let identity: OverlayIdentity = serde_json::from_str(&raw).map_err(|e| {
            ZtwError::IdentityLoad(format!("invalid identity file {}: {}", path.display(), e))
        })?;
        identity.validate()?;
        debug!(controller = %identity.controller, "loaded overlay identity");
        Ok(identity)
    }

    fn validate(&self) -> Result<()> {
        if self.controller.is_empty() {
            return Err(ZtwError::IdentityLoad(
                "identity file has no controller endpoint (ztAPI)".to_string(),
            ));
        }
        Url::parse(&self.controller).map_err(|e| {
            ZtwError::IdentityLoad(format!("bad controller endpoint {}: {}", self.controller, e))
        })?;
        if self.id.cert.is_empty() || self.id.key.is_empty() {
            return Err(ZtwError::IdentityLoad(
                "identity file is missing certificate material".to_string(),
            ));
        }
        if let Some(proxy) = &self.proxy {
            Url::parse(proxy).map_err(|e| {
                ZtwError::IdentityLoad(format!("bad tunneler proxy {}: {}", proxy, e))
            })?;
        }
        Ok(())
    }

    /// The local tunneler proxy endpoint overlay-routed clients should use.
    pub fn proxy_url(&self) -> &str {
        self.proxy.as_deref().unwrap_or(DEFAULT_TUNNELER_PROXY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_identity(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp identity file");
        file.write_all(contents.as_bytes()).expect("write identity");
        file
    }

    #[test]
    fn test_load_valid_identity() {
        let file = write_identity(
            r#"{
                "ztAPI": "https://ctrl.example.com:1280",
                "id": { "cert": "pem:CERT", "key": "pem:KEY", "ca": "pem:CA" }
            }"#,
        );
        let identity = OverlayIdentity::load(file.path()).expect("should load");
        assert_eq!(identity.controller, "https://ctrl.example.com:1280");
        assert_eq!(identity.proxy_url(), DEFAULT_TUNNELER_PROXY);
    }

    #[test]
    fn test_load_identity_with_proxy_override() {
        let file = write_identity(
            r#"{
                "ztAPI": "https://ctrl.example.com:1280",
                "ztProxy": "http://127.0.0.1:19099",
                "id": { "cert": "pem:CERT", "key": "pem:KEY" }
            }"#,
        );
        let identity = OverlayIdentity::load(file.path()).expect("should load");
        assert_eq!(identity.proxy_url(), "http://127.0.0.1:19099");
    }

    #[test]
    fn test_missing_file_is_identity_load_error() {
        let err = OverlayIdentity::load(Path::new("/nonexistent/identity.json")).unwrap_err();
        assert!(matches!(err, ZtwError::IdentityLoad(_)));
    }

    #[test]
    fn test_invalid_json_is_identity_load_error() {
        let file = write_identity("not json at all");
        let err = OverlayIdentity::load(file.path()).unwrap_err();
        assert!(matches!(err, ZtwError::IdentityLoad(_)));
    }

    #[test]
    fn test_missing_cert_material_rejected() {
        let file = write_identity(
            r#"{
                "ztAPI": "https://ctrl.example.com:1280",
                "id": { "cert": "", "key": "pem:KEY" }
            }"#,
        );
        let err = OverlayIdentity::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("certificate material"));
    }

    #[test]
    fn test_bad_controller_url_rejected() {
        let file = write_identity(
            r#"{
                "ztAPI": "not a url",
                "id": { "cert": "pem:CERT", "key": "pem:KEY" }
            }"#,
        );
        let err = OverlayIdentity::load(file.path()).unwrap_err();
        assert!(matches!(err, ZtwError::IdentityLoad(_)));
    }
}
