pub use anyhow::bail;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZtwError {
    IdentityLoad(String),
    Session(String),
    RemoteList(String),
    RemoteCreate(String),
    Upload(String),
    Config(String),
    Serialization(String),
    Io(#[from] std::io::Error),
    Other(#[from] anyhow::Error),
}

impl Display for ZtwError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ZtwError::IdentityLoad(s) => write!(f, "Identity load error: {}", s),
            ZtwError::Session(s) => write!(f, "Overlay session error: {}", s),
            ZtwError::RemoteList(s) => write!(f, "Remote listing failed: {}", s),
            ZtwError::RemoteCreate(s) => write!(f, "Remote create failed: {}", s),
            ZtwError::Upload(s) => write!(f, "Upload failed: {}", s),
            ZtwError::Config(s) => write!(f, "Configuration error: {}", s),
            ZtwError::Serialization(s) => write!(f, "Serialization error: {}", s),
            ZtwError::Io(e) => write!(f, "I/O error: {}", e),
            ZtwError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl From<serde_json::Error> for ZtwError {
    fn from(err: serde_json::Error) -> Self {
        ZtwError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ZtwError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = ZtwError::RemoteCreate("volume datafiles rejected".into());
        assert_eq!(
            err.to_string(),
            "Remote create failed: volume datafiles rejected"
        );
    }

    #[test]
    fn test_json_errors_map_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ZtwError = json_err.into();
        assert!(matches!(err, ZtwError::Serialization(_)));
    }
}
