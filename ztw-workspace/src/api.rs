//! The remote workspace API collaborator.

use crate::memory::InMemoryWorkspace;
use crate::rest::RestWorkspace;
use crate::types::{ParamMap, ResourceKind, ResourceRecord, ResourceScope};
use std::path::PathBuf;
use ztw_core::{Result, ZtwError};
use ztw_overlay::OverlayContext;

/// The interface the reconciliation core needs from a workspace.
///
/// Network and auth concerns live behind this trait. `list` is restartable:
/// every call re-queries current remote state. Remote calls carry a bounded
/// timeout owned by the implementation.
pub trait WorkspaceApi: std::fmt::Debug {
    /// Backend name (e.g. "rest", "memory").
    fn name(&self) -> &'static str;

    /// User name of the authenticated principal.
    fn current_user(&self) -> Result<String>;

    /// Current set of records of `kind` within `scope`.
    fn list(&self, kind: ResourceKind, scope: &ResourceScope) -> Result<Vec<ResourceRecord>>;

    /// Create a resource of `kind` in `scope` from `params`.
    fn create(
        &self,
        kind: ResourceKind,
        scope: &ResourceScope,
        params: &ParamMap,
    ) -> Result<ResourceRecord>;

    /// Move local bytes to a remote path.
    fn upload(&self, remote_path: &str, bytes: &[u8], overwrite: bool) -> Result<()>;
}

/// Backend selection and connection settings, threaded explicitly from the
/// CLI rather than read from ambient process state.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub backend: String,
    pub profile: String,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub state_file: Option<PathBuf>,
}

/// Creates a workspace backend based on the configuration.
///
/// When an overlay context is supplied, the backend routes its traffic
/// through the session's tunnel; with `None` it uses the direct path.
pub fn get_workspace(
    config: &WorkspaceConfig,
    overlay: Option<&OverlayContext<'_>>,
) -> Result<Box<dyn WorkspaceApi>> {
    match config.backend.as_str() {
        "rest" => Ok(Box::new(RestWorkspace::new(config, overlay)?)),
        "memory" => Ok(Box::new(InMemoryWorkspace::from_config(config)?)),
        other => Err(ZtwError::Config(format!(
            "Unknown workspace backend: {other}"
        ))),
    }
}
