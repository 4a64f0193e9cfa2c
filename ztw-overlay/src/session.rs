//! Scoped overlay sessions.
//!
//! [`OverlaySession::scope`] runs a body with the tunnel active. The session
//! is consumed by the scope, so the borrow checker guarantees the
//! [`OverlayContext`] handle cannot outlive the tunnel, and `Drop` guarantees
//! teardown runs exactly once on every exit path.

use crate::identity::OverlayIdentity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use ztw_core::Result;

/// An open overlay session. Exclusive owner of the active tunnel.
#[derive(Debug)]
pub struct OverlaySession {
    identity: OverlayIdentity,
    proxy_url: String,
    teardown_probe: Option<Arc<AtomicUsize>>,
}

/// Capability handle passed to collaborators that must route their traffic
/// through the overlay. Borrowed from the session, so it is unusable once the
/// session scope has ended.
#[derive(Debug, Clone, Copy)]
pub struct OverlayContext<'s> {
    session: &'s OverlaySession,
}

impl OverlaySession {
    /// Open a session for the given identity. The tunnel is considered active
    /// from here until the session is dropped.
    pub fn open(identity: OverlayIdentity) -> Result<Self> {
        let proxy_url = identity.proxy_url().to_string();
        info!(controller = %identity.controller, proxy = %proxy_url, "overlay session open");
        Ok(Self {
            identity,
            proxy_url,
            teardown_probe: None,
        })
    }

    /// Register a counter incremented once when the session is torn down.
    pub fn with_teardown_probe(mut self, probe: Arc<AtomicUsize>) -> Self {
        self.teardown_probe = Some(probe);
        self
    }

    /// Run `body` with the tunnel active.
    ///
    /// The session is consumed: teardown happens when `body` returns, whether
    /// it succeeds, errors, or panics.
    pub fn scope<T, F>(self, body: F) -> Result<T>
    where
        F: FnOnce(&OverlayContext<'_>) -> Result<T>,
    {
        let ctx = OverlayContext { session: &self };
        body(&ctx)
    }

    /// Controller endpoint this session authenticated against.
    pub fn controller(&self) -> &str {
        &self.identity.controller
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        debug!(controller = %self.identity.controller, "overlay session torn down");
        if let Some(probe) = &self.teardown_probe {
            probe.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl OverlayContext<'_> {
    /// Local tunneler proxy endpoint for overlay-routed HTTP clients.
    pub fn proxy_url(&self) -> &str {
        &self.session.proxy_url
    }

    /// Controller endpoint of the underlying session.
    pub fn controller(&self) -> &str {
        self.session.controller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityMaterial;
    use ztw_core::ZtwError;

    fn test_identity() -> OverlayIdentity {
        OverlayIdentity {
            controller: "https://ctrl.example.com:1280".to_string(),
            id: IdentityMaterial {
                cert: "pem:CERT".to_string(),
                key: "pem:KEY".to_string(),
                ca: None,
            },
            proxy: Some("http://127.0.0.1:19099".to_string()),
        }
    }

    #[test]
    fn test_scope_returns_body_value() {
        let session = OverlaySession::open(test_identity()).expect("open");
        let value = session.scope(|ctx| {
            assert_eq!(ctx.proxy_url(), "http://127.0.0.1:19099");
            Ok(42)
        });
        assert_eq!(value.expect("scope"), 42);
    }

    #[test]
    fn test_teardown_runs_exactly_once_on_success() {
        let probe = Arc::new(AtomicUsize::new(0));
        let session = OverlaySession::open(test_identity())
            .expect("open")
            .with_teardown_probe(Arc::clone(&probe));
        session.scope(|_ctx| Ok(())).expect("scope");
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_runs_exactly_once_when_body_errors() {
        let probe = Arc::new(AtomicUsize::new(0));
        let session = OverlaySession::open(test_identity())
            .expect("open")
            .with_teardown_probe(Arc::clone(&probe));
        let result: Result<()> =
            session.scope(|_ctx| Err(ZtwError::Session("mid-body failure".to_string())));
        assert!(result.is_err());
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_runs_when_body_panics() {
        let probe = Arc::new(AtomicUsize::new(0));
        let session = OverlaySession::open(test_identity())
            .expect("open")
            .with_teardown_probe(Arc::clone(&probe));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: Result<()> = session.scope(|_ctx| panic!("boom"));
        }));
        assert!(outcome.is_err());
        assert_eq!(probe.load(Ordering::SeqCst), 1);
    }
}
