//! Zero-trust overlay connectivity for the ztw demo.
//!
//! This crate wraps an external identity+tunnel provider behind two pieces:
//! [`OverlayIdentity`], the enrollment material loaded from disk, and
//! [`OverlaySession`], a scoped handle whose [`OverlaySession::scope`] runs a
//! body with the tunnel active and guarantees teardown on every exit path.
//! Collaborators that must be tunneled receive an explicit [`OverlayContext`]
//! instead of relying on process-wide connection interception.

pub mod identity;
pub mod session;

pub use identity::OverlayIdentity;
pub use session::{OverlayContext, OverlaySession};
