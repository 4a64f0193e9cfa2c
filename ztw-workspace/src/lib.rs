//! Workspace resource reconciliation.
//!
//! This crate holds the one generalizable piece of the demo: idempotent
//! declarative reconciliation ("ensure resource R with identity I exists,
//! create it if absent, otherwise no-op") over a [`WorkspaceApi`]
//! collaborator. Two backends implement the collaborator: a REST client that
//! can be routed through an overlay session, and an in-memory workspace used
//! for tests and offline demo runs.

pub mod api;
pub mod memory;
pub mod reconcile;
pub mod rest;
pub mod types;

pub use api::{get_workspace, WorkspaceApi, WorkspaceConfig};
pub use memory::InMemoryWorkspace;
pub use reconcile::Reconciler;
pub use rest::RestWorkspace;
pub use types::{
    EnsureReport, ParamMap, ResourceDescriptor, ResourceKind, ResourceRecord, ResourceScope,
};
