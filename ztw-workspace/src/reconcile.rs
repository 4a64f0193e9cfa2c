//! The check-then-create reconciliation core.

use crate::api::WorkspaceApi;
use crate::types::{EnsureReport, ResourceDescriptor};
use tracing::debug;
use ztw_core::Result;

/// Generic reconciler over a workspace collaborator.
///
/// `ensure` is idempotent: against unchanged remote state, a matching record
/// means no mutation is issued, however many times it is called. There is no
/// update or delete path; only presence is reconciled, never configuration
/// drift. Create failures are surfaced, not retried — retry policy belongs to
/// the caller.
pub struct Reconciler<'a> {
    api: &'a dyn WorkspaceApi,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn WorkspaceApi) -> Self {
        Self { api }
    }

    /// Ensure the described resource exists, creating it when absent.
    ///
    /// The existence check is an exact, case-sensitive string match on the
    /// lookup key — no normalization. An empty listing means "not found",
    /// never an error. When the remote holds several records under the same
    /// key, the last one listed wins.
    pub fn ensure(&self, descriptor: &ResourceDescriptor) -> Result<EnsureReport> {
        let records = self.api.list(descriptor.kind, &descriptor.scope)?;

        let mut existing = None;
        for record in records {
            if record.key == descriptor.lookup_key {
                existing = Some(record);
            }
        }

        if let Some(record) = existing {
            debug!(
                kind = %descriptor.kind,
                key = %descriptor.lookup_key,
                "resource present, nothing to do"
            );
            return Ok(EnsureReport {
                found: true,
                created: false,
                record: Some(record),
            });
        }

        let record = self
            .api
            .create(descriptor.kind, &descriptor.scope, &descriptor.create_params)?;
        debug!(kind = %descriptor.kind, key = %descriptor.lookup_key, "resource created");
        Ok(EnsureReport {
            found: false,
            created: true,
            record: Some(record),
        })
    }
}
