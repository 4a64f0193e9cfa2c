//! Resource descriptors and records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Opaque creation parameters and record metadata.
pub type ParamMap = IndexMap<String, Value>;

/// The resource kinds the demo reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Volume,
    Experiment,
    Job,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::Experiment => write!(f, "experiment"),
            ResourceKind::Job => write!(f, "job"),
        }
    }
}

/// Namespace within which a lookup key is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceScope {
    /// Catalog + schema, for volumes.
    Schema { catalog: String, schema: String },
    /// Workspace path prefix, for experiments.
    Path(String),
    /// The whole workspace, for jobs.
    Workspace,
}

impl ResourceScope {
    /// Canonical string form used for namespacing stored records.
    pub fn key(&self) -> String {
        match self {
            ResourceScope::Schema { catalog, schema } => format!("{}.{}", catalog, schema),
            ResourceScope::Path(prefix) => prefix.clone(),
            ResourceScope::Workspace => "*".to_string(),
        }
    }
}

impl Display for ResourceScope {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Input specification of a desired resource: its identity and how to create
/// it when absent. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub scope: ResourceScope,
    pub lookup_key: String,
    pub create_params: ParamMap,
}

impl ResourceDescriptor {
    /// Build a descriptor. Creation always happens under the looked-up name,
    /// so a missing `name` param is filled in from `lookup_key`.
    pub fn new(
        kind: ResourceKind,
        scope: ResourceScope,
        lookup_key: impl Into<String>,
        mut create_params: ParamMap,
    ) -> Self {
        let lookup_key = lookup_key.into();
        if !create_params.contains_key("name") {
            create_params.insert("name".to_string(), Value::String(lookup_key.clone()));
        }
        Self {
            kind,
            scope,
            lookup_key,
            create_params,
        }
    }
}

/// A resource as reported by a workspace listing. Read-only; the reconciler
/// inspects it, never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub key: String,
    #[serde(default)]
    pub metadata: ParamMap,
}

impl ResourceRecord {
    pub fn new(kind: ResourceKind, key: impl Into<String>, metadata: ParamMap) -> Self {
        Self {
            kind,
            key: key.into(),
            metadata,
        }
    }

    /// String form of a metadata field, when present and a string.
    pub fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(Value::as_str)
    }
}

/// Outcome of one `ensure` call. Produced once, logged by the caller and
/// discarded; failures travel on the `Err` side of `Result<EnsureReport>`.
#[derive(Debug, Clone)]
pub struct EnsureReport {
    pub found: bool,
    pub created: bool,
    pub record: Option<ResourceRecord>,
}

impl EnsureReport {
    pub fn outcome(&self) -> &'static str {
        if self.created {
            "created"
        } else {
            "already exists"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_fills_name_param_from_lookup_key() {
        let desc = ResourceDescriptor::new(
            ResourceKind::Volume,
            ResourceScope::Schema {
                catalog: "workspace".into(),
                schema: "default".into(),
            },
            "datafiles",
            ParamMap::new(),
        );
        assert_eq!(desc.create_params.get("name"), Some(&json!("datafiles")));
    }

    #[test]
    fn test_descriptor_keeps_explicit_name_param() {
        let mut params = ParamMap::new();
        params.insert("name".to_string(), json!("other-name"));
        let desc = ResourceDescriptor::new(
            ResourceKind::Job,
            ResourceScope::Workspace,
            "demo-job",
            params,
        );
        assert_eq!(desc.create_params.get("name"), Some(&json!("other-name")));
    }

    #[test]
    fn test_scope_keys_are_distinct_per_namespace() {
        let schema = ResourceScope::Schema {
            catalog: "workspace".into(),
            schema: "default".into(),
        };
        assert_eq!(schema.key(), "workspace.default");
        assert_eq!(ResourceScope::Path("/Users/a/".into()).key(), "/Users/a/");
        assert_eq!(ResourceScope::Workspace.key(), "*");
    }
}
