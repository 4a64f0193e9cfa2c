//! REST workspace backend.
//!
//! Speaks the workspace HTTP surface the demo's SDK calls map to: unity
//! catalog volumes, experiment tracking, job scheduling and file upload.
//! When built with an [`OverlayContext`], every request is routed through the
//! session's local tunneler proxy instead of the direct network path.

use crate::api::{WorkspaceApi, WorkspaceConfig};
use crate::types::{ParamMap, ResourceKind, ResourceRecord, ResourceScope};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;
use ztw_core::{Result, ZtwError};
use ztw_overlay::OverlayContext;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_PAGE_SIZE: u32 = 1000;

#[derive(Debug)]
pub struct RestWorkspace {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestWorkspace {
    pub fn new(config: &WorkspaceConfig, overlay: Option<&OverlayContext<'_>>) -> Result<Self> {
        let api_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| ZtwError::Config("rest backend needs --api-url".to_string()))?;
        let base_url = Url::parse(api_url)
            .map_err(|e| ZtwError::Config(format!("bad workspace endpoint {api_url}: {e}")))?;

        let mut builder = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ztw/", env!("CARGO_PKG_VERSION")));
        if let Some(ctx) = overlay {
            let proxy = reqwest::Proxy::all(ctx.proxy_url()).map_err(|e| {
                ZtwError::Session(format!("bad tunneler proxy {}: {}", ctx.proxy_url(), e))
            })?;
            builder = builder.proxy(proxy);
            debug!(proxy = ctx.proxy_url(), "workspace client routed through overlay");
        }
        let client = builder
            .build()
            .map_err(|e| ZtwError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ZtwError::Config(format!("bad API path {path}: {e}")))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn fetch(&self, builder: RequestBuilder) -> std::result::Result<Value, reqwest::Error> {
        builder.send()?.error_for_status()?.json()
    }

    fn list_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<ResourceRecord>> {
        let url = self.url("api/2.1/unity-catalog/volumes")?;
        let request = self
            .authorized(self.client.get(url))
            .query(&[("catalog_name", catalog), ("schema_name", schema)]);
        let body = self
            .fetch(request)
            .map_err(|e| ZtwError::RemoteList(format!("volume listing: {e}")))?;
        Ok(collect_records(
            body.get("volumes"),
            ResourceKind::Volume,
            |v| v.get("name"),
        ))
    }

    fn list_experiments(&self, prefix: Option<&str>) -> Result<Vec<ResourceRecord>> {
        let url = self.url("api/2.0/mlflow/experiments/search")?;
        let request = self
            .authorized(self.client.post(url))
            .json(&json!({ "max_results": LIST_PAGE_SIZE }));
        let body = self
            .fetch(request)
            .map_err(|e| ZtwError::RemoteList(format!("experiment listing: {e}")))?;
        let mut records = collect_records(
            body.get("experiments"),
            ResourceKind::Experiment,
            |e| e.get("name"),
        );
        if let Some(prefix) = prefix {
            records.retain(|r| r.key.starts_with(prefix));
        }
        Ok(records)
    }

    fn list_jobs(&self) -> Result<Vec<ResourceRecord>> {
        let url = self.url("api/2.2/jobs/list")?;
        let request = self.authorized(self.client.get(url));
        let body = self
            .fetch(request)
            .map_err(|e| ZtwError::RemoteList(format!("job listing: {e}")))?;
        Ok(collect_records(body.get("jobs"), ResourceKind::Job, |j| {
            j.get("settings").and_then(|s| s.get("name"))
        }))
    }
}

impl WorkspaceApi for RestWorkspace {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn current_user(&self) -> Result<String> {
        let url = self.url("api/2.0/preview/scim/v2/Me")?;
        let body = self
            .fetch(self.authorized(self.client.get(url)))
            .map_err(|e| ZtwError::RemoteList(format!("current user lookup: {e}")))?;
        body.get("userName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ZtwError::RemoteList("current user response carries no userName".to_string())
            })
    }

    fn list(&self, kind: ResourceKind, scope: &ResourceScope) -> Result<Vec<ResourceRecord>> {
        match (kind, scope) {
            (ResourceKind::Volume, ResourceScope::Schema { catalog, schema }) => {
                self.list_volumes(catalog, schema)
            }
            (ResourceKind::Experiment, ResourceScope::Path(prefix)) => {
                self.list_experiments(Some(prefix))
            }
            (ResourceKind::Experiment, ResourceScope::Workspace) => self.list_experiments(None),
            (ResourceKind::Job, ResourceScope::Workspace) => self.list_jobs(),
            (kind, scope) => Err(ZtwError::Config(format!(
                "{kind} listing does not take scope {scope}"
            ))),
        }
    }

    fn create(
        &self,
        kind: ResourceKind,
        scope: &ResourceScope,
        params: &ParamMap,
    ) -> Result<ResourceRecord> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ZtwError::RemoteCreate(format!("create params for {kind} carry no name")))?
            .to_string();

        let mut body = Map::new();
        for (key, value) in params {
            body.insert(key.clone(), value.clone());
        }
        let path = match kind {
            ResourceKind::Volume => {
                let ResourceScope::Schema { catalog, schema } = scope else {
                    return Err(ZtwError::Config(
                        "volume creation needs a catalog.schema scope".to_string(),
                    ));
                };
                body.insert("catalog_name".to_string(), json!(catalog));
                body.insert("schema_name".to_string(), json!(schema));
                "api/2.1/unity-catalog/volumes"
            }
            ResourceKind::Experiment => "api/2.0/mlflow/experiments/create",
            ResourceKind::Job => "api/2.2/jobs/create",
        };

        let url = self.url(path)?;
        let request = self.authorized(self.client.post(url)).json(&body);
        let response = self
            .fetch(request)
            .map_err(|e| ZtwError::RemoteCreate(format!("{kind} {name}: {e}")))?;

        // The remote echoes identifiers (experiment_id, job_id) rather than
        // the full record; fold them into the metadata we already know.
        let mut metadata = params.clone();
        if let Some(fields) = response.as_object() {
            for (key, value) in fields {
                metadata.insert(key.clone(), value.clone());
            }
        }
        Ok(ResourceRecord::new(kind, name, metadata))
    }

    fn upload(&self, remote_path: &str, bytes: &[u8], overwrite: bool) -> Result<()> {
        let url = self.url(&format!("api/2.0/fs/files{remote_path}"))?;
        let request = self
            .authorized(self.client.put(url))
            .query(&[("overwrite", if overwrite { "true" } else { "false" })])
            .body(bytes.to_vec());
        request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| ZtwError::Upload(format!("{remote_path}: {e}")))?;
        debug!(path = remote_path, size = bytes.len(), "uploaded file");
        Ok(())
    }
}

fn collect_records<'v>(
    listing: Option<&'v Value>,
    kind: ResourceKind,
    name_of: impl Fn(&'v Value) -> Option<&'v Value>,
) -> Vec<ResourceRecord> {
    let Some(items) = listing.and_then(Value::as_array) else {
        // An absent or empty collection is "nothing there", never an error.
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = name_of(item)?.as_str()?;
            let metadata = item
                .as_object()
                .map(|fields| fields.clone().into_iter().collect::<ParamMap>())
                .unwrap_or_default();
            Some(ResourceRecord::new(kind, name, metadata))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_workspace() -> RestWorkspace {
        let config = WorkspaceConfig {
            backend: "rest".into(),
            api_url: Some("https://workspace.example.com/".into()),
            ..Default::default()
        };
        RestWorkspace::new(&config, None).expect("build client")
    }

    #[test]
    fn test_mismatched_scope_is_rejected_before_any_request() {
        let api = rest_workspace();
        let err = api
            .list(ResourceKind::Volume, &ResourceScope::Workspace)
            .unwrap_err();
        assert!(matches!(err, ZtwError::Config(_)));
    }

    #[test]
    fn test_collect_records_tolerates_missing_listing() {
        assert!(collect_records(None, ResourceKind::Job, |j| j.get("name")).is_empty());
        let body = json!({ "jobs": [] });
        assert!(collect_records(body.get("jobs"), ResourceKind::Job, |j| j.get("name")).is_empty());
    }

    #[test]
    fn test_collect_records_reads_nested_names() {
        let body = json!({
            "jobs": [
                { "job_id": 7, "settings": { "name": "demo-job" } },
                { "job_id": 9, "settings": {} }
            ]
        });
        let records = collect_records(body.get("jobs"), ResourceKind::Job, |j| {
            j.get("settings").and_then(|s| s.get("name"))
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "demo-job");
        assert_eq!(records[0].metadata.get("job_id"), Some(&json!(7)));
    }
}
