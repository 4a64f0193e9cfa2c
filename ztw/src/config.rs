//! Explicit demo configuration.
//!
//! All values are threaded from parsed arguments; nothing is read from
//! ambient process state, so tests can run several configurations side by
//! side without interference.

use crate::cli::Args;
use indexmap::IndexMap;
use serde_json::json;
use std::path::PathBuf;
use ztw_core::{Result, ZtwError};
use ztw_workspace::{ParamMap, ResourceDescriptor, ResourceKind, ResourceScope, WorkspaceConfig};

pub const EXPERIMENT_BASENAME: &str = "demo_experiment";
pub const NOTEBOOK_BASENAME: &str = "demo_notebook";
pub const JOB_TASK_KEY: &str = "task1";

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub profile: String,
    pub catalog: String,
    pub schema: String,
    pub volume: String,
    pub job_name: String,
    pub backend: String,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub state_file: Option<PathBuf>,
}

impl DemoConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.backend == "rest" && args.api_url.is_none() {
            return Err(ZtwError::Config(
                "the rest backend needs --api-url".to_string(),
            ));
        }
        Ok(Self {
            profile: args.profile.clone(),
            catalog: args.catalog.clone(),
            schema: args.schema.clone(),
            volume: args.volume.clone(),
            job_name: args.job_name.clone(),
            backend: args.backend.clone(),
            api_url: args.api_url.clone(),
            token: args.token.clone(),
            state_file: args.state_file.clone(),
        })
    }

    pub fn workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig {
            backend: self.backend.clone(),
            profile: self.profile.clone(),
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            state_file: self.state_file.clone(),
        }
    }

    pub fn volume_path(&self) -> String {
        format!("/Volumes/{}/{}/{}/", self.catalog, self.schema, self.volume)
    }

    pub fn volume_scope(&self) -> ResourceScope {
        ResourceScope::Schema {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
        }
    }

    pub fn volume_descriptor(&self) -> ResourceDescriptor {
        let mut params = ParamMap::new();
        params.insert("volume_type".to_string(), json!("MANAGED"));
        params.insert("storage_location".to_string(), json!(null));
        params.insert("comment".to_string(), json!("Volume for CSV uploads"));
        ResourceDescriptor::new(
            ResourceKind::Volume,
            self.volume_scope(),
            self.volume.clone(),
            params,
        )
    }

    pub fn experiment_name(&self, home: &str) -> String {
        format!("{home}{EXPERIMENT_BASENAME}")
    }

    pub fn experiment_descriptor(&self, home: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(
            ResourceKind::Experiment,
            ResourceScope::Path(home.to_string()),
            self.experiment_name(home),
            ParamMap::new(),
        )
    }

    pub fn job_descriptor(&self, home: &str) -> ResourceDescriptor {
        let notebook_path = format!("{home}{NOTEBOOK_BASENAME}");
        let mut params: ParamMap = IndexMap::new();
        params.insert(
            "tasks".to_string(),
            json!([{
                "task_key": JOB_TASK_KEY,
                "notebook_task": { "notebook_path": notebook_path }
            }]),
        );
        ResourceDescriptor::new(
            ResourceKind::Job,
            ResourceScope::Workspace,
            self.job_name.clone(),
            params,
        )
    }
}
