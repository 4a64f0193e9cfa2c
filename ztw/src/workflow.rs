//! The demo workflow: volume, upload, experiment, job — all inside one
//! overlay session — then a final job listing over the direct path.
//!
//! Strictly sequential, no rollback. A failed step halts the run; re-running
//! from scratch is the recovery path and is safe because `ensure` is
//! idempotent.

use crate::cli::Args;
use crate::config::DemoConfig;
use std::fs;
use tracing::info;
use ztw_core::{Result, ZtwError};
use ztw_core::{ztw_println, ztw_progress, ztw_success};
use ztw_overlay::{OverlayIdentity, OverlaySession};
use ztw_workspace::{
    get_workspace, EnsureReport, Reconciler, ResourceKind, ResourceScope, WorkspaceApi,
    WorkspaceConfig,
};

pub fn run(args: Args) -> Result<()> {
    let config = DemoConfig::from_args(&args)?;

    // Identity problems are fatal before any resource operation; nothing may
    // fall back to the unprotected network path.
    ztw_progress!("Loading the overlay identity...");
    let identity = OverlayIdentity::load(&args.identity)?;
    let session = OverlaySession::open(identity)?;

    let workspace_config = config.workspace_config();
    session.scope(|ctx| {
        let api = get_workspace(&workspace_config, Some(ctx))?;

        let user = api.current_user()?;
        let home = format!("/Users/{user}/");
        info!(user = %user, backend = api.name(), "resolved principal home path");

        let reconciler = Reconciler::new(api.as_ref());

        ensure_volume(&reconciler, &config)?;
        print_volume_listing(api.as_ref(), &config)?;
        upload_file(api.as_ref(), &args, &config)?;
        ensure_experiment(&reconciler, &config, &home)?;
        ensure_job(&reconciler, &config, &home)?;
        Ok(())
    })?;

    // The session is closed here; this listing deliberately takes the direct
    // path to show final state outside the tunnel.
    list_jobs(&workspace_config)?;

    ztw_success!("All resources reconciled over the overlay");
    Ok(())
}

fn report_outcome(report: &EnsureReport, kind: ResourceKind, key: &str) {
    info!(kind = %kind, key = %key, outcome = report.outcome(), "reconciled");
}

fn ensure_volume(reconciler: &Reconciler<'_>, config: &DemoConfig) -> Result<()> {
    let descriptor = config.volume_descriptor();
    let report = reconciler.ensure(&descriptor)?;
    report_outcome(&report, descriptor.kind, &descriptor.lookup_key);
    if report.created {
        ztw_println!("Created new volume: {}", config.volume_path());
    } else {
        ztw_println!("Volume {} already exists", config.volume);
    }
    Ok(())
}

fn print_volume_listing(api: &dyn WorkspaceApi, config: &DemoConfig) -> Result<()> {
    let volumes = api.list(ResourceKind::Volume, &config.volume_scope())?;
    for volume in &volumes {
        ztw_println!(
            "Volume info: {} {} {}",
            volume.key,
            volume.metadata_str("volume_type").unwrap_or("-"),
            volume.metadata_str("storage_location").unwrap_or("-"),
        );
    }
    Ok(())
}

fn upload_file(api: &dyn WorkspaceApi, args: &Args, config: &DemoConfig) -> Result<()> {
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ZtwError::Upload(format!("{} has no usable file name", args.file.display()))
        })?;
    let bytes = fs::read(&args.file)
        .map_err(|e| ZtwError::Upload(format!("cannot read {}: {}", args.file.display(), e)))?;

    let remote_path = format!("{}{}", config.volume_path(), file_name);
    ztw_progress!("Uploading {} to volume at {}...", args.file.display(), remote_path);
    api.upload(&remote_path, &bytes, true)
}

fn ensure_experiment(reconciler: &Reconciler<'_>, config: &DemoConfig, home: &str) -> Result<()> {
    let descriptor = config.experiment_descriptor(home);
    let report = reconciler.ensure(&descriptor)?;
    report_outcome(&report, descriptor.kind, &descriptor.lookup_key);

    let id = report
        .record
        .as_ref()
        .and_then(|r| r.metadata_str("experiment_id").map(str::to_string))
        .unwrap_or_else(|| descriptor.lookup_key.clone());
    if report.created {
        ztw_println!("Created new experiment: ID={id}");
    } else {
        ztw_println!("Experiment already exists: ID={id}");
    }
    Ok(())
}

fn ensure_job(reconciler: &Reconciler<'_>, config: &DemoConfig, home: &str) -> Result<()> {
    let descriptor = config.job_descriptor(home);
    let report = reconciler.ensure(&descriptor)?;
    report_outcome(&report, descriptor.kind, &descriptor.lookup_key);
    if report.created {
        ztw_println!("Created Job: name={}", config.job_name);
    } else {
        ztw_println!("Job already exists: name={}", config.job_name);
    }
    Ok(())
}

fn list_jobs(workspace_config: &WorkspaceConfig) -> Result<()> {
    let api = get_workspace(workspace_config, None)?;
    let jobs = api.list(ResourceKind::Job, &ResourceScope::Workspace)?;
    ztw_println!("List jobs:");
    ztw_println!("Number of jobs: {}", jobs.len());
    for job in &jobs {
        ztw_println!("{}", job.key);
    }
    Ok(())
}
