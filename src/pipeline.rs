//! Whole-run orchestration.
//!
//! Targets are processed sequentially in the order given. Each successful
//! build contributes one archive to the batch returned by [`build_targets`];
//! the batch is uploaded once, after every target has been handled. The first
//! failing target aborts the run before anything is uploaded.

use crate::builder::Builder;
use crate::config::{Config, system_temp_dir};
use crate::deps::{CommandExecutor, ensure_openssl};
use crate::error::{ReleaseError, Result};
use crate::metadata::MetadataQuery;
use crate::platform::{OsFamily, System, TargetTriple};
use crate::release::ReleasePublisher;
use crate::toolchain::Provisioner;
use camino::Utf8PathBuf;
use log::{info, warn};

/// Whether `target` can be built on `host`.
///
/// Windows targets are built only on Windows hosts, and Windows hosts build
/// only Windows targets.
#[must_use]
pub fn should_build(host: &System, target: &TargetTriple) -> bool {
    host.is_windows() == (target.os_family() == OsFamily::Windows)
}

/// Build and pack every buildable target, returning the archives in target
/// order.
///
/// # Errors
///
/// Propagates the first build or packaging failure.
pub fn build_targets(
    builder: &mut Builder<'_>,
    host: &System,
    targets: &[TargetTriple],
) -> Result<Vec<Utf8PathBuf>> {
    targets.iter().try_fold(Vec::new(), |mut archives, target| {
        if should_build(host, target) {
            info!("building target {target}");
            archives.push(builder.build_and_pack(target)?);
        } else {
            info!("platform does not match, skip build target {target}");
        }
        Ok(archives)
    })
}

/// Run the action on the current host.
///
/// # Errors
///
/// Returns the first configuration, provisioning, build, packaging, or
/// upload error.
pub fn run(config: &Config, executor: &dyn CommandExecutor) -> Result<Vec<Utf8PathBuf>> {
    run_on(config, executor, &System::host(), std::env::consts::ARCH)
}

/// Run the action as if on `host` with CPU `host_arch`.
///
/// # Errors
///
/// See [`run`].
pub fn run_on(
    config: &Config,
    executor: &dyn CommandExecutor,
    host: &System,
    host_arch: &str,
) -> Result<Vec<Utf8PathBuf>> {
    if config.targets.is_empty() {
        return Err(ReleaseError::NoTargets);
    }

    let provisioner = if config.skip_deps {
        None
    } else {
        ensure_openssl(executor, &config.workspace_root)?;
        Some(Provisioner::new(executor, &system_temp_dir()?).with_host(host.clone()))
    };

    let metadata = MetadataQuery::new(executor);
    let mut builder =
        Builder::new(executor, &metadata, config, provisioner).with_host(host.clone(), host_arch);
    let archives = build_targets(&mut builder, host, &config.targets)?;

    if config.skip_upload {
        info!("upload disabled, {} archive(s) left in {}", archives.len(), config.output_dir);
        return Ok(archives);
    }
    if archives.is_empty() {
        warn!("no target was built on this host, nothing to upload");
        return Ok(archives);
    }

    let ref_name = config
        .ref_name
        .as_deref()
        .ok_or(ReleaseError::MissingInput {
            name: "GITHUB_REF_NAME",
        })?;
    let publisher = ReleasePublisher::new(executor, config.token.clone());
    publisher.ensure_release_exists(ref_name, &config.release_options)?;
    publisher.publish(&archives, ref_name)?;
    Ok(archives)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
