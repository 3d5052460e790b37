//! Environment provisioning: install required system packages.
//!
//! Installs each named package through the configured package manager, in
//! order, stopping at the first failure. Idempotency is the package
//! manager's business: re-installing an already-present package succeeds.
//! Host package state is mutated deliberately; there is no sandbox.

use serde::Serialize;

use crate::config::InstallCommand;
use crate::error::{Error, Result};
use crate::utils::command;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionOutput {
    pub command: String,
    pub installed: Vec<String>,
}

/// Install `packages` one at a time, in order, fail-fast.
///
/// The first non-zero installer exit stops provisioning; packages after
/// the failing one are not attempted.
pub fn provision(installer: &InstallCommand, packages: &[String]) -> Result<ProvisionOutput> {
    let mut installed = Vec::with_capacity(packages.len());

    for package in packages {
        log_status!("provision", "Installing {}", package);

        let mut args: Vec<&str> = installer.args.iter().map(String::as_str).collect();
        args.push(package);

        let result = command::capture(
            &installer.program,
            &args,
            &format!("install {}", package),
        )?;

        if !result.success {
            return Err(Error::provision_install_failed(
                package,
                result.exit_code,
                command::error_text(&result),
            ));
        }

        installed.push(package.clone());
    }

    Ok(ProvisionOutput {
        command: "provision".to_string(),
        installed,
    })
}
