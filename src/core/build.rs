//! Build step: run the build command and verify its artifacts.
//!
//! A zero exit code alone is not trusted: every expected artifact path must
//! exist on disk afterwards, guarding against silent partial builds. Build
//! failures are fatal; there are no retries.

use std::path::Path;

use serde::Serialize;

use crate::config::BuildProfile;
use crate::error::{Error, Result};
use crate::utils::artifact::resolve_artifact_path;
use crate::utils::command::{self, CapturedOutput};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArtifact {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub command: String,
    pub build_command: String,
    pub profile: BuildProfile,
    pub artifacts: Vec<BuildArtifact>,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

/// Resolve the shell line to build with.
///
/// An explicit command wins, with `{{profile}}` substituted. Otherwise the
/// default is `cargo build`, with `--release` appended for the release
/// profile.
pub fn resolve_build_command(profile: BuildProfile, explicit: Option<&str>) -> String {
    match explicit {
        Some(template) => template.replace("{{profile}}", profile.as_str()),
        None => match profile {
            BuildProfile::Debug => "cargo build".to_string(),
            BuildProfile::Release => "cargo build --release".to_string(),
        },
    }
}

pub fn build(
    profile: BuildProfile,
    explicit_command: Option<&str>,
    working_dir: &Path,
    expected_artifacts: &[String],
) -> Result<BuildOutput> {
    let build_cmd = resolve_build_command(profile, explicit_command);

    log_status!("build", "Running `{}` in {}", build_cmd, working_dir.display());

    let result = command::capture_shell_in(working_dir, &build_cmd, "build command")?;

    if !result.success {
        return Err(Error::build_command_failed(
            &build_cmd,
            result.exit_code,
            command::error_text(&result),
        ));
    }

    // The compiler said yes; make sure the artifacts agree.
    let mut artifacts = Vec::with_capacity(expected_artifacts.len());
    for pattern in expected_artifacts {
        let path = resolve_artifact_path(working_dir, pattern)?;
        let size = path
            .metadata()
            .map(|m| m.len())
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("stat {}", pattern))))?;
        artifacts.push(BuildArtifact {
            path: path.to_string_lossy().to_string(),
            size,
        });
    }

    Ok(BuildOutput {
        command: "build".to_string(),
        build_command: build_cmd,
        profile,
        artifacts,
        output: result.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn default_command_follows_profile() {
        assert_eq!(
            resolve_build_command(BuildProfile::Debug, None),
            "cargo build"
        );
        assert_eq!(
            resolve_build_command(BuildProfile::Release, None),
            "cargo build --release"
        );
    }

    #[test]
    fn explicit_command_substitutes_profile() {
        assert_eq!(
            resolve_build_command(BuildProfile::Release, Some("make {{profile}}")),
            "make release"
        );
        assert_eq!(
            resolve_build_command(BuildProfile::Debug, Some("make all")),
            "make all"
        );
    }

    #[test]
    fn successful_build_with_artifact_present() {
        let dir = TempDir::new().unwrap();
        let output = build(
            BuildProfile::Release,
            Some("mkdir -p out && printf binary > out/app"),
            dir.path(),
            &["out/app".to_string()],
        )
        .unwrap();

        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.artifacts[0].size, 6);
        assert!(output.artifacts[0].path.ends_with("out/app"));
    }

    #[test]
    fn zero_exit_with_missing_artifact_is_never_success() {
        let dir = TempDir::new().unwrap();
        let err = build(
            BuildProfile::Release,
            Some("true"),
            dir.path(),
            &["out/app".to_string()],
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::BuildArtifactMissing);
        assert_eq!(err.details["path"], "out/app");
    }

    #[test]
    fn nonzero_exit_reports_command_and_stderr() {
        let dir = TempDir::new().unwrap();
        let err = build(
            BuildProfile::Debug,
            Some("echo 'error: type mismatch' >&2; exit 101"),
            dir.path(),
            &[],
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::BuildCommandFailed);
        assert_eq!(err.details["exitCode"], 101);
        assert!(err.details["stderr"]
            .as_str()
            .unwrap()
            .contains("type mismatch"));
    }

    #[test]
    fn glob_artifact_resolves_inside_working_dir() {
        let dir = TempDir::new().unwrap();
        let output = build(
            BuildProfile::Release,
            Some("printf x > app-1.2.3.tar.gz"),
            dir.path(),
            &["app-*.tar.gz".to_string()],
        )
        .unwrap();

        assert!(output.artifacts[0].path.ends_with("app-1.2.3.tar.gz"));
    }
}
