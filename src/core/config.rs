//! Pipeline configuration loading and validation.
//!
//! A pipeline is described by a single JSON file (default `./shipmate.json`).
//! Credentials and the working directory are resolved here, at the edge, and
//! passed explicitly into the step components so each stays independently
//! testable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "shipmate.json";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_UPLOADS_BASE_URL: &str = "https://uploads.github.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    Debug,
    #[default]
    Release,
}

impl BuildProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "debug",
            BuildProfile::Release => "release",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "debug" => Ok(BuildProfile::Debug),
            "release" => Ok(BuildProfile::Release),
            other => Err(Error::config_invalid_value(
                "buildProfile",
                Some(other.to_string()),
                "Expected 'debug' or 'release'",
            )),
        }
    }
}

/// How system packages are installed. The command is run once per package,
/// with the package name appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for InstallCommand {
    fn default() -> Self {
        Self {
            program: "apt-get".to_string(),
            args: vec!["install".to_string(), "-y".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    /// Release identifier the artifacts are published under.
    pub tag: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub allow_update: bool,
    #[serde(default)]
    pub build_profile: BuildProfile,
    #[serde(default)]
    pub artifact_paths: Vec<String>,
    #[serde(default)]
    pub required_packages: Vec<String>,

    /// Hosting repository as "owner/name". Required for publish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Shell line for the build. `{{profile}}` is replaced with the profile
    /// name. Defaults to `cargo build [--release]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    /// Package-manager invocation, split as ["program", "arg", ...].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads_base_url: Option<String>,
    /// Environment variable the publish credential is read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl PipelineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path).to_string();
        let content = std::fs::read_to_string(&expanded).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", expanded)))
                .with_hint("Provide a config path: shipmate run ./shipmate.json")
        })?;

        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(expanded, e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(Error::config_missing_key("tag", None));
        }
        if let Some(repo) = &self.repo {
            validate_repo(repo)?;
        }
        if let Some(install) = &self.install_command {
            if install.is_empty() {
                return Err(Error::config_invalid_value(
                    "installCommand",
                    None,
                    "Must contain at least the program name",
                ));
            }
        }
        Ok(())
    }

    /// Working directory with `~` expanded; defaults to the current directory.
    pub fn working_dir(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
            None => PathBuf::from("."),
        }
    }

    pub fn install_command(&self) -> InstallCommand {
        match &self.install_command {
            Some(parts) => {
                // validate() guarantees at least one element
                InstallCommand {
                    program: parts[0].clone(),
                    args: parts[1..].to_vec(),
                }
            }
            None => InstallCommand::default(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn uploads_base_url(&self) -> &str {
        self.uploads_base_url
            .as_deref()
            .unwrap_or(DEFAULT_UPLOADS_BASE_URL)
    }

    /// Repo in "owner/name" form, required for publish.
    pub fn require_repo(&self) -> Result<&str> {
        self.repo.as_deref().ok_or_else(|| {
            Error::config_missing_key("repo", None)
                .with_hint("Set \"repo\": \"owner/name\" in the pipeline config")
        })
    }

    /// Resolve the publish credential: explicit override first, then the
    /// configured environment variable (default GITHUB_TOKEN).
    pub fn resolve_token(&self, override_token: Option<&str>) -> Result<String> {
        if let Some(token) = override_token {
            return Ok(token.to_string());
        }
        let env_var = self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        std::env::var(env_var).map_err(|_| {
            Error::validation_missing_argument(vec!["token".to_string()]).with_hint(format!(
                "Set the {} environment variable or pass --token",
                env_var
            ))
        })
    }
}

fn validate_repo(repo: &str) -> Result<()> {
    let mut parts = repo.split('/');
    let owner = parts.next().unwrap_or_default();
    let name = parts.next().unwrap_or_default();
    if owner.is_empty() || name.is_empty() || parts.next().is_some() {
        return Err(Error::config_invalid_value(
            "repo",
            Some(repo.to_string()),
            "Expected \"owner/name\"",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let file = write_config(r#"{ "tag": "dev-linux" }"#);
        let config = PipelineConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.tag, "dev-linux");
        assert!(!config.prerelease);
        assert!(!config.allow_update);
        assert_eq!(config.build_profile, BuildProfile::Release);
        assert!(config.artifact_paths.is_empty());
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"{
                "tag": "dev-linux",
                "prerelease": true,
                "allowUpdate": true,
                "buildProfile": "release",
                "artifactPaths": ["target/release/app"],
                "requiredPackages": ["ocl-icd-opencl-dev"],
                "repo": "acme/widget",
                "installCommand": ["apt-get", "install", "-y"]
            }"#,
        );
        let config = PipelineConfig::load(file.path().to_str().unwrap()).unwrap();

        assert!(config.prerelease);
        assert!(config.allow_update);
        assert_eq!(config.required_packages, vec!["ocl-icd-opencl-dev"]);
        assert_eq!(config.require_repo().unwrap(), "acme/widget");
        let install = config.install_command();
        assert_eq!(install.program, "apt-get");
        assert_eq!(install.args, vec!["install", "-y"]);
    }

    #[test]
    fn empty_tag_is_rejected() {
        let file = write_config(r#"{ "tag": "  " }"#);
        let err = PipelineConfig::load(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    }

    #[test]
    fn malformed_repo_is_rejected() {
        let file = write_config(r#"{ "tag": "v1", "repo": "not-a-repo" }"#);
        let err = PipelineConfig::load(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let file = write_config(r#"{ "tag": "v1", "buildProfile": "fastest" }"#);
        let err = PipelineConfig::load(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config(r#"{ "tag": "v1", "artifcatPaths": [] }"#);
        let err = PipelineConfig::load(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn token_override_wins_over_env() {
        let file = write_config(r#"{ "tag": "v1" }"#);
        let config = PipelineConfig::load(file.path().to_str().unwrap()).unwrap();
        let token = config.resolve_token(Some("abc123")).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn missing_token_names_the_env_var() {
        let file = write_config(r#"{ "tag": "v1", "tokenEnv": "SHIPMATE_TEST_TOKEN_UNSET" }"#);
        let config = PipelineConfig::load(file.path().to_str().unwrap()).unwrap();
        let err = config.resolve_token(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationMissingArgument);
        assert!(err.hints[0].message.contains("SHIPMATE_TEST_TOKEN_UNSET"));
    }

    #[test]
    fn profile_parse_round_trip() {
        assert_eq!(BuildProfile::parse("debug").unwrap(), BuildProfile::Debug);
        assert_eq!(BuildProfile::parse("release").unwrap(), BuildProfile::Release);
        assert!(BuildProfile::parse("fast").is_err());
    }
}
