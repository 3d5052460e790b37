use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    ProvisionInstallFailed,

    BuildCommandFailed,
    BuildArtifactMissing,

    PublishTagConflict,
    PublishUnauthorized,
    PublishNetworkFailed,
    PublishApiError,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::ProvisionInstallFailed => "provision.install_failed",

            ErrorCode::BuildCommandFailed => "build.command_failed",
            ErrorCode::BuildArtifactMissing => "build.artifact_missing",

            ErrorCode::PublishTagConflict => "publish.tag_conflict",
            ErrorCode::PublishUnauthorized => "publish.unauthorized",
            ErrorCode::PublishNetworkFailed => "publish.network_failed",
            ErrorCode::PublishApiError => "publish.api_error",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallFailedDetails {
    pub package: String,
    pub exit_code: i32,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMissingDetails {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConflictDetails {
    pub tag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkFailedDetails {
    pub operation: String,
    pub attempts: u32,
    pub cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDetails {
    pub operation: String,
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn details_value<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details_value(ConfigMissingKeyDetails {
                key: key.into(),
                path,
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details_value(ConfigInvalidJsonDetails {
                path: path.into(),
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details_value(ConfigInvalidValueDetails {
                key: key.into(),
                value,
                problem: problem.into(),
            }),
        )
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            details_value(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details_value(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                id,
            }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidJson,
            "Invalid JSON",
            serde_json::json!({ "error": err.to_string(), "context": context }),
        )
    }

    pub fn provision_install_failed(
        package: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        let package = package.into();
        Self::new(
            ErrorCode::ProvisionInstallFailed,
            format!("Package installation failed: {}", package),
            details_value(InstallFailedDetails {
                package,
                exit_code,
                stderr: stderr.into(),
            }),
        )
    }

    pub fn build_command_failed(
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::BuildCommandFailed,
            format!("Build command failed with exit code {}", exit_code),
            details_value(BuildCommandFailedDetails {
                command: command.into(),
                exit_code,
                stderr: stderr.into(),
            }),
        )
    }

    pub fn build_artifact_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::BuildArtifactMissing,
            format!("Build succeeded but expected artifact is missing: {}", path),
            details_value(ArtifactMissingDetails { path }),
        )
        .with_hint("Check artifactPaths against what the build command actually produces")
    }

    pub fn publish_tag_conflict(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(
            ErrorCode::PublishTagConflict,
            format!("A release for tag '{}' already exists", tag),
            details_value(TagConflictDetails { tag }),
        )
        .with_hint("Set allowUpdate to replace the existing release's assets")
    }

    pub fn publish_unauthorized() -> Self {
        let mut err = Self::new(
            ErrorCode::PublishUnauthorized,
            "Hosting service rejected the credential",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("Check the token and its repository permissions");
        err.retryable = Some(false);
        err
    }

    pub fn publish_network_failed(
        operation: impl Into<String>,
        attempts: u32,
        cause: impl Into<String>,
    ) -> Self {
        let operation = operation.into();
        let mut err = Self::new(
            ErrorCode::PublishNetworkFailed,
            format!("Network failure during {}", operation),
            details_value(NetworkFailedDetails {
                operation,
                attempts,
                cause: cause.into(),
            }),
        );
        err.retryable = Some(true);
        err
    }

    pub fn publish_api_error(operation: impl Into<String>, status: u16, body: &str) -> Self {
        Self::new(
            ErrorCode::PublishApiError,
            format!("API error: HTTP {}", status),
            details_value(ApiErrorDetails {
                operation: operation.into(),
                status,
                body: body.chars().take(500).collect(),
            }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            details_value(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let error: String = error.into();
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error, "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        let error: String = error.into();
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_namespaced() {
        assert_eq!(
            ErrorCode::ProvisionInstallFailed.as_str(),
            "provision.install_failed"
        );
        assert_eq!(
            ErrorCode::BuildArtifactMissing.as_str(),
            "build.artifact_missing"
        );
        assert_eq!(ErrorCode::PublishTagConflict.as_str(), "publish.tag_conflict");
    }

    #[test]
    fn install_failed_carries_package_and_exit_code() {
        let err = Error::provision_install_failed("libfoo-dev", 100, "E: Unable to locate");
        assert_eq!(err.code, ErrorCode::ProvisionInstallFailed);
        assert_eq!(err.details["package"], "libfoo-dev");
        assert_eq!(err.details["exitCode"], 100);
    }

    #[test]
    fn network_failed_is_marked_retryable() {
        let err = Error::publish_network_failed("create release", 3, "connection reset");
        assert_eq!(err.retryable, Some(true));
        assert_eq!(err.details["attempts"], 3);
    }

    #[test]
    fn unauthorized_is_not_retryable() {
        let err = Error::publish_unauthorized();
        assert_eq!(err.retryable, Some(false));
    }
}
