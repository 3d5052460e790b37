//! Artifact path resolution with glob pattern support.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve a potentially glob-patterned artifact path to an actual file.
///
/// - If the path contains no glob chars (`*`, `?`, `[`, `]`), it is returned
///   unchanged after an existence check
/// - If the path is a glob, it is expanded and the most recently modified
///   match is returned
/// - Returns `build.artifact_missing` if nothing matches
///
/// Relative paths are resolved against `base`.
pub fn resolve_artifact_path(base: &Path, pattern: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(pattern).to_string();
    let full = if Path::new(&expanded).is_absolute() {
        PathBuf::from(&expanded)
    } else {
        base.join(&expanded)
    };

    if !contains_glob_chars(&expanded) {
        if full.is_file() {
            return Ok(full);
        }
        return Err(Error::build_artifact_missing(pattern));
    }

    let entries: Vec<PathBuf> = glob::glob(&full.to_string_lossy())
        .map_err(|e| {
            Error::validation_invalid_argument(
                "artifact_paths",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.to_string()),
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    let newest = entries
        .into_iter()
        .max_by_key(|p| p.metadata().and_then(|m| m.modified()).ok());

    match newest {
        Some(path) => Ok(path),
        None => Err(Error::build_artifact_missing(pattern)),
    }
}

fn contains_glob_chars(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[') || s.contains(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::fs::{self, File};
    use std::io::Write;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn literal_path_exists() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("app");
        File::create(&file_path).unwrap();

        let result = resolve_artifact_path(dir.path(), "app").unwrap();
        assert_eq!(result, file_path);
    }

    #[test]
    fn literal_path_missing_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_artifact_path(dir.path(), "out/app").unwrap_err();
        assert_eq!(err.code, ErrorCode::BuildArtifactMissing);
        assert_eq!(err.details["path"], "out/app");
    }

    #[test]
    fn absolute_path_ignores_base() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("app.tar.gz");
        File::create(&file_path).unwrap();

        let result =
            resolve_artifact_path(Path::new("/elsewhere"), file_path.to_str().unwrap()).unwrap();
        assert_eq!(result, file_path);
    }

    #[test]
    fn glob_pattern_multiple_matches_returns_newest() {
        let dir = TempDir::new().unwrap();

        let old_file = dir.path().join("build-1.0.0.zip");
        let mut f = File::create(&old_file).unwrap();
        f.write_all(b"old").unwrap();
        drop(f);

        thread::sleep(Duration::from_millis(50));

        let new_file = dir.path().join("build-1.0.1.zip");
        let mut f = File::create(&new_file).unwrap();
        f.write_all(b"new").unwrap();
        drop(f);

        let result = resolve_artifact_path(dir.path(), "build-*.zip").unwrap();
        assert_eq!(result, new_file);
    }

    #[test]
    fn glob_pattern_no_matches() {
        let dir = TempDir::new().unwrap();
        let err = resolve_artifact_path(dir.path(), "nonexistent-*.zip").unwrap_err();
        assert_eq!(err.code, ErrorCode::BuildArtifactMissing);
    }

    #[test]
    fn glob_pattern_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("build-1.0.0.zip")).unwrap();

        let result = resolve_artifact_path(dir.path(), "build-*.zip");
        assert!(result.is_err());
    }

    #[test]
    fn detects_glob_chars() {
        assert!(contains_glob_chars("dist/*.zip"));
        assert!(contains_glob_chars("build-?.tar.gz"));
        assert!(contains_glob_chars("file[0-9].txt"));
        assert!(!contains_glob_chars("dist/artifact.zip"));
    }
}
