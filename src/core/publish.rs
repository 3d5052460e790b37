//! Release publishing: create-or-update a tagged release and attach assets.
//!
//! The lookup result is an explicit tagged value and the create/update/
//! conflict decision is a single match on it, so every transition is
//! auditable. Uploads are strictly sequential in the order given; the
//! hosting service has no all-or-nothing asset swap, so parallel upload
//! would only widen the partial-visibility window.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: u64,
    pub tag: String,
    pub prerelease: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub name: String,
    pub size: u64,
}

/// Narrow publish interface over the hosting service.
///
/// `GithubClient` is the real implementation; tests use an in-memory fake.
pub trait ReleaseHost {
    fn release_by_tag(&self, tag: &str) -> Result<Option<Release>>;
    fn create_release(&self, tag: &str, prerelease: bool) -> Result<Release>;
    fn update_release(&self, release_id: u64, prerelease: bool) -> Result<Release>;
    /// Upload the file as an asset, replacing any existing asset of the
    /// same name under this release.
    fn upload_asset(&self, release_id: u64, path: &Path) -> Result<UploadedAsset>;
}

#[derive(Debug, Clone)]
pub struct ReleaseSpec {
    pub tag: String,
    pub prerelease: bool,
    pub allow_update: bool,
    pub artifacts: Vec<PathBuf>,
}

/// Outcome of the tag lookup, spelled out instead of nested conditionals.
enum TagLookup {
    Missing,
    Existing(Release),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutput {
    pub command: String,
    pub tag: String,
    pub release_id: u64,
    pub created: bool,
    pub prerelease: bool,
    pub uploaded: Vec<UploadedAsset>,
}

pub fn publish(host: &dyn ReleaseHost, spec: &ReleaseSpec) -> Result<PublishOutput> {
    // Verify files before touching the service; a spec we cannot fulfill
    // should not create or mutate a remote release.
    for path in &spec.artifacts {
        if !path.is_file() {
            return Err(Error::build_artifact_missing(
                path.to_string_lossy().to_string(),
            ));
        }
    }

    let lookup = match host.release_by_tag(&spec.tag)? {
        Some(release) => TagLookup::Existing(release),
        None => TagLookup::Missing,
    };

    let (release, created) = match (lookup, spec.allow_update) {
        (TagLookup::Missing, _) => {
            log_status!("publish", "Creating release for tag '{}'", spec.tag);
            (host.create_release(&spec.tag, spec.prerelease)?, true)
        }
        (TagLookup::Existing(_), false) => {
            return Err(Error::publish_tag_conflict(&spec.tag));
        }
        (TagLookup::Existing(existing), true) => {
            // Overwrites assets regardless of what the existing release was
            // built from; the reused id is surfaced so the operator can tell.
            log_status!(
                "publish",
                "Reusing release {} for tag '{}', same-name assets will be replaced",
                existing.id,
                spec.tag
            );
            (host.update_release(existing.id, spec.prerelease)?, false)
        }
    };

    let mut uploaded = Vec::with_capacity(spec.artifacts.len());
    for path in &spec.artifacts {
        let asset = host.upload_asset(release.id, path)?;
        log_status!("publish", "Uploaded {} ({} bytes)", asset.name, asset.size);
        uploaded.push(asset);
    }

    Ok(PublishOutput {
        command: "publish".to_string(),
        tag: spec.tag.clone(),
        release_id: release.id,
        created,
        prerelease: release.prerelease,
        uploaded,
    })
}
