//! GitHub releases API client implementing the `ReleaseHost` seam.
//!
//! Blocking reqwest client with an explicit user agent and request timeout.
//! Transient failures (transport errors, HTTP 429/5xx) are retried up to a
//! small fixed bound with linear backoff; 401/403 is a non-retryable
//! credential failure and surfaces immediately.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::publish::{Release, ReleaseHost, UploadedAsset};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP_MS: u64 = 500;

#[derive(Deserialize)]
struct GhRelease {
    id: u64,
    tag_name: String,
    prerelease: bool,
}

#[derive(Deserialize)]
struct GhAsset {
    id: u64,
    name: String,
}

impl From<GhRelease> for Release {
    fn from(r: GhRelease) -> Self {
        Release {
            id: r.id,
            tag: r.tag_name,
            prerelease: r.prerelease,
        }
    }
}

pub struct GithubClient {
    client: Client,
    api_base: String,
    uploads_base: String,
    repo: String,
    token: String,
}

struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

fn is_auth_status(status: u16) -> bool {
    status == 401 || status == 403
}

impl GithubClient {
    pub fn new(
        repo: impl Into<String>,
        token: impl Into<String>,
        api_base: impl Into<String>,
        uploads_base: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("shipmate/{}", VERSION))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some("create HTTP client".to_string()))
            })?;

        Ok(Self {
            client,
            api_base: trim_trailing_slash(api_base.into()),
            uploads_base: trim_trailing_slash(uploads_base.into()),
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn release_url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/releases{}", self.api_base, self.repo, suffix)
    }

    fn upload_url(&self, release_id: u64) -> String {
        format!(
            "{}/repos/{}/releases/{}/assets",
            self.uploads_base, self.repo, release_id
        )
    }

    /// The asset name goes through `query` so reqwest percent-encodes it.
    fn upload_request(&self, release_id: u64, asset_name: &str) -> RequestBuilder {
        self.client
            .post(self.upload_url(release_id))
            .query(&[("name", asset_name)])
            .header("Content-Type", "application/octet-stream")
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
    }

    /// Send a request, retrying transient failures with linear backoff.
    ///
    /// Returns the final reply for any non-transient status; semantic status
    /// handling (404 on lookup, 201 on create) stays with the caller.
    fn execute(
        &self,
        operation: &str,
        build: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Reply> {
        let mut last_cause = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                std::thread::sleep(Duration::from_millis(BACKOFF_STEP_MS * (attempt - 1) as u64));
                log_status!("publish", "Retrying {} (attempt {})", operation, attempt);
            }

            let response = match self.authed(build(&self.client)).send() {
                Ok(response) => response,
                Err(e) => {
                    last_cause = e.to_string();
                    continue;
                }
            };

            let status = response.status().as_u16();
            let body = response.text().map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("read {} response", operation)))
            })?;

            if is_auth_status(status) {
                return Err(Error::publish_unauthorized());
            }
            if is_transient_status(status) {
                last_cause = format!("HTTP {}", status);
                continue;
            }

            return Ok(Reply { status, body });
        }

        Err(Error::publish_network_failed(operation, MAX_ATTEMPTS, last_cause))
    }

    fn parse_release(&self, operation: &str, reply: &Reply) -> Result<Release> {
        if !reply.is_success() {
            return Err(Error::publish_api_error(operation, reply.status, &reply.body));
        }
        let release: GhRelease = serde_json::from_str(&reply.body).map_err(|e| {
            Error::internal_json(e.to_string(), Some(format!("parse {} response", operation)))
        })?;
        Ok(release.into())
    }

    fn list_assets(&self, release_id: u64) -> Result<Vec<GhAsset>> {
        let operation = "list assets";
        let url = self.release_url(&format!("/{}/assets", release_id));
        let reply = self.execute(operation, |client| client.get(&url))?;
        if !reply.is_success() {
            return Err(Error::publish_api_error(operation, reply.status, &reply.body));
        }
        serde_json::from_str(&reply.body).map_err(|e| {
            Error::internal_json(e.to_string(), Some(format!("parse {} response", operation)))
        })
    }

    fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let operation = "delete asset";
        let url = format!(
            "{}/repos/{}/releases/assets/{}",
            self.api_base, self.repo, asset_id
        );
        let reply = self.execute(operation, |client| client.delete(&url))?;
        if !reply.is_success() && reply.status != 404 {
            return Err(Error::publish_api_error(operation, reply.status, &reply.body));
        }
        Ok(())
    }
}

impl ReleaseHost for GithubClient {
    fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let operation = "look up release";
        let url = self.release_url(&format!("/tags/{}", tag));
        let reply = self.execute(operation, |client| client.get(&url))?;

        if reply.status == 404 {
            return Ok(None);
        }
        self.parse_release(operation, &reply).map(Some)
    }

    fn create_release(&self, tag: &str, prerelease: bool) -> Result<Release> {
        let operation = "create release";
        let url = self.release_url("");
        let body = json!({ "tag_name": tag, "prerelease": prerelease });
        let reply = self.execute(operation, |client| client.post(&url).json(&body))?;
        self.parse_release(operation, &reply)
    }

    fn update_release(&self, release_id: u64, prerelease: bool) -> Result<Release> {
        let operation = "update release";
        let url = self.release_url(&format!("/{}", release_id));
        let body = json!({ "prerelease": prerelease });
        let reply = self.execute(operation, |client| client.patch(&url).json(&body))?;
        self.parse_release(operation, &reply)
    }

    fn upload_asset(&self, release_id: u64, path: &Path) -> Result<UploadedAsset> {
        let operation = "upload asset";
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "artifact_paths",
                    format!("Artifact path has no file name: {}", path.display()),
                    None,
                )
            })?;

        // Replace semantics: an existing asset with this name goes first.
        for asset in self.list_assets(release_id)? {
            if asset.name == name {
                self.delete_asset(asset.id)?;
            }
        }

        let content = std::fs::read(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;
        let size = content.len() as u64;

        let reply = self.execute(operation, |_client| {
            self.upload_request(release_id, &name).body(content.clone())
        })?;

        if !reply.is_success() {
            return Err(Error::publish_api_error(operation, reply.status, &reply.body));
        }

        Ok(UploadedAsset { name, size })
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn client() -> GithubClient {
        GithubClient::new(
            "acme/widget",
            "token",
            "https://api.github.com/",
            "https://uploads.github.com",
        )
        .unwrap()
    }

    #[test]
    fn release_urls_target_the_repo() {
        let c = client();
        assert_eq!(
            c.release_url("/tags/dev-linux"),
            "https://api.github.com/repos/acme/widget/releases/tags/dev-linux"
        );
        assert_eq!(
            c.release_url(""),
            "https://api.github.com/repos/acme/widget/releases"
        );
    }

    #[test]
    fn upload_url_uses_the_uploads_host() {
        let c = client();
        assert_eq!(
            c.upload_url(7),
            "https://uploads.github.com/repos/acme/widget/releases/7/assets"
        );
    }

    #[test]
    fn upload_request_percent_encodes_the_asset_name() {
        let c = client();
        let request = c.upload_request(7, "app v#1&x").build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://uploads.github.com/repos/acme/widget/releases/7/assets?name=app+v%231%26x"
        );
    }

    #[test]
    fn transient_statuses_are_429_and_5xx() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(500));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(422));
    }

    #[test]
    fn auth_statuses_are_401_and_403() {
        assert!(is_auth_status(401));
        assert!(is_auth_status(403));
        assert!(!is_auth_status(400));
    }

    /// Serve exactly one HTTP response on a local port, then close.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn transport_failure_retries_then_surfaces_network_failed() {
        // Nothing listens on port 1; every attempt fails at connect.
        let c = GithubClient::new(
            "acme/widget",
            "token",
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
        )
        .unwrap();

        let err = c.release_by_tag("dev-linux").unwrap_err();

        assert_eq!(err.code, ErrorCode::PublishNetworkFailed);
        assert_eq!(err.details["attempts"], MAX_ATTEMPTS);
        assert_eq!(err.retryable, Some(true));
    }

    #[test]
    fn unauthorized_status_fails_immediately_without_retry() {
        // One response only; a retry would fail at connect with a
        // network error instead of the credential error.
        let base = serve_once(
            "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );
        let c = GithubClient::new("acme/widget", "bad-token", base.clone(), base).unwrap();

        let err = c.release_by_tag("dev-linux").unwrap_err();

        assert_eq!(err.code, ErrorCode::PublishUnauthorized);
        assert_eq!(err.retryable, Some(false));
    }

    #[test]
    fn release_json_maps_into_domain_type() {
        let release: GhRelease = serde_json::from_str(
            r#"{ "id": 42, "tag_name": "dev-linux", "prerelease": true, "draft": false }"#,
        )
        .unwrap();
        let release: Release = release.into();
        assert_eq!(release.id, 42);
        assert_eq!(release.tag, "dev-linux");
        assert!(release.prerelease);
    }
}
