use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::json;

use crate::config::MergeMethod;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

pub struct GitHubPlatform {
    client: Octocrab,
}

impl GitHubPlatform {
    /// Build a token-authenticated client. `api_url` points at a GitHub
    /// Enterprise Server instance; `None` talks to api.github.com.
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| AppError::Config(format!("Invalid GitHub API URL {url}: {e}")))?;
        }
        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self { client })
    }

    /// Like [`GitHubPlatform::new`], honouring the runner's `GITHUB_API_URL`.
    pub fn from_env(token: &str) -> Result<Self> {
        let api_url = std::env::var("GITHUB_API_URL")
            .ok()
            .filter(|url| !url.is_empty());
        Self::new(token, api_url.as_deref())
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<PullRequestStatus> {
        let pr = self.client.pulls(owner, repo).get(pr_number).await?;
        let status = mapper::map_pull_request_status(&pr);

        tracing::debug!(
            pr_number,
            mergeable = ?status.mergeable,
            mergeable_state = ?status.mergeable_state,
            "Fetched pull request"
        );
        Ok(status)
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        method: MergeMethod,
    ) -> Result<MergeOutcome> {
        // Raw call so the response keeps every field GitHub sends, in order
        let url = format!("/repos/{owner}/{repo}/pulls/{pr_number}/merge");
        let body = json!({ "merge_method": method.as_str() });
        let response: serde_json::Value = self.client.put(&url, Some(&body)).await?;

        mapper::map_merge_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Serve the same canned JSON response to every request; returns the base URL.
    async fn stub_github(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }

    /// Drain headers and body so the client sees a clean response.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_api_error_message_is_verbatim() {
        let url = stub_github(
            "401 Unauthorized",
            r#"{"message":"Bad credentials","documentation_url":"https://docs.github.com/rest"}"#,
        )
        .await;
        let platform = GitHubPlatform::new("tok", Some(&url)).unwrap();

        let err = platform
            .get_pull_request("owner", "repo", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GitHubApi(_)));
        assert_eq!(err.to_string(), "Bad credentials");
    }

    #[tokio::test]
    async fn test_merge_rejection_message_is_verbatim() {
        let url = stub_github(
            "405 Method Not Allowed",
            r#"{"message":"Pull Request is not mergeable","documentation_url":"https://docs.github.com/rest"}"#,
        )
        .await;
        let platform = GitHubPlatform::new("tok", Some(&url)).unwrap();

        let err = platform
            .merge_pull_request("owner", "repo", 1, MergeMethod::Squash)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Pull Request is not mergeable");
    }

    #[tokio::test]
    async fn test_merge_response_keeps_field_order() {
        let url = stub_github(
            "200 OK",
            r#"{"sha":"6dcb09b5b57875f334f61aebed695e2e4193db5e","merged":true,"message":"Pull Request successfully merged"}"#,
        )
        .await;
        let platform = GitHubPlatform::new("tok", Some(&url)).unwrap();

        let outcome = platform
            .merge_pull_request("owner", "repo", 1, MergeMethod::Merge)
            .await
            .unwrap();

        assert!(outcome.merged());
        assert_eq!(outcome.sha(), Some("6dcb09b5b57875f334f61aebed695e2e4193db5e"));
        let keys: Vec<&str> = outcome.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["sha", "merged", "message"]);
    }
}
