// GitHub REST client for the git-triggered Amplify handler
//
// Pushes an empty commit (parent's tree, parent = branch head) through the
// git data API and registers repository webhooks.

use anyhow::Context;
use async_trait::async_trait;
use deployhooks_config::GitConfig;
use deployhooks_core::{CommitRef, Result, ServiceError, SourceControl};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "github";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    /// `{api_url}/repos/{owner}/{repository}`
    repo_url: String,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct GitCommit {
    sha: String,
    tree: GitObject,
}

#[derive(Serialize)]
struct NewCommit<'a> {
    message: &'a str,
    tree: &'a str,
    parents: [&'a str; 1],
}

#[derive(Serialize)]
struct UpdateRef<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Serialize)]
struct NewHook<'a> {
    name: &'static str,
    active: bool,
    events: &'a [&'a str],
    config: HookConfig<'a>,
}

#[derive(Serialize)]
struct HookConfig<'a> {
    url: &'a str,
    content_type: &'static str,
}

impl GitHubClient {
    pub fn new(config: &GitConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("deployhooks"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .context("Repository access token contains invalid characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            repo_url: format!(
                "{}/repos/{}/{}",
                config.api_url.trim_end_matches('/'),
                config.owner,
                config.repository
            ),
        })
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.repo_url, path);
        debug!(%method, %url, "GitHub request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::api(SERVICE, format!("{} failed: {}", path, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::not_found(SERVICE, path));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::api(
                SERVICE,
                format!("{} returned {}: {}", path, status, text),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            ServiceError::api(SERVICE, format!("{} returned unexpected body: {}", path, e))
        })
    }
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn latest_commit(&self, branch: &str) -> Result<CommitRef> {
        let head: GitRef = self
            .request::<(), _>(Method::GET, &format!("git/ref/heads/{}", branch), None)
            .await?;
        let commit: GitCommit = self
            .request::<(), _>(Method::GET, &format!("git/commits/{}", head.object.sha), None)
            .await?;

        Ok(CommitRef {
            sha: commit.sha,
            tree: commit.tree.sha,
        })
    }

    async fn create_commit(
        &self,
        branch: &str,
        parent: &CommitRef,
        message: &str,
    ) -> Result<String> {
        let body = NewCommit {
            message,
            tree: &parent.tree,
            parents: [&parent.sha],
        };
        let commit: GitObject = self.request(Method::POST, "git/commits", Some(&body)).await?;

        let update = UpdateRef {
            sha: &commit.sha,
            force: false,
        };
        let _: serde_json::Value = self
            .request(Method::PATCH, &format!("git/refs/heads/{}", branch), Some(&update))
            .await?;

        Ok(commit.sha)
    }

    async fn create_webhook(&self, url: &str, events: &[&str]) -> Result<()> {
        let body = NewHook {
            name: "web",
            active: true,
            events,
            config: HookConfig {
                url,
                content_type: "json",
            },
        };
        let _: serde_json::Value = self.request(Method::POST, "hooks", Some(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&GitConfig {
            api_url: format!("{}/", server.uri()),
            owner: "acme".to_string(),
            repository: "webapp".to_string(),
            branch: "main".to_string(),
            token: "ghp_secret".to_string(),
            commit_message: "Trigger Amplify deployment".to_string(),
            register_webhook: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_latest_commit_reads_ref_then_commit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/webapp/git/ref/heads/main"))
            .and(header("authorization", "Bearer ghp_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/main",
                "object": { "sha": "abc123", "type": "commit" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/webapp/git/commits/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "abc123",
                "tree": { "sha": "tree456" },
                "message": "Previous commit"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let head = client(&server).latest_commit("main").await.unwrap();
        assert_eq!(
            head,
            CommitRef {
                sha: "abc123".to_string(),
                tree: "tree456".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_commit_moves_branch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/webapp/git/commits"))
            .and(body_json(json!({
                "message": "Trigger Amplify deployment",
                "tree": "tree456",
                "parents": ["abc123"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "def789" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/webapp/git/refs/heads/main"))
            .and(body_json(json!({ "sha": "def789", "force": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/main",
                "object": { "sha": "def789" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let parent = CommitRef {
            sha: "abc123".to_string(),
            tree: "tree456".to_string(),
        };
        let sha = client(&server)
            .create_commit("main", &parent, "Trigger Amplify deployment")
            .await
            .unwrap();
        assert_eq!(sha, "def789");
    }

    #[tokio::test]
    async fn test_missing_branch_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/webapp/git/ref/heads/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).latest_commit("gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_api_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/webapp/hooks"))
            .and(body_json(json!({
                "name": "web",
                "active": true,
                "events": ["push"],
                "config": { "url": "https://hooks.example.com/x", "content_type": "json" }
            })))
            .respond_with(ResponseTemplate::new(422).set_body_string("Hook already exists"))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_webhook("https://hooks.example.com/x", &["push"])
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("Hook already exists"));
    }
}
