//! GitLab REST API session

use super::{Credential, ProviderError, ProviderSession};
use crate::catalog::{ProviderTag, RepositoryRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const API_ROOT: &str = "https://gitlab.com/api/v4";
const USER_AGENT: &str = concat!("reposeed/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: usize = 100;
const HTTP_TIMEOUT_SECS: u64 = 30;
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
}

#[derive(Deserialize)]
struct GitLabProject {
    path: String,
    ssh_url_to_repo: String,
}

/// An authenticated GitLab session
pub struct GitLabSession {
    client: Client,
    token: String,
    username: String,
    api_root: String,
}

impl GitLabSession {
    /// Authenticates against gitlab.com and resolves the account username
    pub async fn open(credential: Credential) -> Result<Self, ProviderError> {
        Self::open_at(API_ROOT, credential).await
    }

    /// Same as `open` but against a custom API root (used by tests)
    pub async fn open_at(api_root: &str, credential: Credential) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Api(e.to_string()))?;
        let token = credential.expose().to_string();

        let response = client
            .get(format!("{}/user", api_root))
            .header(TOKEN_HEADER, &token)
            .send()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth("token rejected by GitLab".to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("GET /user returned {}", status)));
        }

        let user: GitLabUser = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        Ok(Self {
            client,
            token,
            username: user.username,
            api_root: api_root.to_string(),
        })
    }
}

#[async_trait]
impl ProviderSession for GitLabSession {
    fn tag(&self) -> ProviderTag {
        ProviderTag::GitLab
    }

    fn identity_marker(&self) -> &str {
        &self.username
    }

    async fn register_key(&self, title: &str, key: &str) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "title": title, "key": key });
        let response = self
            .client
            .post(format!("{}/user/keys", self.api_root))
            .header(TOKEN_HEADER, &self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::BAD_REQUEST {
            // GitLab answers 400 "has already been taken" for duplicate keys
            Err(ProviderError::Registration(
                "key has already been taken".to_string(),
            ))
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(ProviderError::Auth(format!(
                "POST /user/keys returned {}",
                status
            )))
        } else {
            Err(ProviderError::Api(format!(
                "POST /user/keys returned {}",
                status
            )))
        }
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryRecord>, ProviderError> {
        let mut records = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!(
                "{}/projects?owned=true&per_page={}&page={}",
                self.api_root, PAGE_SIZE, page
            );
            let response = self
                .client
                .get(&url)
                .header(TOKEN_HEADER, &self.token)
                .send()
                .await
                .map_err(|e| ProviderError::Api(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::Api(format!(
                    "GET /projects returned {}",
                    status
                )));
            }

            let batch: Vec<GitLabProject> = response
                .json()
                .await
                .map_err(|e| ProviderError::Api(e.to_string()))?;
            let batch_len = batch.len();

            records.extend(batch.into_iter().map(|project| RepositoryRecord {
                name: project.path,
                clone_url: project.ssh_url_to_repo,
                provider: ProviderTag::GitLab,
            }));

            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}
