//! GitHub REST API session

use super::{Credential, ProviderError, ProviderSession};
use crate::catalog::{ProviderTag, RepositoryRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("reposeed/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: usize = 100;
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubRepo {
    name: String,
    ssh_url: String,
}

/// An authenticated GitHub session
pub struct GitHubSession {
    client: Client,
    token: String,
    login: String,
    api_root: String,
}

impl GitHubSession {
    /// Authenticates against api.github.com and resolves the account login
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
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth("token rejected by GitHub".to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Api(format!("GET /user returned {}", status)));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        Ok(Self {
            client,
            token,
            login: user.login,
            api_root: api_root.to_string(),
        })
    }
}

#[async_trait]
impl ProviderSession for GitHubSession {
    fn tag(&self) -> ProviderTag {
        ProviderTag::GitHub
    }

    fn identity_marker(&self) -> &str {
        &self.login
    }

    async fn register_key(&self, title: &str, key: &str) -> Result<(), ProviderError> {
        let body = serde_json::json!({ "title": title, "key": key });
        let response = self
            .client
            .post(format!("{}/user/keys", self.api_root))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            // GitHub answers 422 when the key content is already registered
            Err(ProviderError::Registration(
                "key is already registered or invalid".to_string(),
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
                "{}/user/repos?affiliation=owner&per_page={}&page={}",
                self.api_root, PAGE_SIZE, page
            );
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| ProviderError::Api(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::Api(format!(
                    "GET /user/repos returned {}",
                    status
                )));
            }

            let batch: Vec<GitHubRepo> = response
                .json()
                .await
                .map_err(|e| ProviderError::Api(e.to_string()))?;
            let batch_len = batch.len();

            records.extend(batch.into_iter().map(|repo| RepositoryRecord {
                name: repo.name,
                clone_url: repo.ssh_url,
                provider: ProviderTag::GitHub,
            }));

            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}
