use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use octocrab::{Octocrab, OctocrabBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CommitSummary, RepositoryRef, SearchWindow};

/// Repository fields as GitHub reports them, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryInfo {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// The two REST calls the search needs.
///
/// Implementations report failures through the [`Error`] taxonomy only:
/// `NotFound`, `RateLimited` or `TransientNetwork`.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_repository(&self, repo: &RepositoryRef) -> Result<RepositoryInfo>;

    /// One page of commits on `branch` within `window`, newest first.
    async fn list_commits(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        window: SearchWindow,
        per_page: u8,
    ) -> Result<Vec<CommitSummary>>;
}

#[derive(Debug, Clone)]
pub struct OctocrabApi {
    crab: Octocrab,
}

impl OctocrabApi {
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut builder = OctocrabBuilder::new();
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }
        Ok(Self {
            crab: builder.build()?,
        })
    }

    pub fn from_octocrab(crab: Octocrab) -> Self {
        Self { crab }
    }
}

#[derive(Serialize)]
struct ListCommitsQuery<'a> {
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<String>,
    per_page: u8,
}

#[derive(Deserialize)]
struct CommitPayload {
    sha: String,
    html_url: String,
    commit: GitCommitPayload,
    author: Option<AccountPayload>,
}

#[derive(Deserialize)]
struct GitCommitPayload {
    message: String,
    author: Option<SignaturePayload>,
    committer: Option<SignaturePayload>,
}

#[derive(Deserialize)]
struct SignaturePayload {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AccountPayload {
    login: String,
}

impl CommitPayload {
    fn into_summary(self) -> Result<CommitSummary> {
        let signature = self
            .commit
            .author
            .or(self.commit.committer)
            .ok_or_else(|| {
                Error::TransientNetwork(format!("commit {} has no author signature", self.sha))
            })?;

        Ok(CommitSummary {
            sha: self.sha,
            author_date: signature.date,
            author_name: signature.name,
            author_email: signature.email,
            author_login: self.author.map(|a| a.login),
            message: self.commit.message,
            html_url: self.html_url,
        })
    }
}

/// GitHub answers 409 "Git Repository is empty." when there is no git data
/// at all; that is an empty history, not a failure.
fn empty_repository(message: &str) -> bool {
    message.contains("Git Repository is empty")
}

fn listing_failure(message: &str) -> Result<Vec<CommitSummary>> {
    if empty_repository(message) {
        Ok(Vec::new())
    } else {
        Err(Error::from_github_message(message))
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl GitHubApi for OctocrabApi {
    async fn get_repository(&self, repo: &RepositoryRef) -> Result<RepositoryInfo> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        debug!("GET {}", route);

        match self.crab.get(&route, None::<&()>).await {
            Ok(info) => Ok(info),
            Err(e) => match Error::from(e) {
                Error::NotFound(_) => Err(Error::NotFound(format!(
                    "repository {} not found or it may be private",
                    repo
                ))),
                other => Err(other),
            },
        }
    }

    async fn list_commits(
        &self,
        repo: &RepositoryRef,
        branch: &str,
        window: SearchWindow,
        per_page: u8,
    ) -> Result<Vec<CommitSummary>> {
        let route = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        let query = ListCommitsQuery {
            sha: branch,
            since: window.since.map(timestamp),
            until: window.until.map(timestamp),
            per_page,
        };
        debug!("GET {} sha={} window={}", route, branch, window);

        match self.crab.get::<Vec<CommitPayload>, _, _>(&route, Some(&query)).await {
            Ok(commits) => commits.into_iter().map(CommitPayload::into_summary).collect(),
            Err(octocrab::Error::GitHub { source, .. }) => listing_failure(&source.message),
            Err(e) => Err(e.into()),
        }
    }
}
