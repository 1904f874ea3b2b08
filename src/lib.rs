//! Find the first commit of a GitHub repository through the REST API.
//!
//! The REST commit listing can't be asked for its oldest entry, and walking
//! every page would burn through the rate limit on large histories. Instead
//! the repository's creation time anchors a handful of time-window probes;
//! see [`locator`] for how they are chosen.

pub mod config;
pub mod error;
pub mod github;
pub mod locator;
pub mod resolver;
pub mod types;

use log::info;

pub use config::SearchConfig;
pub use error::{Error, ErrorKind, Result};
pub use github::{GitHubApi, OctocrabApi, RepositoryInfo};
pub use locator::locate;
pub use resolver::resolve;
pub use types::{CommitSummary, FirstCommitReport, RepositoryMetadata, RepositoryRef, SearchWindow};

/// Resolve `repo` and search its branch for the first commit.
///
/// `branch` overrides the repository's default branch. Metadata is fetched
/// fresh on every call.
pub async fn find_first_commit(
    api: &dyn GitHubApi,
    repo: &RepositoryRef,
    branch: Option<&str>,
    config: &SearchConfig,
) -> Result<FirstCommitReport> {
    config.validate()?;
    let metadata = resolve(api, repo).await?;
    let branch = branch
        .map(str::to_string)
        .unwrap_or(metadata.default_branch);

    let commit = locate(api, repo, &branch, metadata.created_at, config).await?;
    match &commit {
        Some(c) => info!("{}@{}: first commit {}", repo, branch, c.sha),
        None => info!("{}@{}: no commits found", repo, branch),
    }

    Ok(FirstCommitReport {
        repository: repo.clone(),
        branch,
        created_at: metadata.created_at,
        commit,
    })
}
