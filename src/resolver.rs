use log::debug;

use crate::config::FALLBACK_BRANCH;
use crate::error::Result;
use crate::github::GitHubApi;
use crate::types::{RepositoryMetadata, RepositoryRef};

/// Fetch the creation time and default branch of `repo`.
///
/// Input is validated before any request is made. Failures from the API
/// are returned as-is; nothing is retried or cached.
pub async fn resolve(api: &dyn GitHubApi, repo: &RepositoryRef) -> Result<RepositoryMetadata> {
    repo.validate()?;

    let info = api.get_repository(repo).await?;
    let default_branch = info
        .default_branch
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_BRANCH.to_string());

    debug!(
        "{} created at {}, default branch {}",
        repo, info.created_at, default_branch
    );

    Ok(RepositoryMetadata {
        created_at: info.created_at,
        default_branch,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::github::RepositoryInfo;
    use crate::types::{CommitSummary, SearchWindow};

    struct StaticRepo {
        reply: Result<RepositoryInfo>,
        calls: AtomicUsize,
    }

    impl StaticRepo {
        fn new(reply: Result<RepositoryInfo>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GitHubApi for StaticRepo {
        async fn get_repository(&self, _repo: &RepositoryRef) -> Result<RepositoryInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        async fn list_commits(
            &self,
            _repo: &RepositoryRef,
            _branch: &str,
            _window: SearchWindow,
            _per_page: u8,
        ) -> Result<Vec<CommitSummary>> {
            unreachable!("resolver never lists commits")
        }
    }

    fn info(branch: Option<&str>) -> RepositoryInfo {
        RepositoryInfo {
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            default_branch: branch.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn returns_default_branch() {
        let api = StaticRepo::new(Ok(info(Some("trunk"))));
        let meta = resolve(&api, &RepositoryRef::new("o", "r")).await.unwrap();
        assert_eq!(meta.default_branch, "trunk");
        assert_eq!(meta.created_at.to_rfc3339(), "2020-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn falls_back_to_main() {
        for branch in [None, Some("")] {
            let api = StaticRepo::new(Ok(info(branch)));
            let meta = resolve(&api, &RepositoryRef::new("o", "r")).await.unwrap();
            assert_eq!(meta.default_branch, "main");
        }
    }

    #[tokio::test]
    async fn invalid_input_skips_the_network() {
        let api = StaticRepo::new(Ok(info(None)));
        let err = resolve(&api, &RepositoryRef::new("", "r")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_keep_their_kind() {
        for err in [
            Error::NotFound("gone".into()),
            Error::RateLimited("slow down".into()),
            Error::TransientNetwork("reset".into()),
        ] {
            let api = StaticRepo::new(Err(err.clone()));
            let got = resolve(&api, &RepositoryRef::new("o", "r")).await.unwrap_err();
            assert_eq!(got, err);
            assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        }
    }
}
