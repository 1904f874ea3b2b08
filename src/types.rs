use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Owner/name pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("owner", &self.owner), ("name", &self.name)] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "repository {} must not be empty",
                    field
                )));
            }
            if value.contains('/') || value.chars().any(char::is_whitespace) {
                return Err(Error::InvalidInput(format!(
                    "repository {} {:?} contains '/' or whitespace",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Parse `owner/name`, `github.com/owner/name` or a full GitHub URL.
    ///
    /// A `/tree/<branch>` path after the repository yields a branch hint;
    /// every other trailing segment is ignored.
    pub fn parse_location(input: &str) -> Result<(Self, Option<String>)> {
        let path = input
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_start_matches("github.com")
            .trim_matches('/');
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "expected <owner>/<repo> or a GitHub URL, got {:?}",
                input
            )));
        }

        let name = segments[1].trim_end_matches(".git");
        let repo = Self::new(segments[0], name);
        repo.validate()?;

        let branch = match segments.get(2..) {
            Some(["tree", rest @ ..]) if !rest.is_empty() => Some(rest.join("/")),
            _ => None,
        };

        Ok((repo, branch))
    }
}

impl FromStr for RepositoryRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_location(s).map(|(repo, _)| repo)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What the resolver learns about a repository. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub created_at: DateTime<Utc>,
    pub default_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub author_date: DateTime<Utc>,
    pub author_name: String,
    pub author_email: String,
    /// GitHub account of the author, when the commit email maps to one.
    pub author_login: Option<String>,
    pub message: String,
    pub html_url: String,
}

impl CommitSummary {
    /// First line of the commit message.
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Time range passed to the commit listing. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl SearchWindow {
    pub fn until(until: DateTime<Utc>) -> Self {
        Self {
            since: None,
            until: Some(until),
        }
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| at >= since) && self.until.map_or(true, |until| at <= until)
    }
}

impl fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| "..".to_string())
        };
        write!(f, "[{}, {}]", bound(self.since), bound(self.until))
    }
}

/// Outcome of a full lookup: the metadata it was anchored on and the
/// commit, if the branch has any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstCommitReport {
    pub repository: RepositoryRef,
    pub branch: String,
    pub created_at: DateTime<Utc>,
    pub commit: Option<CommitSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    #[test]
    fn parse_plain_and_urls() {
        for input in [
            "rust-lang/rust",
            "github.com/rust-lang/rust",
            "https://github.com/rust-lang/rust",
            "https://github.com/rust-lang/rust/",
            "https://www.github.com/rust-lang/rust.git",
            "https://github.com/rust-lang/rust/issues/1?q=1",
        ] {
            let (repo, branch) = RepositoryRef::parse_location(input).unwrap();
            assert_eq!(repo, RepositoryRef::new("rust-lang", "rust"), "{}", input);
            assert_eq!(branch, None, "{}", input);
        }
    }

    #[test]
    fn parse_tree_branch() {
        let (repo, branch) =
            RepositoryRef::parse_location("https://github.com/octo/hello/tree/feature/x").unwrap();
        assert_eq!(repo.to_string(), "octo/hello");
        assert_eq!(branch.as_deref(), Some("feature/x"));
    }

    #[test]
    fn parse_rejects_incomplete() {
        for input in ["", "octo", "https://github.com/", "https://github.com/octo"] {
            let err = RepositoryRef::parse_location(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{}", input);
        }
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(RepositoryRef::new("", "x").validate().is_err());
        assert!(RepositoryRef::new("x", "  ").validate().is_err());
        assert!(RepositoryRef::new("a b", "x").validate().is_err());
        assert!(RepositoryRef::new("a", "b").validate().is_ok());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let since = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2021, 6, 3, 0, 0, 0).unwrap();
        let window = SearchWindow::between(since, until);
        assert!(window.contains(since));
        assert!(window.contains(until));
        assert!(!window.contains(until + chrono::Duration::seconds(1)));
        assert!(SearchWindow::until(until).contains(since - chrono::Duration::days(400)));
        assert_eq!(
            window.to_string(),
            "[2021-06-01T00:00:00Z, 2021-06-03T00:00:00Z]"
        );
    }
}
