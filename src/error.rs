use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("GitHub request failed: {0}")]
    TransientNetwork(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Discriminant of [`Error`], for callers mapping failures to exit codes or
/// HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    RateLimited,
    TransientNetwork,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::RateLimited(_) => ErrorKind::RateLimited,
            Error::TransientNetwork(_) => ErrorKind::TransientNetwork,
        }
    }

    /// Classify the message GitHub put in an error body.
    ///
    /// 404 bodies read "Not Found" (or "No commit found for SHA: .." for an
    /// unknown branch); primary and secondary throttling bodies both mention
    /// "rate limit". Anything else is treated as transient.
    pub fn from_github_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("rate limit") {
            Error::RateLimited(message.to_string())
        } else if lower == "not found" || lower.starts_with("no commit found") {
            Error::NotFound(message.to_string())
        } else {
            Error::TransientNetwork(message.to_string())
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => Error::from_github_message(&source.message),
            other => Error::TransientNetwork(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_bodies() {
        assert_eq!(
            Error::from_github_message("Not Found").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::from_github_message("No commit found for SHA: nope").kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn rate_limit_bodies() {
        let primary = "API rate limit exceeded for 203.0.113.7. (But here's the good news: \
                       Authenticated requests get a higher rate limit.)";
        assert_eq!(
            Error::from_github_message(primary).kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            Error::from_github_message("You have exceeded a secondary rate limit.").kind(),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn everything_else_is_transient() {
        assert_eq!(
            Error::from_github_message("Server Error").kind(),
            ErrorKind::TransientNetwork
        );
        assert_eq!(
            Error::from_github_message("Bad credentials").kind(),
            ErrorKind::TransientNetwork
        );
    }

    #[test]
    fn messages_are_distinct() {
        let errors = [
            Error::InvalidInput("x".into()),
            Error::NotFound("x".into()),
            Error::RateLimited("x".into()),
            Error::TransientNetwork("x".into()),
        ];
        let messages: std::collections::HashSet<String> =
            errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), errors.len());
    }
}
