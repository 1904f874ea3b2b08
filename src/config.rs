use std::env;

use crate::error::{Error, Result};

pub const DEFAULT_FORWARD_OFFSETS: [u32; 4] = [2, 10, 20, 30];
pub const DEFAULT_BACKWARD_OFFSETS: [u32; 5] = [2, 5, 10, 15, 20];

/// Largest page the commit listing serves.
pub const MAX_PER_PAGE: u8 = 100;
pub const DEFAULT_MAX_REFINEMENTS: usize = 3;
/// Widest window tried on either side of creation, about a century.
pub const MAX_OFFSET_DAYS: u32 = 36_500;

/// Used when the repository metadata carries no default branch.
pub const FALLBACK_BRANCH: &str = "main";

pub const FORWARD_OFFSETS_VAR: &str = "FIRST_COMMIT_FORWARD_OFFSETS";
pub const BACKWARD_OFFSETS_VAR: &str = "FIRST_COMMIT_BACKWARD_OFFSETS";
pub const PER_PAGE_VAR: &str = "FIRST_COMMIT_PER_PAGE";
pub const MAX_REFINEMENTS_VAR: &str = "FIRST_COMMIT_MAX_REFINEMENTS";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Tuning knobs of the windowed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Day offsets after creation tried when nothing predates it.
    pub forward_offsets: Vec<u32>,
    /// Day offsets before creation tried when something predates it.
    pub backward_offsets: Vec<u32>,
    pub per_page: u8,
    /// Extra narrowing probes allowed when a window filled a whole page.
    pub max_refinements: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            forward_offsets: DEFAULT_FORWARD_OFFSETS.to_vec(),
            backward_offsets: DEFAULT_BACKWARD_OFFSETS.to_vec(),
            per_page: MAX_PER_PAGE,
            max_refinements: DEFAULT_MAX_REFINEMENTS,
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by any `FIRST_COMMIT_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = read_var(FORWARD_OFFSETS_VAR) {
            config.forward_offsets = parse_offsets(&value)?;
        }
        if let Some(value) = read_var(BACKWARD_OFFSETS_VAR) {
            config.backward_offsets = parse_offsets(&value)?;
        }
        if let Some(value) = read_var(PER_PAGE_VAR) {
            config.per_page = value.trim().parse().map_err(|_| {
                Error::InvalidInput(format!("{} must be a number, got {:?}", PER_PAGE_VAR, value))
            })?;
        }
        if let Some(value) = read_var(MAX_REFINEMENTS_VAR) {
            config.max_refinements = value.trim().parse().map_err(|_| {
                Error::InvalidInput(format!(
                    "{} must be a number, got {:?}",
                    MAX_REFINEMENTS_VAR, value
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_offsets("forward", &self.forward_offsets)?;
        check_offsets("backward", &self.backward_offsets)?;
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(Error::InvalidInput(format!(
                "per_page must be within 1..={}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }
        Ok(())
    }
}

/// Personal token from `GITHUB_TOKEN`; unset or blank means anonymous.
pub fn github_token() -> Option<String> {
    read_var(TOKEN_VAR)
}

/// Parse a comma-separated list of day offsets such as `2,10,20,30`.
pub fn parse_offsets(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| Error::InvalidInput(format!("invalid day offset {:?}", s)))
        })
        .collect()
}

fn check_offsets(direction: &str, offsets: &[u32]) -> Result<()> {
    if offsets.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} offsets must not be empty",
            direction
        )));
    }
    if offsets[0] == 0 || offsets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidInput(format!(
            "{} offsets must be positive and strictly ascending, got {:?}",
            direction, offsets
        )));
    }
    if let Some(&widest) = offsets.last().filter(|&&d| d > MAX_OFFSET_DAYS) {
        return Err(Error::InvalidInput(format!(
            "{} offsets must not exceed {} days, got {}",
            direction, MAX_OFFSET_DAYS, widest
        )));
    }
    Ok(())
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forward_offsets, vec![2, 10, 20, 30]);
        assert_eq!(config.backward_offsets, vec![2, 5, 10, 15, 20]);
        assert_eq!(config.per_page, 100);
    }

    #[test]
    fn parses_offset_lists() {
        assert_eq!(parse_offsets("2, 5,10").unwrap(), vec![2, 5, 10]);
        assert_eq!(parse_offsets("7,").unwrap(), vec![7]);
        assert!(parse_offsets("2,x").is_err());
        assert!(parse_offsets("-1").is_err());
    }

    #[test]
    fn rejects_bad_sequences() {
        let mut config = SearchConfig::default();
        config.forward_offsets = vec![];
        assert!(config.validate().is_err());

        config.forward_offsets = vec![2, 2, 3];
        assert!(config.validate().is_err());

        config.forward_offsets = vec![0, 1];
        assert!(config.validate().is_err());

        config.forward_offsets = vec![10, 5];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_offsets_past_the_horizon() {
        let mut config = SearchConfig::default();
        config.forward_offsets = vec![2, 4_000_000_000];
        assert!(config.validate().is_err());

        config.forward_offsets = vec![2, MAX_OFFSET_DAYS];
        assert!(config.validate().is_ok());

        config.backward_offsets = vec![MAX_OFFSET_DAYS + 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_page_size() {
        let mut config = SearchConfig::default();
        config.per_page = 0;
        assert!(config.validate().is_err());
        config.per_page = 101;
        assert!(config.validate().is_err());
        config.per_page = 1;
        assert!(config.validate().is_ok());
    }
}
