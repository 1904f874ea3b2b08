//! Windowed search for the oldest commit on a branch.
//!
//! The commit listing has no "oldest first" ordering, only `since`/`until`
//! filters and a single page of at most 100 results. Creation time is used
//! as the anchor: one probe ending at creation tells whether history was
//! pushed with earlier dates, then windows of growing width are tried on
//! that side of the anchor until the result count stops changing.
//!
//! All search state lives in an [`Accumulator`] that each probe consumes
//! and returns, so a dropped future leaves nothing behind.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::github::GitHubApi;
use crate::types::{CommitSummary, RepositoryRef, SearchWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Nothing predates creation; widen `until` past it.
    Forward,
    /// History predates creation; widen `since` before it.
    Backward,
}

impl Direction {
    pub fn offsets(self, config: &SearchConfig) -> &[u32] {
        match self {
            Direction::Forward => &config.forward_offsets,
            Direction::Backward => &config.backward_offsets,
        }
    }

    /// Window reaching `days` away from `created_at`.
    pub fn window(self, created_at: DateTime<Utc>, days: u32) -> Result<SearchWindow> {
        let span = Duration::days(i64::from(days));
        let window = match self {
            Direction::Forward => created_at
                .checked_add_signed(span)
                .map(|until| SearchWindow::between(created_at, until)),
            Direction::Backward => created_at
                .checked_sub_signed(span)
                .map(|since| SearchWindow::between(since, created_at)),
        };
        window.ok_or_else(|| {
            Error::InvalidInput(format!("{} days from {} is out of range", days, created_at))
        })
    }

    /// Whether a probe returning `count` commits ends the widening, given the
    /// count of the probe before it.
    pub fn converged(self, previous: Option<usize>, count: usize) -> bool {
        let stable = count > 0 && previous == Some(count);
        match self {
            Direction::Forward => count > 0 || stable,
            Direction::Backward => stable,
        }
    }
}

/// Commits observed so far in one search, deduplicated by sha.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    commits: Vec<CommitSummary>,
    previous_count: Option<usize>,
    probes: usize,
}

impl Accumulator {
    /// Merge one probe's page. Returns how many commits were not seen before.
    pub fn absorb(mut self, batch: Vec<CommitSummary>) -> (Self, usize) {
        let count = batch.len();
        let mut fresh = 0;
        for commit in batch {
            if !self.commits.iter().any(|c| c.sha == commit.sha) {
                self.commits.push(commit);
                fresh += 1;
            }
        }
        self.previous_count = Some(count);
        self.probes += 1;
        (self, fresh)
    }

    pub fn previous_count(&self) -> Option<usize> {
        self.previous_count
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn oldest(&self) -> Option<&CommitSummary> {
        self.commits.iter().min_by(|a, b| chronological(a, b))
    }

    /// The earliest commit by author date; ties go to the smaller sha.
    pub fn select(mut self) -> Option<CommitSummary> {
        self.commits.sort_by(chronological);
        self.commits.into_iter().next()
    }
}

fn chronological(a: &CommitSummary, b: &CommitSummary) -> std::cmp::Ordering {
    a.author_date
        .cmp(&b.author_date)
        .then_with(|| a.sha.cmp(&b.sha))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Widen(Accumulator),
    Converged(Accumulator),
}

impl Step {
    pub fn into_parts(self) -> (Accumulator, bool) {
        match self {
            Step::Widen(acc) => (acc, false),
            Step::Converged(acc) => (acc, true),
        }
    }
}

/// Fold one widening probe into the accumulator.
pub fn step(direction: Direction, acc: Accumulator, batch: Vec<CommitSummary>) -> Step {
    let previous = acc.previous_count();
    let count = batch.len();
    let (acc, _) = acc.absorb(batch);
    if direction.converged(previous, count) {
        Step::Converged(acc)
    } else {
        Step::Widen(acc)
    }
}

struct Phase {
    acc: Accumulator,
    lower_bound: DateTime<Utc>,
    last_count: usize,
}

/// Find the oldest commit on `branch`, anchored on the repository's
/// creation time. `Ok(None)` means no commit fell in any window tried.
pub async fn locate(
    api: &dyn GitHubApi,
    repo: &RepositoryRef,
    branch: &str,
    created_at: DateTime<Utc>,
    config: &SearchConfig,
) -> Result<Option<CommitSummary>> {
    repo.validate()?;
    if branch.trim().is_empty() {
        return Err(Error::InvalidInput("branch must not be empty".to_string()));
    }
    config.validate()?;

    let probe = api
        .list_commits(repo, branch, SearchWindow::until(created_at), config.per_page)
        .await?;
    let direction = if probe.is_empty() {
        Direction::Forward
    } else {
        Direction::Backward
    };
    info!(
        "{}@{}: {} commits up to creation ({}), searching {:?}",
        repo,
        branch,
        probe.len(),
        created_at,
        direction
    );

    let phase = widen(api, repo, branch, created_at, direction, config).await?;
    if phase.acc.is_empty() {
        if direction == Direction::Backward {
            warn!(
                "{}@{}: history predates creation but none within {} days of it",
                repo,
                branch,
                direction.offsets(config).last().copied().unwrap_or_default()
            );
        }
        return Ok(None);
    }

    let acc = refine(api, repo, branch, phase, config).await?;
    debug!(
        "{}@{}: {} probes, {} distinct commits observed",
        repo,
        branch,
        acc.probes() + 1,
        acc.len()
    );
    Ok(acc.select())
}

async fn widen(
    api: &dyn GitHubApi,
    repo: &RepositoryRef,
    branch: &str,
    created_at: DateTime<Utc>,
    direction: Direction,
    config: &SearchConfig,
) -> Result<Phase> {
    let mut acc = Accumulator::default();
    let mut lower_bound = created_at;
    let mut last_count = 0;

    for &days in direction.offsets(config) {
        let window = direction.window(created_at, days)?;
        let batch = api
            .list_commits(repo, branch, window, config.per_page)
            .await?;
        debug!("{}@{}: {} -> {} commits", repo, branch, window, batch.len());

        lower_bound = window.since.unwrap_or(created_at);
        last_count = batch.len();

        let (next, done) = step(direction, acc, batch).into_parts();
        acc = next;
        if done {
            info!("{}@{}: converged at {} days", repo, branch, days);
            break;
        }
    }

    Ok(Phase {
        acc,
        lower_bound,
        last_count,
    })
}

/// A full page means the oldest part of the window may be cut off; walk
/// `until` back to the oldest commit seen until a page comes back short.
async fn refine(
    api: &dyn GitHubApi,
    repo: &RepositoryRef,
    branch: &str,
    phase: Phase,
    config: &SearchConfig,
) -> Result<Accumulator> {
    let Phase {
        mut acc,
        lower_bound,
        mut last_count,
    } = phase;

    let mut rounds = 0;
    while last_count >= usize::from(config.per_page) && rounds < config.max_refinements {
        let oldest = match acc.oldest() {
            Some(commit) if commit.author_date > lower_bound => commit.author_date,
            _ => break,
        };

        let window = SearchWindow::between(lower_bound, oldest);
        let batch = api
            .list_commits(repo, branch, window, config.per_page)
            .await?;
        debug!(
            "{}@{}: refine {} -> {} commits",
            repo,
            branch,
            window,
            batch.len()
        );

        last_count = batch.len();
        let (next, fresh) = acc.absorb(batch);
        acc = next;
        rounds += 1;
        if fresh == 0 {
            break;
        }
    }

    Ok(acc)
}
