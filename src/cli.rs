use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use first_commit::{
    find_first_commit, ErrorKind, FirstCommitReport, OctocrabApi, RepositoryRef, SearchConfig,
};

/// Print the first commit of a GitHub repository.
#[derive(Debug, Parser)]
#[command(name = "first-commit", version)]
struct Args {
    /// `<owner>/<repo>` or a github.com URL
    repository: String,

    /// Branch to search instead of the repository's default
    #[arg(short, long)]
    branch: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Day offsets after creation, e.g. `2,10,20,30`
    #[arg(long, value_delimiter = ',')]
    forward_offsets: Option<Vec<u32>>,

    /// Day offsets before creation, e.g. `2,5,10,15,20`
    #[arg(long, value_delimiter = ',')]
    backward_offsets: Option<Vec<u32>>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = match e.downcast_ref::<first_commit::Error>().map(|e| e.kind()) {
                Some(ErrorKind::InvalidInput) => 2,
                Some(ErrorKind::NotFound) => 3,
                Some(ErrorKind::RateLimited) => 4,
                Some(ErrorKind::TransientNetwork) => 5,
                None => 1,
            };
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let (repo, url_branch) = RepositoryRef::parse_location(&args.repository)?;
    let branch = args.branch.or(url_branch);

    let mut config = SearchConfig::from_env()?;
    if let Some(offsets) = args.forward_offsets {
        config.forward_offsets = offsets;
    }
    if let Some(offsets) = args.backward_offsets {
        config.backward_offsets = offsets;
    }

    let api = OctocrabApi::new(args.token.filter(|t| !t.is_empty()))?;
    let report = find_first_commit(&api, &repo, branch.as_deref(), &config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &FirstCommitReport) {
    match &report.commit {
        Some(commit) => {
            println!("{}", commit.html_url);
            println!("sha:     {}", commit.sha);
            println!("date:    {}", commit.author_date.to_rfc3339());
            match &commit.author_login {
                Some(login) => println!(
                    "author:  {} <{}> (@{})",
                    commit.author_name, commit.author_email, login
                ),
                None => println!("author:  {} <{}>", commit.author_name, commit.author_email),
            }
            println!("message: {}", commit.headline());
        }
        None => println!(
            "No commits found on {}@{} near its creation ({})",
            report.repository,
            report.branch,
            report.created_at.to_rfc3339()
        ),
    }
}
