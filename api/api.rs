use anyhow::anyhow;
use log::{info, warn};
use url::form_urlencoded;
use vercel_runtime::{run, Body, Error, Request, Response, StatusCode};

use first_commit::{config, find_first_commit, ErrorKind, OctocrabApi, RepositoryRef, SearchConfig};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let h = |req: Request| async move {
        match handler(req).await {
            Ok(res) => Ok(res),
            Err(e) => {
                let status = e
                    .downcast_ref::<first_commit::Error>()
                    .map_or(StatusCode::INTERNAL_SERVER_ERROR, |e| status_for(e.kind()));
                warn!("{}: {}", status, e);
                Ok(Response::builder()
                    .status(status)
                    .body(Body::from(format!("Error: {}", e)))?)
            }
        }
    };

    run(h).await
}

/// `GET /<owner>/<repo>[?branch=<name>]` redirects to the first commit.
pub async fn handler(req: Request) -> anyhow::Result<Response<Body>> {
    info!("Request: {:?}", req);

    let repo = {
        let paths: Vec<&str> = req.uri().path().split('/').filter(|s| !s.is_empty()).collect();
        if paths.len() < 2 {
            let usage = "usage: /<owner>/<repo>".to_string();
            return Err(first_commit::Error::InvalidInput(usage).into());
        }
        RepositoryRef::new(paths[paths.len() - 2], paths[paths.len() - 1])
    };
    let branch = req.uri().query().and_then(branch_param);

    let config = SearchConfig::from_env().map_err(|e| anyhow!("server configuration: {}", e))?;
    let api = OctocrabApi::new(config::github_token())?;
    let report = find_first_commit(&api, &repo, branch.as_deref(), &config).await?;

    match report.commit {
        Some(commit) => Ok(Response::builder()
            .status(StatusCode::FOUND)
            .header("Location", commit.html_url)
            .body(().into())?),
        None => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from(format!(
                "No commits found on {}@{}",
                report.repository, report.branch
            )))?),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::TransientNetwork => StatusCode::BAD_GATEWAY,
    }
}

fn branch_param(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "branch")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
