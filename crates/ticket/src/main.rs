//! One-shot issue filer: builds a ticket payload and POSTs it to the
//! tracker's REST API with basic authentication. Re-running files a
//! duplicate ticket; there is no idempotency key.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

mod payload;

use payload::IssuePayload;

#[derive(Parser, Debug)]
#[command(name = "mosaiq-ticket")]
#[command(about = "File an incident ticket via the tracker's REST API", long_about = None)]
struct Args {
    /// User email for API authentication
    #[arg(long)]
    email: String,

    /// Tracker site URL, e.g. https://example.atlassian.net
    ///
    /// A missing value is passed through empty and surfaces as a failed
    /// request report, not a startup validation error.
    #[arg(long, env = "JSM_SITE", default_value = "")]
    site: String,

    /// API token paired with the email
    #[arg(long, env = "API_TOKEN", hide_env_values = true, default_value = "")]
    api_token: String,

    /// Project the ticket is filed against
    #[arg(long, env = "PROJECT_KEY", default_value = "")]
    project_key: String,

    /// Ticket summary
    #[arg(long, default_value = "Incident filed from the metrics gateway")]
    summary: String,

    /// Ticket description text
    #[arg(long, default_value = "This incident was created via the API.")]
    description: String,
}

/// Outcome of one create call. A rejected ticket is still a normal program
/// outcome, not a process failure.
#[derive(Debug)]
enum Outcome {
    Created(String),
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize, Serialize)]
struct CreatedIssue {
    key: String,
}

async fn create_issue(
    client: &reqwest::Client,
    site: &str,
    email: &str,
    api_token: &str,
    payload: &IssuePayload,
) -> Result<Outcome> {
    let url = format!("{}/rest/api/3/issue", site.trim_end_matches('/'));

    let response = client
        .post(&url)
        .basic_auth(email, Some(api_token))
        .header("Accept", "application/json")
        .json(payload)
        .send()
        .await
        .context("Failed to reach the tracker")?;

    let status = response.status();
    if status.as_u16() == 201 {
        let created: CreatedIssue = response
            .json()
            .await
            .context("Created response had no issue key")?;
        Ok(Outcome::Created(created.key))
    } else {
        let body = response.text().await.unwrap_or_default();
        Ok(Outcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mosaiq_ticket=info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let payload = IssuePayload::incident(&args.project_key, &args.summary, &args.description);
    let client = reqwest::Client::new();

    // Any failure is a printed report; the process exits normally either way.
    match create_issue(&client, &args.site, &args.email, &args.api_token, &payload).await {
        Ok(Outcome::Created(key)) => println!("Incident created successfully: {key}"),
        Ok(Outcome::Rejected { status, body }) => println!("Error: {status} {body}"),
        Err(err) => println!("Error: {err:#}"),
    }

    Ok(())
}
