use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(name = "site")]
#[command(about = "Site CLI - Inspect posts and view counters via HTTP", long_about = None)]
struct Cli {
    /// Base URL of the site server
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Views(ViewsCommands),
    #[command(subcommand)]
    Posts(PostsCommands),
}

#[derive(Subcommand)]
enum ViewsCommands {
    /// Show view counts for one or more slugs
    Get {
        /// Post slugs (lowercase, alphanumeric, hyphens only)
        #[arg(required = true)]
        slugs: Vec<String>,
    },
    /// Record a single view
    Hit {
        /// Post slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum PostsCommands {
    /// List published posts with their view counts
    List,
}

#[derive(Deserialize, Debug)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize, Debug)]
struct ViewsResponse {
    views: u64,
}

#[derive(Deserialize, Debug)]
struct BatchViewsResponse {
    views: HashMap<String, u64>,
}

#[derive(Deserialize, Debug)]
struct PostSummary {
    slug: String,
    title: String,
    date: NaiveDate,
    views: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api_url = cli.api_url.trim_end_matches('/');

    match cli.command {
        Commands::Views(views_cmd) => match views_cmd {
            ViewsCommands::Get { slugs } => get_views(api_url, &slugs).await?,
            ViewsCommands::Hit { slug } => hit_view(api_url, slug).await?,
        },
        Commands::Posts(PostsCommands::List) => list_posts(api_url).await?,
    }

    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| "no error message".to_string());
    Err(anyhow::anyhow!("request failed with status {status}: {message}"))
}

async fn get_views(api_url: &str, slugs: &[String]) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{api_url}/api/views"))
        .query(&[("slugs", slugs.join(","))])
        .send()
        .await
        .context("Failed to send request to site API")?;

    let body: BatchViewsResponse = check_status(response)
        .await?
        .json()
        .await
        .context("Failed to parse views response")?;

    for slug in slugs {
        let key = slug.trim().to_ascii_lowercase();
        let views = body.views.get(&key).copied().unwrap_or(0);
        println!("{key}\t{views}");
    }

    Ok(())
}

async fn hit_view(api_url: &str, slug: String) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{api_url}/api/views"))
        .json(&json!({ "slug": slug }))
        .send()
        .await
        .context("Failed to send request to site API")?;

    let body: ViewsResponse = check_status(response)
        .await?
        .json()
        .await
        .context("Failed to parse views response")?;

    println!("✓ View recorded for {slug}");
    println!("  Views: {}", body.views);

    Ok(())
}

async fn list_posts(api_url: &str) -> Result<()> {
    let response = reqwest::get(format!("{api_url}/api/posts"))
        .await
        .context("Failed to send request to site API")?;

    let posts: Vec<PostSummary> = check_status(response)
        .await?
        .json()
        .await
        .context("Failed to parse posts response")?;

    if posts.is_empty() {
        println!("No published posts");
        return Ok(());
    }

    for post in posts {
        println!("{}  {:<40} {:>7}  {}", post.date, post.slug, post.views, post.title);
    }

    Ok(())
}
