use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the agent gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "GATEWAY_URL")]
    url: String,

    /// API key sent in the x-api-key header.
    #[arg(short, long, env = "GATEWAY_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// List all agents
    Agents,
    /// Show one agent
    Agent { name: String },
    /// Route a task description to agents
    Select { task: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert("x-api-key", HeaderValue::from_str(key)?);
    }

    let base = cli.url.trim_end_matches('/');
    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Agents => {
            client
                .get(format!("{base}/api/agents"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Agent { name } => {
            client
                .get(format!("{base}/api/agents/{name}"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Select { task } => {
            client
                .post(format!("{base}/api/agents/select"))
                .headers(headers)
                .json(&json!({ "task": task }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(remaining) = res.headers().get("ratelimit-remaining") {
        eprintln!("Rate limit remaining: {}", remaining.to_str().unwrap_or("?"));
    }

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
