use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "snap-cli")]
#[command(about = "Command-line client for the snap lookup proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "SNAP_PROXY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a profile by username
    Lookup {
        username: String,
        /// Use the single-attempt GET route instead of POST
        #[arg(long)]
        get: bool,
    },
    /// Check proxy liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Lookup { username, get: true } => {
            client
                .get(format!("{}/api/snap/lookup", base))
                .query(&[("username", username)])
                .send()
                .await?
        }
        Commands::Lookup { username, get: false } => {
            client
                .post(format!("{}/api/snap/lookup", base))
                .json(&json!({ "username": username }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json)?;
            if status.is_success() {
                println!("{}", pretty);
            } else {
                eprintln!("Error: proxy returned status {}", status);
                eprintln!("{}", pretty);
            }
        }
        Err(_) => {
            eprintln!("Error: proxy returned status {}", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
