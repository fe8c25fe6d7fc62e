use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use unsubscribe_client_rs::{
    discover, discover_from_header, Config, Error, UnsubscribeCandidate, UnsubscribeClient,
};

#[derive(Parser, Debug)]
#[command(
    name = "unsubscribe-client",
    about = "Find and follow unsubscribe links in email bodies",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, help = "Proxy URL (optional)")]
    proxy: Option<String>,

    #[arg(long, default_value_t = 10, help = "Per-request timeout in seconds")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List unsubscribe candidates found in an HTML or text file
    Discover {
        file: PathBuf,
        /// Also execute the first candidate
        #[arg(long)]
        execute: bool,
    },
    /// Run the unsubscribe cascade against a URL or mailto URI
    Execute { url: String },
    /// Parse a List-Unsubscribe header value
    Header { value: String },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::default().with_timeout(Duration::from_secs(cli.timeout));
    if let Some(proxy) = cli.proxy {
        config = config.with_proxy(proxy);
    }
    let client = UnsubscribeClient::new(Some(config))?;

    match cli.command {
        Commands::Discover { file, execute } => {
            let body = std::fs::read_to_string(&file)?;
            let candidates = discover(&body);
            print_candidates(&candidates);
            if execute {
                if let Some(first) = candidates.first() {
                    run(&client, first).await;
                }
            }
        }
        Commands::Execute { url } => {
            let candidate = if url.to_ascii_lowercase().starts_with("mailto:") {
                UnsubscribeCandidate::mailto(url, "command line")
            } else {
                UnsubscribeCandidate::link(url, "command line")
            };
            run(&client, &candidate).await;
        }
        Commands::Header { value } => {
            print_candidates(&discover_from_header(&value));
        }
    }

    Ok(())
}

fn print_candidates(candidates: &[UnsubscribeCandidate]) {
    if candidates.is_empty() {
        println!("No unsubscribe candidates found.");
        return;
    }
    println!("Found {} candidate(s):", candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        println!("{}. [{:?}] {}", idx + 1, candidate.kind, candidate.url);
        if !candidate.display_text.is_empty() {
            println!("   Text: {}", candidate.display_text);
        }
    }
}

async fn run(client: &UnsubscribeClient, candidate: &UnsubscribeCandidate) {
    let outcome = client.execute(candidate).await;
    println!(
        "{} via {:?}: {}",
        if outcome.succeeded { "OK" } else { "FAILED" },
        outcome.method,
        outcome.message
    );
    if let Some(detail) = outcome.detail {
        println!("   {detail}");
    }
}
