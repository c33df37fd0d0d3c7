use std::sync::Arc;

use api_client::{ApiClient, ClientConfig, Envelope, MemoryAuthStore, NoopSignals, RequestOptions};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Exercise a running session relay from the command line", long_about = None)]
struct Cli {
    /// Relay base URL.
    #[arg(short, long, env = "API_BASE_URL", default_value = "http://localhost:3001")]
    url: String,

    /// Relayed path prefix.
    #[arg(short, long, default_value = "/bonita")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in through the relay and print the issued client id
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short = 'w', long, env = "BPM_PASSWORD")]
        password: String,
    },
    /// GET a relayed path
    Get {
        path: String,
        #[arg(short, long)]
        client_id: Option<String>,
    },
    /// POST a JSON body to a relayed path
    Post {
        path: String,
        /// JSON body
        body: String,
        #[arg(short, long)]
        client_id: Option<String>,
    },
    /// Log out and revoke the client id
    Logout {
        #[arg(short, long)]
        client_id: String,
    },
    /// Check relay health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(
        ClientConfig::application(cli.url.as_str()),
        Arc::new(MemoryAuthStore::new()),
        Arc::new(NoopSignals),
    );
    let prefix = cli.prefix.trim_end_matches('/');

    let envelope = match cli.command {
        Commands::Login { username, password } => {
            let options = RequestOptions::new()
                .form([
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                    ("redirect", "false"),
                ])
                .retries(1);
            let envelope = client
                .public()
                .post(&format!("{prefix}/loginservice"), None, options)
                .await;
            if let Some(client_id) = envelope.data().and_then(|data| data.get("clientId")).and_then(Value::as_str) {
                println!("{client_id}");
                return Ok(());
            }
            envelope
        }
        Commands::Get { path, client_id } => {
            client
                .get(&relayed(prefix, &path), with_client_id(client_id))
                .await
        }
        Commands::Post { path, body, client_id } => {
            let body: Value = serde_json::from_str(&body)?;
            client
                .post(&relayed(prefix, &path), Some(body), with_client_id(client_id))
                .await
        }
        Commands::Logout { client_id } => {
            client
                .get(&format!("{prefix}/logoutservice"), with_client_id(Some(client_id)))
                .await
        }
        Commands::Health => client.public().get("/health", RequestOptions::new()).await,
    };

    print_envelope(&envelope)?;
    if !envelope.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn relayed(prefix: &str, path: &str) -> String {
    format!("{prefix}/{}", path.trim_start_matches('/'))
}

fn with_client_id(client_id: Option<String>) -> RequestOptions {
    let options = RequestOptions::new().skip_error_notification();
    match client_id {
        Some(id) => options.header("x-client-id", id),
        None => options,
    }
}

fn print_envelope(envelope: &Envelope) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}
