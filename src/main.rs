use std::env;

use clap::Parser;

/// Beer contest admin console.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Listen port, overrides STEIN_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Contest API base URL, overrides STEIN_API_URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Some(port) = args.port {
        env::set_var("STEIN_PORT", port.to_string());
    }
    if let Some(api_url) = args.api_url {
        env::set_var("STEIN_API_URL", api_url);
    }

    stein::start_server().await;
}
