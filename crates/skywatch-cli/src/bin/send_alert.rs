//! Inject alerts into the mock backend, which stores and pushes them.

use std::time::Duration;

use clap::Parser;
use serde_json::{json, Value};
use tokio::time;

/// Post alerts to the Skywatch mock backend
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Mock API base URL
    #[arg(long, default_value = "http://localhost:5000/api")]
    url: String,

    /// person or animal; omit for a random alert
    #[arg(long)]
    kind: Option<String>,

    /// Alert message
    #[arg(long)]
    message: Option<String>,

    /// onboard or offboard
    #[arg(long, default_value = "onboard")]
    source: String,

    /// Confidence, as a fraction or a percentage
    #[arg(long)]
    confidence: Option<f64>,

    #[arg(long, default_value = "drone-1")]
    drone_id: String,

    /// Number of alerts to send
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Milliseconds between alerts
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,
}

fn alert_body(args: &Args) -> Option<Value> {
    let kind = args.kind.as_deref()?;
    let message = args
        .message
        .clone()
        .unwrap_or_else(|| format!("{} detected", kind));
    let mut body = json!({
        "type": kind,
        "message": message,
        "source": args.source,
        "drone_id": args.drone_id,
        "createdAt": chrono::Utc::now().to_rfc3339(),
    });
    if let Some(confidence) = args.confidence {
        body["confidence"] = json!(confidence);
    }
    Some(body)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();
    let url = format!("{}/simulate", args.url.trim_end_matches('/'));

    println!("Sending {} alert(s) to {}...", args.count, url);
    let mut interval = time::interval(Duration::from_millis(args.interval_ms.max(1)));

    for n in 1..=args.count {
        interval.tick().await;

        let request = match alert_body(&args) {
            Some(body) => client.post(&url).json(&body),
            None => client.post(&url),
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let body: Value = response.json().await?;
                println!(
                    "[{:3}] {} {} -> {} client(s)",
                    n, body["alert"]["type"], body["alert"]["id"], body["clients"]
                );
            }
            Ok(response) => eprintln!("[{:3}] rejected: {}", n, response.status()),
            Err(e) => eprintln!("[{:3}] error sending alert: {}", n, e),
        }
    }

    Ok(())
}
