use clap::Parser;
use hdrhistogram::Histogram;
use hyper::{Body, Client, Method, Request, StatusCode};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of concurrent clients
    #[arg(short, long, default_value = "1")]
    concurrency: usize,

    /// INTERVAL ms
    #[arg(short, long, default_value = "100")]
    interval: u64,

    /// Duration of the benchmark in seconds
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// Purchases per request
    #[arg(short, long, default_value = "50")]
    batch: usize,

    /// Server address
    #[arg(short, long, default_value = "http://127.0.0.1:4000")]
    server: String,
}

const STREETS: [&str; 4] = [
    "123 Sesame St.",
    "123 Sesame Street",
    "1 Infinite Loop",
    "742 Evergreen Terrace",
];

fn random_purchase<R: Rng>(rng: &mut R, order_id: u64) -> Value {
    let user = rng.gen_range(0..1000);
    let state = if rng.gen_bool(0.5) { "NY" } else { "New York" };
    json!({
        "orderId": order_id,
        "dealId": rng.gen_range(1..5),
        "emailAddress": format!("user{}@example.com", user),
        "streetAddress": STREETS[rng.gen_range(0..STREETS.len())],
        "city": "Springfield",
        "state": state,
        "zipCode": format!("{:05}", rng.gen_range(0..100)),
        "creditCardNumber": rng.gen_range(1_000_000_000u64..9_999_999_999u64).to_string(),
    })
}

/// Random batch where roughly one purchase in ten is an alias of an earlier one.
fn random_batch(size: usize) -> Value {
    let mut rng = rand::thread_rng();
    let mut purchases: Vec<Value> = Vec::with_capacity(size);
    for order_id in 1..=size as u64 {
        let mut purchase = random_purchase(&mut rng, order_id);
        if !purchases.is_empty() && rng.gen_bool(0.1) {
            let original = &purchases[rng.gen_range(0..purchases.len())];
            let local = original["emailAddress"]
                .as_str()
                .and_then(|email| email.split('@').next())
                .unwrap_or("alias")
                .to_string();
            purchase["emailAddress"] = json!(format!("{}+promo@example.com", local));
            purchase["dealId"] = original["dealId"].clone();
        }
        purchases.push(purchase);
    }
    json!({ "purchases": purchases })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let uri = format!(
        "{}/FraudPrevention/validate",
        args.server.trim_end_matches('/')
    );
    let histogram = Arc::new(Mutex::new(Histogram::<u64>::new(3)?));
    let total_requests = Arc::new(Mutex::new(0u64));
    let total_flagged = Arc::new(Mutex::new(0u64));

    println!(
        "Starting benchmark with {} concurrent clients, batch size {}, target INTERVAL: {}",
        args.concurrency, args.batch, args.interval
    );

    // Spawn client tasks
    let mut handles = vec![];
    for _ in 0..args.concurrency {
        let uri = uri.clone();
        let histogram = histogram.clone();
        let total_requests = total_requests.clone();
        let total_flagged = total_flagged.clone();
        let batch_size = args.batch;
        let interval = args.interval;

        let handle = tokio::spawn(async move {
            let client = Client::new();

            loop {
                let body = random_batch(batch_size).to_string();
                let request = match Request::builder()
                    .method(Method::POST)
                    .uri(uri.as_str())
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                {
                    Ok(request) => request,
                    Err(e) => {
                        eprintln!("Failed to build request: {}", e);
                        return;
                    }
                };

                let start = Instant::now();
                match client.request(request).await {
                    Ok(response) if response.status() == StatusCode::OK => {
                        let duration = start.elapsed();
                        let flagged = match hyper::body::to_bytes(response.into_body()).await {
                            Ok(bytes) => serde_json::from_slice::<Vec<Value>>(&bytes)
                                .map(|records| records.len() as u64)
                                .unwrap_or(0),
                            Err(_) => 0,
                        };
                        let mut hist = histogram.lock().await;
                        if let Err(e) = hist.record(duration.as_micros() as u64) {
                            eprintln!("Failed to record latency: {}", e);
                        }
                        *total_requests.lock().await += 1;
                        *total_flagged.lock().await += flagged;
                    }
                    Ok(response) => eprintln!("Request rejected: {}", response.status()),
                    Err(e) => eprintln!("Request failed: {}", e),
                }

                tokio::time::sleep(Duration::from_millis(interval)).await;
            }
        });

        handles.push(handle);
    }

    // Run for specified duration
    sleep(Duration::from_secs(args.duration)).await;

    // Cancel all tasks
    for handle in handles {
        handle.abort();
    }

    // Print statistics
    let total = *total_requests.lock().await;
    let flagged = *total_flagged.lock().await;
    let hist = histogram.lock().await;

    println!("\nBenchmark Results:");
    println!("Total Requests: {}", total);
    println!("Flagged Purchases: {}", flagged);
    println!("Average TPS: {:.2}", total as f64 / args.duration as f64);
    println!("\nLatency Distribution (microseconds):");
    println!("p50: {}", hist.value_at_percentile(50.0));
    println!("p90: {}", hist.value_at_percentile(90.0));
    println!("p95: {}", hist.value_at_percentile(95.0));
    println!("p99: {}", hist.value_at_percentile(99.0));
    println!("p99.9: {}", hist.value_at_percentile(99.9));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_batch_shape() {
        let batch = random_batch(20);
        let purchases = batch["purchases"].as_array().unwrap();
        assert_eq!(purchases.len(), 20);
        for (i, purchase) in purchases.iter().enumerate() {
            assert_eq!(purchase["orderId"], json!(i as u64 + 1));
            assert!(purchase["emailAddress"].as_str().unwrap().contains('@'));
            assert_eq!(purchase["zipCode"].as_str().unwrap().len(), 5);
        }
    }
}
