//! Spread slow work across several workers and merge the results
//!
//! Run with: cargo run --example fan_out

use conveyor::prelude::*;
use std::time::{Duration, Instant};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

const WORKERS: usize = 4;
const JOBS: u64 = 40;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Fan Out / Fan In ===");
    let started = Instant::now();
    let token = CancellationToken::new();

    let jobs = from_iter(
        (0..JOBS).map(Envelope::ok),
        Config::from(token.clone()).with_name("jobs"),
    );

    // zero capacity so an idle worker takes the next job
    let partitions = distribute(jobs, WORKERS, Config::from(token.clone()).with_capacity(0));

    let results = processor(
        partitions,
        |worker| {
            move |_, job: u64| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if job == 13 {
                    return Err(Error::custom(format!("job {} is unlucky", job))).trace();
                }
                Ok::<_, Error>((worker, job * job))
            }
        },
        Config::from(token.clone()),
    );

    let mut merged = multiplex(results, Config::from(token.clone()));
    let mut per_worker = [0usize; WORKERS];

    while let Some(envelope) = merged.next().await {
        match envelope.into_result() {
            Ok((worker, square)) => {
                per_worker[worker] += 1;
                println!("worker {} -> {}", worker, square);
            }
            Err(e) => eprintln!("failed: {}", e),
        }
    }

    println!("jobs per worker: {:?}", per_worker);
    println!("elapsed: {:?}", started.elapsed());
    Ok(())
}
