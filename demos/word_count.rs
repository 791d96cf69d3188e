//! Count words across a handful of lines with a batched, folded pipeline
//!
//! Run with: cargo run --example word_count
//! Set RUST_LOG=conveyor=trace to watch stages open and close.

use conveyor::prelude::*;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

const TEXT: &str = "the quick brown fox
jumps over the lazy dog
the dog sleeps
and the fox runs";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Word Count ===");

    let lines = from_iter(
        TEXT.lines().map(|line| Envelope::ok(line.to_string())),
        Config::default().with_name("lines"),
    );

    let words = transform(
        lines,
        |_, line: String| async move {
            Ok(line
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>())
        },
        Config::default().with_name("split"),
    );

    // one envelope per word again, then regroup to amortise the counting step
    let batches = batch(spread(words, Config::default()), 4, Config::default());

    let counts = fold(
        batches,
        BTreeMap::new(),
        |_, mut counts: BTreeMap<String, usize>, words: Vec<String>| async move {
            for word in words {
                *counts.entry(word).or_default() += 1;
            }
            Ok(counts)
        },
        Config::default(),
    )
    .await
    .map_err(|e| e.into_error())?;

    for (word, count) in &counts {
        println!("{:>8} {}", word, count);
    }
    Ok(())
}
