//! Fan-out stages: one input, several outputs.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::queue::Queue;
use crate::stream::{create_stream, create_stream_pair};

/// Split one input across `count` competing workers.
///
/// Each worker owns one output queue and repeatedly takes the next available
/// item from the shared input, so every item lands on exactly one output.
/// Which output gets which item is up to the scheduler. Each worker stops
/// when the input closes, when the token fires, or when its output is
/// dropped.
///
/// A `count` of zero returns no outputs and leaves the input unread.
pub fn distribute<T>(input: Queue<T>, count: usize, config: Config) -> Vec<Queue<T>>
where
    T: Send + 'static,
{
    let config = config.or_named("distribute");
    let input = Arc::new(Mutex::new(input));

    (0..count)
        .map(|worker| {
            let input = Arc::clone(&input);
            create_stream(
                move |token, output| async move {
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = token.cancelled() => None,
                            item = async { input.lock().await.recv().await } => item,
                        };
                        let Some(item) = next else {
                            tracing::trace!(worker, "input exhausted or cancelled");
                            return;
                        };
                        if let Err(e) = output.send_cancellable(&token, item).await {
                            tracing::debug!(worker, error = %e, "worker stopped");
                            return;
                        }
                    }
                },
                config.clone(),
            )
        })
        .collect()
}

/// Copy every item to two outputs.
///
/// Items are cloned, so for `Arc` or other shared handles both outputs refer
/// to the same underlying value. Each item goes to the first output and then
/// the second, which means the slower consumer paces both. Once the token
/// has fired the next item received ends the stage. If one output is dropped
/// the other keeps being served.
///
/// ```rust
/// use conveyor::{combinators::tee, from_iter, Config};
///
/// # #[tokio::main]
/// # async fn main() {
/// let (mut left, mut right) = tee(from_iter(1..=2, Config::default()), Config::default());
///
/// assert_eq!(left.recv().await, Some(1));
/// assert_eq!(right.recv().await, Some(1));
/// # }
/// ```
pub fn tee<T>(input: Queue<T>, config: Config) -> (Queue<T>, Queue<T>)
where
    T: Clone + Send + 'static,
{
    create_stream_pair(
        move |token, first, second| async move {
            let mut input = input;
            let mut first_open = true;
            let mut second_open = true;

            while let Some(item) = input.recv().await {
                if token.is_cancelled() {
                    tracing::debug!("tee cancelled");
                    return;
                }
                if first_open && first.send(item.clone()).await.is_err() {
                    tracing::debug!("first output dropped");
                    first_open = false;
                }
                if second_open && second.send(item).await.is_err() {
                    tracing::debug!("second output dropped");
                    second_open = false;
                }
                if !first_open && !second_open {
                    return;
                }
            }
        },
        config.or_named("tee"),
    )
}
