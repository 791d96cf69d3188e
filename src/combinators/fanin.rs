//! Fan-in: merging many queues into one.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::Config;
use crate::queue::{Queue, Sender};
use crate::stream::create_stream;

/// Merge every input into a single output queue.
///
/// Items from one input keep their relative order; there is no ordering
/// across inputs. The output closes only after every input has closed or
/// been abandoned because the token fired or the output was dropped.
///
/// ```rust
/// use conveyor::{combinators::multiplex, from_iter, Config};
/// use tokio_stream::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let inputs = vec![
///     from_iter(vec![1, 2], Config::default()),
///     from_iter(vec![3], Config::default()),
/// ];
/// let mut merged: Vec<i32> = multiplex(inputs, Config::default()).collect().await;
/// merged.sort_unstable();
///
/// assert_eq!(merged, vec![1, 2, 3]);
/// # }
/// ```
pub fn multiplex<T>(inputs: Vec<Queue<T>>, config: Config) -> Queue<T>
where
    T: Send + 'static,
{
    create_stream(
        move |token, output| async move {
            let forwarders: Vec<_> = inputs
                .into_iter()
                .enumerate()
                .map(|(index, input)| {
                    let forwarder = forward(input, output.clone(), token.clone());
                    tokio::spawn(
                        forwarder.instrument(tracing::trace_span!("forwarder", index)),
                    )
                })
                .collect();
            drop(output);

            for joined in join_all(forwarders).await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "forwarder task failed");
                }
            }
        },
        config.or_named("multiplex"),
    )
}

async fn forward<T>(mut input: Queue<T>, output: Sender<T>, token: CancellationToken) {
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            item = input.recv() => item,
        };
        let Some(item) = next else {
            return;
        };
        if output.send_cancellable(&token, item).await.is_err() {
            return;
        }
    }
}
