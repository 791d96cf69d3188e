//! Whole-stream accumulators.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::envelope::Envelope;
use crate::error::Error;
use crate::queue::Queue;
use crate::stream::{create_stream, spawn_drain};

/// Accumulate every value into a single vector.
///
/// All or nothing: the first error envelope is forwarded as the only output,
/// and the rest of the input is drained in the background so upstream
/// producers are not left blocked. If the token has fired when the next item
/// arrives the stage stops and its queue closes empty, which is distinct from
/// emitting an empty vector.
///
/// Do not use on unbounded inputs; the accumulator grows without limit.
pub fn collect<T>(input: Queue<Envelope<T>>, config: Config) -> Queue<Envelope<Vec<T>>>
where
    T: Send + 'static,
{
    create_stream(
        move |token, output| async move {
            let mut input = input;
            let mut acc = Vec::new();
            while let Some(envelope) = input.recv().await {
                if token.is_cancelled() {
                    tracing::debug!(collected = acc.len(), "collect cancelled");
                    return;
                }
                match envelope.into_result() {
                    Ok(value) => acc.push(value),
                    Err(error) => {
                        tracing::debug!(collected = acc.len(), "collect stopped on error");
                        let _ = output.send(Envelope::err(error)).await;
                        spawn_drain(input);
                        return;
                    }
                }
            }
            let _ = output.send(Envelope::ok(acc)).await;
        },
        config.or_named("collect"),
    )
}

/// Why a [`fold`] stopped early, together with the accumulator at that point.
///
/// An aggregator fails by returning one of these, handing back whatever
/// accumulator it has built so far.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct FoldError<U> {
    pub accumulator: U,
    pub error: Error,
}

impl<U> FoldError<U> {
    pub fn new(accumulator: U, error: impl Into<Error>) -> Self {
        Self {
            accumulator,
            error: error.into(),
        }
    }

    pub fn into_error(self) -> Error {
        self.error
    }

    pub fn into_parts(self) -> (U, Error) {
        (self.accumulator, self.error)
    }
}

/// Reduce the input to one value on the calling task.
///
/// Stops at the first error envelope, returning the accumulator built so far
/// with that error, or at the first [`FoldError`] the aggregator returns.
/// Whatever input remains is drained in the background after `fold`
/// returns.
///
/// ```rust
/// use conveyor::{fold, from_iter, Config, Envelope, FoldError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let input = from_iter((1..=4).map(Envelope::ok), Config::default());
/// let total = fold(input, 0, |_, acc, x| async move { Ok(acc + x) }, Config::default())
///     .await
///     .unwrap();
/// assert_eq!(total, 10);
///
/// let input = from_iter((1..=4).map(Envelope::ok), Config::default());
/// let err = fold(
///     input,
///     0,
///     |_, acc, x| async move {
///         if x == 3 {
///             return Err(FoldError::new(acc, "three"));
///         }
///         Ok(acc + x)
///     },
///     Config::default(),
/// )
/// .await
/// .unwrap_err();
/// assert_eq!(err.accumulator, 3);
/// # }
/// ```
pub async fn fold<T, U, F, Fut>(
    input: Queue<Envelope<T>>,
    initial: U,
    aggregator: F,
    config: Config,
) -> std::result::Result<U, FoldError<U>>
where
    T: Send + 'static,
    F: FnMut(CancellationToken, U, T) -> Fut,
    Fut: Future<Output = std::result::Result<U, FoldError<U>>>,
{
    let mut input = input;
    let outcome = fold_items(&mut input, initial, aggregator, config.cancellation()).await;
    spawn_drain(input);
    outcome
}

async fn fold_items<T, U, F, Fut>(
    input: &mut Queue<Envelope<T>>,
    initial: U,
    mut aggregator: F,
    token: &CancellationToken,
) -> std::result::Result<U, FoldError<U>>
where
    F: FnMut(CancellationToken, U, T) -> Fut,
    Fut: Future<Output = std::result::Result<U, FoldError<U>>>,
{
    let mut accumulator = initial;
    while let Some(envelope) = input.recv().await {
        let value = match envelope.into_result() {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!("fold stopped on stream error");
                return Err(FoldError::new(accumulator, error));
            }
        };
        accumulator = aggregator(token.clone(), accumulator, value).await?;
    }
    Ok(accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::from_iter;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    fn letters(items: Vec<Envelope<&'static str>>) -> Queue<Envelope<&'static str>> {
        from_iter(items, Config::default())
    }

    #[tokio::test]
    async fn test_collect_valid() {
        let input = from_iter((1..=10).map(Envelope::ok), Config::default());
        let mut collected = collect(input, Config::default());

        let all = collected.recv().await.unwrap().into_result().unwrap();
        assert_eq!(all, (1..=10).collect::<Vec<_>>());
        assert!(collected.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_empty_input_emits_empty_vec() {
        let input = from_iter(Vec::<Envelope<i32>>::new(), Config::default());
        let mut collected = collect(input, Config::default());

        let all = collected.recv().await.unwrap().into_result().unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_collect_cancelable() {
        let token = CancellationToken::new();
        // the source intentionally ignores the token
        let src = create_stream(
            |_, output| async move {
                for i in 0..10 {
                    if output.send(Envelope::ok(i)).await.is_err() {
                        return;
                    }
                    sleep(Duration::from_millis(10)).await;
                }
            },
            Config::default(),
        );
        let mut collected = collect(src, Config::from(token.clone()));

        sleep(Duration::from_millis(1)).await;
        token.cancel();

        assert!(collected.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_collect_error_is_single_output() {
        let (done_tx, done_rx) = oneshot::channel();
        let src = create_stream(
            move |_, output| async move {
                for i in 1..=3 {
                    output.send(Envelope::ok(i)).await.unwrap();
                }
                output.send(Envelope::err("general error")).await.unwrap();
                for i in 4..=100 {
                    output.send(Envelope::ok(i)).await.unwrap();
                }
                let _ = done_tx.send(());
            },
            Config::default().with_capacity(0),
        );
        let mut collected = collect(src, Config::default());

        let failed = collected.recv().await.unwrap();
        assert_eq!(failed.error().unwrap().to_string(), "general error");
        assert!(collected.recv().await.is_none());

        // the remainder was drained, so the producer ran to completion
        done_rx.await.unwrap();
    }

    #[tokio::test]
    async fn test_fold_basic_math() {
        let input = from_iter([1, 2, 1, 2, -1].map(Envelope::ok), Config::default());
        let total = fold(
            input,
            0,
            |_, total, value| async move { Ok(total + value) },
            Config::default(),
        )
        .await
        .unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_fold_matches_left_reduction() {
        let input = from_iter((1..=100u64).map(Envelope::ok), Config::default());
        let folded = fold(
            input,
            Vec::new(),
            |_, mut seen: Vec<u64>, value| async move {
                seen.push(value * value);
                Ok(seen)
            },
            Config::default(),
        )
        .await
        .unwrap();

        let reduced = (1..=100u64).fold(Vec::new(), |mut seen, value| {
            seen.push(value * value);
            seen
        });
        assert_eq!(folded, reduced);
    }

    #[tokio::test]
    async fn test_fold_counts() {
        let input = letters(["a", "b", "a", "b", "c"].map(Envelope::ok).to_vec());
        let counts = fold(
            input,
            HashMap::new(),
            |_, mut counts: HashMap<&str, i32>, value| async move {
                *counts.entry(value).or_insert(0) += 1;
                Ok(counts)
            },
            Config::default(),
        )
        .await
        .unwrap();

        assert_eq!(counts, HashMap::from([("a", 2), ("b", 2), ("c", 1)]));
    }

    #[tokio::test]
    async fn test_fold_stream_error_keeps_accumulator() {
        let input = letters(vec![
            Envelope::ok("a"),
            Envelope::ok("b"),
            Envelope::ok("c"),
            Envelope::err("failure"),
            Envelope::ok("e"),
        ]);
        let err = fold(
            input,
            String::new(),
            |_, mut total: String, value| async move {
                total.push_str(value);
                Ok(total)
            },
            Config::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "failure");
        assert_eq!(err.accumulator, "abc");
    }

    #[tokio::test]
    async fn test_fold_aggregator_error_returns_updated_accumulator() {
        let input = letters(["a", "b", "c", "d"].map(Envelope::ok).to_vec());
        let err = fold(
            input,
            String::new(),
            |_, mut total: String, value| async move {
                total.push_str(value);
                if value == "c" {
                    return Err(FoldError::new(total, "failure"));
                }
                Ok(total)
            },
            Config::default(),
        )
        .await
        .unwrap_err();

        let (accumulator, error) = err.into_parts();
        assert_eq!(accumulator, "abc");
        assert_eq!(error.to_string(), "failure");
    }

    #[tokio::test]
    async fn test_fold_aggregator_observes_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let input = letters(["a", "b", "c"].map(Envelope::ok).to_vec());
        let err = fold(
            input,
            String::new(),
            |token: CancellationToken, mut total: String, value| async move {
                tokio::select! {
                    _ = token.cancelled() => Err(FoldError::new(total, "timeout")),
                    _ = sleep(Duration::from_secs(2)) => {
                        total.push_str(value);
                        Ok(total)
                    }
                }
            },
            Config::from(token),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error.to_string(), "timeout");
        assert_eq!(err.accumulator, "");
    }

    #[tokio::test]
    async fn test_fold_drains_remaining_input() {
        let (done_tx, done_rx) = oneshot::channel();
        let src = create_stream(
            move |_, output| async move {
                output.send(Envelope::err("early failure")).await.unwrap();
                for i in 0..100 {
                    output.send(Envelope::ok(i)).await.unwrap();
                }
                let _ = done_tx.send(());
            },
            Config::default().with_capacity(0),
        );

        let err = fold(src, 0, |_, acc, x: i32| async move { Ok(acc + x) }, Config::default())
            .await
            .unwrap_err();
        assert_eq!(err.accumulator, 0);

        done_rx.await.unwrap();
    }
}
