//! The task-queue primitive and the sources built directly on it.
//!
//! [`create_stream`] is the single place a pipeline task and its output queue
//! are born: it spawns one task running the producer routine and closes the
//! queue however the routine ends, panics included.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::Config;
use crate::queue::{channel, Queue, Sender};

/// Spawn `routine` with the sending half of a new queue and return the
/// receiving half immediately.
///
/// The routine receives the configured cancellation token. The queue is
/// closed as soon as the routine's future completes or unwinds, because the
/// routine owns the only sender handed out here.
///
/// Must be called from within a tokio runtime.
///
/// ```rust
/// use conveyor::{create_stream, Config};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut numbers = create_stream(
///     |_token, output| async move {
///         for i in 0..3 {
///             if output.send(i).await.is_err() {
///                 return;
///             }
///         }
///     },
///     Config::default(),
/// );
///
/// assert_eq!(numbers.recv().await, Some(0));
/// assert_eq!(numbers.recv().await, Some(1));
/// assert_eq!(numbers.recv().await, Some(2));
/// assert_eq!(numbers.recv().await, None);
/// # }
/// ```
pub fn create_stream<T, F, Fut>(routine: F, config: Config) -> Queue<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken, Sender<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (sender, queue) = channel(config.capacity());
    let token = config.cancellation().clone();
    spawn_stage(&config, async move { routine(token, sender).await });
    queue
}

/// [`create_stream`] for a routine that feeds two queues.
///
/// Both queues close once the routine completes or unwinds.
pub fn create_stream_pair<A, B, F, Fut>(routine: F, config: Config) -> (Queue<A>, Queue<B>)
where
    A: Send + 'static,
    B: Send + 'static,
    F: FnOnce(CancellationToken, Sender<A>, Sender<B>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (first_tx, first) = channel(config.capacity());
    let (second_tx, second) = channel(config.capacity());
    let token = config.cancellation().clone();
    spawn_stage(&config, async move { routine(token, first_tx, second_tx).await });
    (first, second)
}

/// Spawn a pipeline task inside its diagnostic span.
fn spawn_stage<Fut>(config: &Config, task: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let span = tracing::debug_span!("stage", name = config.name(), capacity = config.capacity());
    let stage = config.name().to_string();
    tokio::spawn(
        async move {
            let _lifecycle = Lifecycle::open(stage);
            task.await;
        }
        .instrument(span),
    )
}

/// Records the open and close of a stage task. Dropping it, on return or
/// while unwinding, marks the stage closed.
struct Lifecycle {
    stage: String,
}

impl Lifecycle {
    fn open(stage: String) -> Self {
        tracing::trace!(stage = %stage, "queue opened");
        #[cfg(feature = "metrics")]
        crate::metrics::stream_opened(&stage);
        Self { stage }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        tracing::trace!(stage = %self.stage, "queue closed");
        #[cfg(feature = "metrics")]
        crate::metrics::stream_closed(&self.stage);
    }
}

/// Emit every item of `items`, stopping early when the token fires or the
/// queue is dropped.
pub fn from_iter<I>(items: I, config: Config) -> Queue<I::Item>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    create_stream(
        move |token, output| async move {
            for item in items {
                if output.send_cancellable(&token, item).await.is_err() {
                    tracing::debug!("source stopped before exhaustion");
                    return;
                }
            }
        },
        config.or_named("from_iter"),
    )
}

/// Forward an arbitrary stream into a queue, stopping early when the token
/// fires or the queue is dropped.
pub fn from_stream<S>(stream: S, config: Config) -> Queue<S::Item>
where
    S: Stream + Send + 'static,
    S::Item: Send + 'static,
{
    create_stream(
        move |token, output| async move {
            tokio::pin!(stream);
            loop {
                let next = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    item = stream.next() => item,
                };
                let Some(item) = next else {
                    return;
                };
                if output.send_cancellable(&token, item).await.is_err() {
                    tracing::debug!("source stopped before exhaustion");
                    return;
                }
            }
        },
        config.or_named("from_stream"),
    )
}

/// Receive and discard until the queue is exhausted.
///
/// A consumer abandoning a pipeline early should drain it rather than leave
/// upstream producers suspended on a full queue.
pub async fn drain<T>(mut input: Queue<T>) {
    let mut discarded = 0usize;
    while input.recv().await.is_some() {
        discarded += 1;
    }
    tracing::trace!(discarded, "queue drained");
}

/// Drain `input` on a background task.
pub fn spawn_drain<T>(input: Queue<T>) -> JoinHandle<()>
where
    T: Send + 'static,
{
    tokio::spawn(drain(input).in_current_span())
}
