//! One-to-one mapping stages.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::queue::Queue;
use crate::stream::create_stream;

/// Apply `step` to every value, producing exactly one output per input in order.
///
/// Error envelopes are forwarded once, verbatim, without calling `step`, and
/// processing carries on with the next item. An error returned by `step`
/// becomes the error of that item's output envelope.
pub fn transform<T, U, F, Fut>(
    input: Queue<Envelope<T>>,
    mut step: F,
    config: Config,
) -> Queue<Envelope<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(CancellationToken, T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U>> + Send + 'static,
{
    create_stream(
        move |token, output| async move {
            let mut input = input;
            while let Some(envelope) = input.recv().await {
                let next = match envelope.into_result() {
                    Ok(value) => Envelope::new(step(token.clone(), value).await),
                    Err(error) => Envelope::err(error),
                };
                if output.send(next).await.is_err() {
                    tracing::debug!("output queue dropped, stopping");
                    return;
                }
            }
        },
        config.or_named("transform"),
    )
}

/// Run one [`transform`] per input queue, each with its own step function.
///
/// `build` is called once per index and the function it returns serves only
/// that index, so per-partition state can live in its closure. `output[i]`
/// carries the results of `input[i]` in order; nothing is ordered across
/// indices.
pub fn processor<T, U, B, F, Fut>(
    inputs: Vec<Queue<Envelope<T>>>,
    mut build: B,
    config: Config,
) -> Vec<Queue<Envelope<U>>>
where
    T: Send + 'static,
    U: Send + 'static,
    B: FnMut(usize) -> F,
    F: FnMut(CancellationToken, T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U>> + Send + 'static,
{
    let config = config.or_named("processor");
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| transform(input, build(index), config.clone()))
        .collect()
}
