//! Chunking and flattening stages.

use crate::config::Config;
use crate::envelope::Envelope;
use crate::queue::Queue;
use crate::stream::create_stream;

/// Group values into batches of `batch_size`.
///
/// Many operations, from database writes to network calls, are cheaper on
/// grouped data. Error envelopes are forwarded immediately and do not flush or
/// reset the batch being built. Once the input is exhausted any partial batch
/// is emitted even if the token has fired; every earlier batch waits on a
/// choice between the token firing and room in the output queue.
///
/// A `batch_size` of zero is treated as one.
pub fn batch<T>(
    input: Queue<Envelope<T>>,
    batch_size: usize,
    config: Config,
) -> Queue<Envelope<Vec<T>>>
where
    T: Send + 'static,
{
    let batch_size = batch_size.max(1);
    create_stream(
        move |token, output| async move {
            let mut input = input;
            let mut acc = Vec::with_capacity(batch_size);
            while let Some(envelope) = input.recv().await {
                match envelope.into_result() {
                    Err(error) => {
                        if output.send(Envelope::err(error)).await.is_err() {
                            return;
                        }
                    }
                    Ok(value) => {
                        if acc.len() >= batch_size {
                            let full = std::mem::replace(&mut acc, Vec::with_capacity(batch_size));
                            let sent = output.send_cancellable(&token, Envelope::ok(full)).await;
                            if let Err(e) = sent {
                                tracing::debug!(error = %e, "batch stopped");
                                return;
                            }
                        }
                        acc.push(value);
                    }
                }
            }

            if !acc.is_empty() {
                tracing::trace!(len = acc.len(), "flushing final batch");
                let _ = output.send(Envelope::ok(acc)).await;
            }
        },
        config.or_named("batch"),
    )
}

/// Flatten batches back into single items, preserving order within and
/// across batches.
///
/// An error envelope yields exactly one error envelope. Spread never consults
/// the token: a batch it has taken is always delivered whole, and it stops
/// once upstream stops.
pub fn spread<T>(input: Queue<Envelope<Vec<T>>>, config: Config) -> Queue<Envelope<T>>
where
    T: Send + 'static,
{
    create_stream(
        move |_, output| async move {
            let mut input = input;
            while let Some(envelope) = input.recv().await {
                match envelope.into_result() {
                    Err(error) => {
                        if output.send(Envelope::err(error)).await.is_err() {
                            return;
                        }
                    }
                    Ok(items) => {
                        for item in items {
                            if output.send(Envelope::ok(item)).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        },
        config.or_named("spread"),
    )
}

/// [`spread`] for queues of plain batches without envelopes.
pub fn flatten<T>(input: Queue<Vec<T>>, config: Config) -> Queue<T>
where
    T: Send + 'static,
{
    create_stream(
        move |_, output| async move {
            let mut input = input;
            while let Some(items) = input.recv().await {
                for item in items {
                    if output.send(item).await.is_err() {
                        return;
                    }
                }
            }
        },
        config.or_named("flatten"),
    )
}
