//! Bounded queues connecting pipeline tasks.
//!
//! A queue is created by [`channel`] and split into a cloneable [`Sender`]
//! and a single [`Queue`] receiver. The queue closes once every sender has
//! been dropped; buffered items are still delivered before `recv` returns
//! `None`.
//!
//! Capacity zero builds a rendezvous queue: a send completes only once a
//! receiver has accepted the item. An offer whose send future is dropped
//! before it is accepted is retracted, so a send that loses a race against
//! cancellation never reaches the receiver.

use futures::future::poll_fn;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// An item waiting in a rendezvous queue together with its acceptance signal.
type Offer<T> = (T, oneshot::Sender<()>);

/// Create a queue holding up to `capacity` items.
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// let (tx, mut rx) = conveyor::queue::channel(2);
/// tx.send("a").await.unwrap();
/// drop(tx);
///
/// assert_eq!(rx.recv().await, Some("a"));
/// assert_eq!(rx.recv().await, None);
/// # }
/// ```
pub fn channel<T>(capacity: usize) -> (Sender<T>, Queue<T>) {
    if capacity == 0 {
        let (tx, rx) = mpsc::channel(1);
        (
            Sender {
                inner: SenderInner::Rendezvous(tx),
            },
            Queue {
                inner: QueueInner::Rendezvous(rx),
            },
        )
    } else {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Sender {
                inner: SenderInner::Buffered(tx),
            },
            Queue {
                inner: QueueInner::Buffered(rx),
            },
        )
    }
}

/// The sending half of a queue.
pub struct Sender<T> {
    inner: SenderInner<T>,
}

enum SenderInner<T> {
    Buffered(mpsc::Sender<T>),
    Rendezvous(mpsc::Sender<Offer<T>>),
}

impl<T> Sender<T> {
    /// Send an item, waiting for room in the queue.
    ///
    /// Fails with [`Error::ChannelClosed`] once the receiving [`Queue`] is gone;
    /// the item is dropped in that case.
    pub async fn send(&self, item: T) -> Result<()> {
        match &self.inner {
            SenderInner::Buffered(tx) => Ok(tx.send(item).await?),
            SenderInner::Rendezvous(tx) => {
                let (accept, accepted) = oneshot::channel();
                tx.send((item, accept)).await?;
                accepted.await.map_err(|_| Error::ChannelClosed)
            }
        }
    }

    /// Send an item unless `token` fires first.
    ///
    /// A token that has already fired wins without attempting the send. While
    /// waiting for room, whichever of "item accepted" and "token fired" happens
    /// first decides the outcome; a lost race returns [`Error::Cancelled`].
    pub async fn send_cancellable(&self, token: &CancellationToken, item: T) -> Result<()> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            sent = self.send(item) => sent,
            _ = token.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Returns true once the receiving [`Queue`] has been dropped.
    pub fn is_closed(&self) -> bool {
        match &self.inner {
            SenderInner::Buffered(tx) => tx.is_closed(),
            SenderInner::Rendezvous(tx) => tx.is_closed(),
        }
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            SenderInner::Buffered(tx) => SenderInner::Buffered(tx.clone()),
            SenderInner::Rendezvous(tx) => SenderInner::Rendezvous(tx.clone()),
        };
        Self { inner }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.inner {
            SenderInner::Buffered(_) => "buffered",
            SenderInner::Rendezvous(_) => "rendezvous",
        };
        f.debug_struct("Sender")
            .field("mode", &mode)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The receiving half of a queue.
///
/// `Queue` is also a [`Stream`], so the `tokio_stream::StreamExt` adaptors
/// can consume it directly.
pub struct Queue<T> {
    inner: QueueInner<T>,
}

enum QueueInner<T> {
    Buffered(mpsc::Receiver<T>),
    Rendezvous(mpsc::Receiver<Offer<T>>),
}

impl<T> Queue<T> {
    /// Receive the next item, or `None` once the queue is closed and empty.
    pub async fn recv(&mut self) -> Option<T> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        match &mut self.inner {
            QueueInner::Buffered(rx) => rx.poll_recv(cx),
            QueueInner::Rendezvous(rx) => loop {
                match ready!(rx.poll_recv(cx)) {
                    Some((item, accept)) => {
                        // a failed accept means the sender already retracted the offer
                        if accept.send(()).is_ok() {
                            return Poll::Ready(Some(item));
                        }
                    }
                    None => return Poll::Ready(None),
                }
            },
        }
    }
}

impl<T> Stream for Queue<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.inner {
            QueueInner::Buffered(_) => "buffered",
            QueueInner::Rendezvous(_) => "rendezvous",
        };
        f.debug_struct("Queue").field("mode", &mode).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;
    use tokio_test::{assert_pending, assert_ready_eq, assert_ready_err, assert_ready_ok, task};

    #[test]
    fn test_buffered_send_waits_for_room() {
        let (tx, mut rx) = channel::<u32>(2);

        assert_ready_ok!(task::spawn(tx.send(1)).poll());
        assert_ready_ok!(task::spawn(tx.send(2)).poll());

        let mut third = task::spawn(tx.send(3));
        assert_pending!(third.poll());

        assert_ready_eq!(task::spawn(rx.recv()).poll(), Some(1));
        assert!(third.is_woken());
        assert_ready_ok!(third.poll());
    }

    #[test]
    fn test_zero_capacity_send_waits_for_receiver() {
        let (tx, mut rx) = channel::<u32>(0);

        let mut send = task::spawn(async move { tx.send(7).await });
        assert_pending!(send.poll());

        assert_ready_eq!(task::spawn(rx.recv()).poll(), Some(7));
        assert!(send.is_woken());
        assert_ready_ok!(send.poll());

        assert_ready_eq!(task::spawn(rx.recv()).poll(), None);
    }

    #[test]
    fn test_cancelled_offer_is_retracted() {
        let (tx, mut rx) = channel::<u32>(0);
        let token = CancellationToken::new();

        {
            let mut send = task::spawn(tx.send_cancellable(&token, 1));
            assert_pending!(send.poll());

            token.cancel();
            assert!(send.is_woken());
            assert_ready_err!(send.poll());
        }

        drop(tx);
        assert_ready_eq!(task::spawn(rx.recv()).poll(), None);
    }

    #[test]
    fn test_fired_token_skips_send() {
        let (tx, mut rx) = channel::<u32>(4);
        let token = CancellationToken::new();
        token.cancel();

        let sent = tokio_test::block_on(tx.send_cancellable(&token, 1));
        assert!(matches!(sent, Err(Error::Cancelled)));

        drop(tx);
        assert_ready_eq!(task::spawn(rx.recv()).poll(), None);
    }

    #[test]
    fn test_accepted_offer_wins_over_later_cancel() {
        let (tx, mut rx) = channel::<u32>(0);
        let token = CancellationToken::new();

        let mut send = task::spawn(tx.send_cancellable(&token, 5));
        assert_pending!(send.poll());

        assert_ready_eq!(task::spawn(rx.recv()).poll(), Some(5));
        token.cancel();
        assert_ready_ok!(send.poll());
    }

    #[test]
    fn test_pending_offer_fails_when_queue_dropped() {
        let (tx, rx) = channel::<u32>(0);

        let mut send = task::spawn(tx.send(1));
        assert_pending!(send.poll());

        drop(rx);
        assert!(send.is_woken());
        assert!(matches!(send.poll(), Poll::Ready(Err(Error::ChannelClosed))));
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_send_fails_after_queue_dropped() {
        for capacity in [0, 4] {
            let (tx, rx) = channel::<u32>(capacity);
            drop(rx);
            assert!(matches!(tx.send(1).await, Err(Error::ChannelClosed)));
        }
    }

    #[tokio::test]
    async fn test_queue_is_a_stream() {
        for capacity in [0, 1, 8] {
            let (tx, rx) = channel(capacity);
            tokio::spawn(async move {
                for i in 0..5 {
                    tx.send(i).await.unwrap();
                }
            });

            let items: Vec<i32> = rx.collect().await;
            assert_eq!(items, vec![0, 1, 2, 3, 4]);
        }
    }

    #[tokio::test]
    async fn test_multiple_senders_share_a_rendezvous_queue() {
        let (tx, rx) = channel(0);
        for base in [0, 100] {
            let tx = tx.clone();
            tokio::spawn(async move {
                for i in 0..3 {
                    tx.send(base + i).await.unwrap();
                }
            });
        }
        drop(tx);

        let mut items: Vec<i32> = rx.collect().await;
        items.sort_unstable();
        assert_eq!(items, vec![0, 1, 2, 100, 101, 102]);
    }
}
