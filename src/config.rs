//! Per-call configuration shared by every combinator.

use std::borrow::Cow;
use tokio_util::sync::CancellationToken;

/// Default number of items buffered by a queue.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Configuration for the queue(s) a combinator creates.
///
/// The cancellation token and capacity apply to the queues a combinator
/// produces, never to the queues it consumes. A capacity of zero makes every
/// send a synchronous hand-off to a waiting receiver.
///
/// ```rust
/// use conveyor::{CancellationToken, Config};
///
/// let token = CancellationToken::new();
/// let config = Config::default()
///     .with_cancellation(token.clone())
///     .with_capacity(0)
///     .with_capacity(16);
///
/// assert_eq!(config.capacity(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    cancellation: CancellationToken,
    capacity: usize,
    name: Option<Cow<'static, str>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            capacity: DEFAULT_CAPACITY,
            name: None,
        }
    }
}

impl Config {
    /// Create a configuration with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cancellation token observed by the spawned task(s)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Set the capacity of the output queue(s)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the stage name reported in spans and metric labels
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The stage name, or `"stream"` when none was given.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("stream")
    }

    pub(crate) fn or_named(mut self, name: &'static str) -> Self {
        self.name.get_or_insert(Cow::Borrowed(name));
        self
    }
}

impl From<CancellationToken> for Config {
    fn from(token: CancellationToken) -> Self {
        Self::default().with_cancellation(token)
    }
}
