//! # Queue-backed stream combinators
//!
//! Build concurrent producer/consumer pipelines from small stages. Each stage
//! runs on its own tokio task and hands items to the next through a bounded
//! queue, so a slow consumer applies backpressure all the way upstream.
//!
//! ## Core Concepts
//!
//! - **Queue**: a bounded, closable FIFO with one receiver; capacity zero is a
//!   synchronous hand-off
//! - **Stream**: a queue fed by exactly one task, created by [`create_stream`]
//! - **Envelope**: a value or an error travelling through the pipeline
//! - **Combinators**: transform, batch, spread, collect, fold, distribute,
//!   tee and multiplex
//! - **Cancellation**: every combinator observes the [`CancellationToken`]
//!   in its [`Config`]
//!
//! ## Example
//!
//! ```rust
//! use conveyor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let numbers = from_iter((1..=6).map(Envelope::ok), Config::default());
//!     let doubled = transform(numbers, |_, x: i32| async move { Ok(x * 2) }, Config::default());
//!     let batches = batch(doubled, 4, Config::default());
//!
//!     let mut all = collect(spread(batches, Config::default()), Config::default());
//!     let values = all.recv().await.unwrap().into_result()?;
//!
//!     assert_eq!(values, vec![2, 4, 6, 8, 10, 12]);
//!     Ok(())
//! }
//! ```

pub mod combinators;
pub mod config;
pub mod envelope;
pub mod error;
pub mod queue;
pub mod stream;
pub mod trace;

// Re-export commonly used items
pub mod prelude {
    pub use crate::combinators::{
        batch, collect, distribute, flatten, fold, multiplex, processor, spread, tee, transform,
    };
    pub use crate::config::Config;
    pub use crate::envelope::Envelope;
    pub use crate::error::{Error, IntoError, Result};
    pub use crate::queue::{Queue, Sender};
    pub use crate::stream::{create_stream, create_stream_pair, drain, from_iter, from_stream};
    pub use crate::trace::{trace, TraceExt};
    pub use tokio_util::sync::CancellationToken;
}

pub use combinators::{
    batch, collect, distribute, flatten, fold, multiplex, processor, spread, tee, transform,
    FoldError,
};
pub use config::Config;
pub use envelope::Envelope;
pub use error::{Error, IntoError, Result};
pub use queue::{Queue, Sender};
pub use stream::{create_stream, create_stream_pair, drain, from_iter, from_stream, spawn_drain};
pub use trace::{trace, TraceExt};
pub use tokio_util::sync::CancellationToken;

// Feature flags for optional dependencies
#[cfg(feature = "metrics")]
pub mod metrics;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
