//! Pipeline stages built on [`create_stream`](crate::stream::create_stream).
//!
//! Every combinator takes ownership of its input queue(s), spawns its task(s)
//! and returns the output queue(s) immediately. The [`Config`](crate::Config)
//! passed in governs the queues the combinator creates.
//!
//! Stages that carry [`Envelope`](crate::Envelope)s forward error envelopes
//! rather than stopping on them, except [`collect`] and [`fold`] which stop
//! at the first error.

pub mod batch;
pub mod collect;
pub mod fanin;
pub mod fanout;
pub mod transform;

pub use batch::{batch, flatten, spread};
pub use collect::{collect, fold, FoldError};
pub use fanin::multiplex;
pub use fanout::{distribute, tee};
pub use transform::{processor, transform};
