//! asyncgen-runtime: the capability contracts generated code is driven
//! through, plus an in-memory transport implementing them.

mod envelope;
mod error;
pub mod memory;
mod traits;

pub use envelope::{Envelope, EnvelopeReader, EnvelopeWriter, Headers};
pub use error::RuntimeError;
pub use traits::{Consumer, Producer, Publisher, Subscriber};
