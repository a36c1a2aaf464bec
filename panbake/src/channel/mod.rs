//! Channel layer: turning the raw shell stream into completed responses.
//!
//! This module handles decoding, ANSI stripping, terminator matching and
//! the expect loop that waits for a response to finish.

mod buffer;
mod encoding;
mod expect;
mod patterns;

pub use buffer::PatternBuffer;
pub use encoding::decode_chunk;
pub use expect::{ExpectConfig, ExpectEngine, ExpectOutcome};
pub use patterns::{TerminatorRole, TerminatorSet};
