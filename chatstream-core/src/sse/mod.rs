//! Incremental decoding of the reply event stream.
//!
//! Wire format, one field per `\n`-terminated line:
//! ```text
//! event: chunk
//! data: {"content": "Hel"}
//!
//! event: done
//! data: {"status": "complete"}
//! ```
//!
//! A frame completes on its `data: ` line; blank lines are ignored. Multi-line
//! `data` fields are not part of this protocol.

pub mod decoder;
pub mod dispatch;
pub mod frame;
pub mod lines;

pub use decoder::Utf8Decoder;
pub use dispatch::{FrameError, decode_frame};
pub use frame::{Frame, FrameParser};
pub use lines::LineBuffer;

pub const EVENT_PREFIX: &str = "event: ";
pub const DATA_PREFIX: &str = "data: ";
