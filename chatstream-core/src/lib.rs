//! Client core for a chat backend that streams assistant replies as
//! `event:`/`data:` line pairs.
//!
//! Bytes flow one way: [`sse::Utf8Decoder`] → [`sse::LineBuffer`] →
//! [`sse::FrameParser`] → [`sse::decode_frame`] → your [`stream::EventHandler`],
//! driven by [`session::StreamSession::run`].

pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod model;
pub mod normalizer;
pub mod session;
pub mod sse;
pub mod stream;
pub mod telemetry;
pub mod transcript;
#[cfg(test)]
pub mod test_util;
