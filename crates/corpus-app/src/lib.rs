//! Corpus App
//!
//! The surface a desktop front-end talks to: named channels such as
//! `review:process-rating` or `dashboard:get-data`, served as JSON-RPC 2.0
//! over stdio by `corpus-ipc`, plus the `corpus` terminal client.

pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{channel_descriptions, ChannelDescription, ChannelServer, DEFAULT_REQUEST_TIMEOUT};
