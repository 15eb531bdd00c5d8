//! Discord as an attachment store.
//!
//! Each stored file gets its own guild text channel; every chunk is posted
//! as a message with a single attachment, and the message id is the chunk
//! handle. Only the REST API is used, so no gateway session is needed.

pub mod client;
pub mod types;

pub use client::{DiscordError, DiscordStore, channel_name};
