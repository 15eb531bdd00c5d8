//! Discord REST API response and request types.

use serde::{Deserialize, Serialize};

/// Channel type id of a guild text channel.
pub const GUILD_TEXT: u8 = 0;

/// A guild channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == GUILD_TEXT
    }
}

/// Body of `POST /guilds/{guild.id}/channels`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChannel<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: u8,
}

/// A channel message. Only the fields needed to locate attachments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}
