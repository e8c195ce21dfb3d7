//! Typed forum records decoded from admitted outputs.
//!
//! A [`Record`] is created once, at admission, and never mutated. Edits are
//! new records pointing back through `pre_edit_txid`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Outpoint;

/// The four record kinds this overlay understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Discussion topic.
    Topic,
    /// Post under a topic.
    Post,
    /// Reply to a post or to another reply.
    Reply,
    /// Paid emoji reaction.
    Reaction,
}

impl RecordKind {
    /// Every kind, in dispatch order.
    pub const ALL: [Self; 4] = [Self::Topic, Self::Post, Self::Reply, Self::Reaction];

    /// The UTF-8 tag carried in field 0 of the encoded output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Post => "post",
            Self::Reply => "reply",
            Self::Reaction => "reaction",
        }
    }

    /// Exact number of encoded fields, tag included.
    #[must_use]
    pub const fn field_count(self) -> usize {
        match self {
            Self::Topic => 6,
            Self::Post => 9,
            Self::Reply => 8,
            Self::Reaction => 10,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classification of field 0.
///
/// Unknown tags are not rejections: they belong to some other protocol and
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// One of the record kinds of this overlay.
    Known(RecordKind),
    /// Any other tag.
    Unknown(String),
}

impl TypeTag {
    /// Classifies a decoded type tag.
    #[must_use]
    pub fn classify(tag: &str) -> Self {
        match tag {
            "topic" => Self::Known(RecordKind::Topic),
            "post" => Self::Known(RecordKind::Post),
            "reply" => Self::Known(RecordKind::Reply),
            "reaction" => Self::Known(RecordKind::Reaction),
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A discussion topic. The title doubles as its lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Slug-safe title (`[A-Za-z0-9_-]+`).
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Author-supplied creation time in milliseconds since the epoch.
    pub created_at: i64,
    /// Author identity key (hex SEC1).
    pub created_by: String,
}

/// A post inside a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Txid of the topic this post belongs to.
    pub topic_txid: String,
    /// Post title.
    pub title: String,
    /// Optional attached media URL.
    pub media_url: Option<String>,
    /// Post body.
    pub body: String,
    /// Author-supplied creation time in milliseconds since the epoch.
    pub created_at: i64,
    /// Author identity key (hex SEC1).
    pub created_by: String,
    /// Tags parsed from the comma separated field.
    pub tags: Vec<String>,
    /// Txid of the post this one edits, if any.
    pub pre_edit_txid: Option<String>,
}

/// A reply to a post, optionally nested under another reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Txid of the post this reply belongs to.
    pub post_txid: String,
    /// Txid of the reply this one answers, if nested.
    pub parent_reply_txid: Option<String>,
    /// Optional attached media URL.
    pub media_url: Option<String>,
    /// Reply body.
    pub body: String,
    /// Author-supplied creation time in milliseconds since the epoch.
    pub created_at: i64,
    /// Author identity key (hex SEC1).
    pub created_by: String,
    /// Txid of the reply this one edits, if any.
    pub pre_edit_txid: Option<String>,
}

/// An emoji reaction backed by a payout to the reacted-to author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Txid of the topic the reacted-to post lives in.
    pub topic_txid: String,
    /// Txid of the post the reaction belongs to.
    pub parent_post_txid: String,
    /// Txid of the post or reply reacted to.
    pub direct_parent_txid: String,
    /// Emoji exactly as encoded.
    pub emoji: String,
    /// Reactor identity key (hex SEC1).
    pub created_by: String,
    /// Identity key of the payout recipient (hex SEC1).
    pub recipient_key: String,
    /// First half of the payout key id.
    pub derivation_prefix: String,
    /// Second half of the payout key id.
    pub derivation_suffix: String,
    /// Price paid for the emoji, in satoshis.
    pub payout_sats: u64,
}

/// Closed sum over the record kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    /// A topic record.
    Topic(Topic),
    /// A post record.
    Post(Post),
    /// A reply record.
    Reply(Reply),
    /// A reaction record.
    Reaction(Reaction),
}

impl Record {
    /// Returns the kind of this record.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Topic(_) => RecordKind::Topic,
            Self::Post(_) => RecordKind::Post,
            Self::Reply(_) => RecordKind::Reply,
            Self::Reaction(_) => RecordKind::Reaction,
        }
    }

    /// Author-supplied creation time. Reactions carry none.
    #[must_use]
    pub const fn created_at(&self) -> Option<i64> {
        match self {
            Self::Topic(t) => Some(t.created_at),
            Self::Post(p) => Some(p.created_at),
            Self::Reply(r) => Some(r.created_at),
            Self::Reaction(_) => None,
        }
    }

    /// Identity key of the author.
    #[must_use]
    pub fn created_by(&self) -> &str {
        match self {
            Self::Topic(t) => &t.created_by,
            Self::Post(p) => &p.created_by,
            Self::Reply(r) => &r.created_by,
            Self::Reaction(r) => &r.created_by,
        }
    }
}

/// A record materialized in the index under its outpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedRecord {
    /// Primary key.
    pub outpoint: Outpoint,
    /// Decoded record.
    pub record: Record,
    /// Storage-assigned admission time.
    pub admitted_at: DateTime<Utc>,
}

impl IndexedRecord {
    /// Wraps a record admitted now.
    #[must_use]
    pub fn new(outpoint: Outpoint, record: Record) -> Self {
        Self {
            outpoint,
            record,
            admitted_at: Utc::now(),
        }
    }
}
