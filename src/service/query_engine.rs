//! Lookup queries over the record index.
//!
//! A lookup names a query and an optional JSON parameter. [`LookupQuery`]
//! is the parsed, closed set of questions; [`QueryEngine`] answers them with
//! outpoints in admission order. Every query is a pure read.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::Outpoint;
use crate::error::OverlayError;
use crate::keys::{parse_identity_key, to_compressed_hex};
use crate::storage::{Collection, RecordFilter, RecordStore};

/// A parsed lookup question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// Every topic.
    AllTopics,
    /// Earliest admitted topic with this exact title.
    Topic {
        /// Title to match.
        title: String,
    },
    /// Posts and reactions under a topic.
    AllPosts {
        /// Txid of the topic.
        topic_txid: String,
    },
    /// A post with its replies and reactions.
    Post {
        /// Txid of the post.
        post_txid: String,
    },
    /// Every reaction.
    AllReactions,
    /// Every reply.
    AllReplies,
    /// The reaction at an outpoint.
    ReactionByOutpoint(Outpoint),
    /// Reactions paying an identity key.
    PaymentsFor {
        /// Compressed hex identity key.
        recipient_key: String,
    },
}

impl LookupQuery {
    /// Every query name this overlay answers.
    pub const NAMES: [&'static str; 8] = [
        "getAllTopics",
        "getTopic",
        "getAllPosts",
        "getPost",
        "getAllReactions",
        "getAllReplies",
        "getReactionByTxid",
        "getPaymentsFor",
    ];

    /// Parses a query name and its parameter.
    ///
    /// # Errors
    ///
    /// - [`OverlayError::UnsupportedQuery`] for an unknown name
    /// - [`OverlayError::MissingParameter`] if a required parameter is absent
    /// - [`OverlayError::InvalidRequest`] if the parameter has the wrong shape
    pub fn parse(name: &str, parameter: Option<&Value>) -> Result<Self, OverlayError> {
        let parameter = parameter.filter(|p| !p.is_null());
        let query = match name {
            "getAllTopics" => Self::AllTopics,
            "getAllReactions" => Self::AllReactions,
            "getAllReplies" => Self::AllReplies,
            "getTopic" => Self::Topic {
                title: string_parameter(name, parameter)?,
            },
            "getAllPosts" => Self::AllPosts {
                topic_txid: string_parameter(name, parameter)?,
            },
            "getPost" => Self::Post {
                post_txid: string_parameter(name, parameter)?,
            },
            "getReactionByTxid" => Self::ReactionByOutpoint(outpoint_parameter(name, parameter)?),
            "getPaymentsFor" => {
                let key = string_parameter(name, parameter)?;
                let key = parse_identity_key(&key).map_err(|_| {
                    OverlayError::InvalidRequest(format!("{name}: {key:?} is not a public key"))
                })?;
                Self::PaymentsFor {
                    recipient_key: to_compressed_hex(&key),
                }
            }
            other => return Err(OverlayError::UnsupportedQuery(other.to_string())),
        };
        Ok(query)
    }
}

fn string_parameter(name: &str, parameter: Option<&Value>) -> Result<String, OverlayError> {
    match parameter {
        None => Err(OverlayError::MissingParameter(name.to_string())),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(OverlayError::InvalidRequest(format!(
            "{name} expects a string parameter"
        ))),
    }
}

/// Accepts `{"txid": .., "outputIndex": ..}` or `"txid.index"`.
fn outpoint_parameter(name: &str, parameter: Option<&Value>) -> Result<Outpoint, OverlayError> {
    match parameter {
        None => Err(OverlayError::MissingParameter(name.to_string())),
        Some(Value::String(value)) => value.parse(),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            OverlayError::InvalidRequest(format!("{name} expects {{txid, outputIndex}}: {e}"))
        }),
    }
}

/// Answers [`LookupQuery`] values from the record store.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<dyn RecordStore>,
}

impl QueryEngine {
    /// Creates an engine reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Runs a query.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::PersistenceError`] if the store fails.
    pub async fn execute(&self, query: &LookupQuery) -> Result<Vec<Outpoint>, OverlayError> {
        match query {
            LookupQuery::AllTopics => self.find(Collection::Topics, RecordFilter::All).await,
            LookupQuery::Topic { title } => {
                let mut matches = self
                    .find(Collection::Topics, RecordFilter::TopicTitle(title.clone()))
                    .await?;
                matches.truncate(1);
                Ok(matches)
            }
            LookupQuery::AllPosts { topic_txid } => {
                let filter = RecordFilter::TopicTxid(topic_txid.clone());
                let mut outpoints = self.find(Collection::Posts, filter.clone()).await?;
                outpoints.extend(self.find(Collection::Reactions, filter).await?);
                Ok(outpoints)
            }
            LookupQuery::Post { post_txid } => {
                let mut outpoints = self
                    .find(Collection::Posts, RecordFilter::OwnTxid(post_txid.clone()))
                    .await?;
                outpoints.truncate(1);
                let children = RecordFilter::ParentPostTxid(post_txid.clone());
                outpoints.extend(self.find(Collection::Replies, children.clone()).await?);
                outpoints.extend(self.find(Collection::Reactions, children).await?);
                Ok(outpoints)
            }
            LookupQuery::AllReactions => self.find(Collection::Reactions, RecordFilter::All).await,
            LookupQuery::AllReplies => self.find(Collection::Replies, RecordFilter::All).await,
            LookupQuery::ReactionByOutpoint(outpoint) => {
                self.find(Collection::Reactions, RecordFilter::Outpoint(outpoint.clone()))
                    .await
            }
            LookupQuery::PaymentsFor { recipient_key } => {
                self.find(
                    Collection::Reactions,
                    RecordFilter::RecipientKey(recipient_key.clone()),
                )
                .await
            }
        }
    }

    async fn find(
        &self,
        collection: Collection,
        filter: RecordFilter,
    ) -> Result<Vec<Outpoint>, OverlayError> {
        self.store.find(collection, &filter).await
    }
}
