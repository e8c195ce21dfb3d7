//! Field-level validation of decoded forum outputs.
//!
//! [`RecordValidator::project`] applies the structural rules (arity, UTF-8,
//! required fields, identity keys, slug titles, pricing) and builds a typed
//! [`Record`]. [`RecordValidator::validate`] adds the time-dependent
//! freshness rule on top, and is what admission runs.

use std::sync::Arc;

use crate::config::ProtocolConfig;
use crate::domain::{Post, Reaction, Record, RecordKind, Reply, Topic, TypeTag};
use crate::keys::{parse_identity_key, to_compressed_hex};

use super::payout::required_price;
use super::reject::RejectReason;

/// Turns decoded field lists into typed records.
#[derive(Debug, Clone)]
pub struct RecordValidator {
    config: Arc<ProtocolConfig>,
}

impl RecordValidator {
    /// Creates a validator bound to the given policy.
    #[must_use]
    pub fn new(config: Arc<ProtocolConfig>) -> Self {
        Self { config }
    }

    /// Validates a decoded output at admission time `now_ms`.
    ///
    /// Returns `Ok(None)` for outputs whose type tag belongs to another
    /// protocol.
    ///
    /// # Errors
    ///
    /// Returns the first [`RejectReason`] the fields violate.
    pub fn validate(
        &self,
        fields: &[Vec<u8>],
        now_ms: i64,
    ) -> Result<Option<Record>, RejectReason> {
        let Some(record) = self.project(fields)? else {
            return Ok(None);
        };
        if let Some(created_at) = record.created_at() {
            check_freshness(created_at, now_ms, self.config.freshness_window_ms())?;
        }
        Ok(Some(record))
    }

    /// Builds a record from decoded fields without the freshness rule.
    ///
    /// Used when indexing an output that was already admitted, possibly long
    /// after its creation time.
    ///
    /// # Errors
    ///
    /// Returns the first structural [`RejectReason`] the fields violate.
    pub fn project(&self, fields: &[Vec<u8>]) -> Result<Option<Record>, RejectReason> {
        let tag = fields.first().ok_or(RejectReason::NoFields)?;
        let tag =
            std::str::from_utf8(tag).map_err(|_| RejectReason::InvalidUtf8 { field: "type" })?;

        let kind = match TypeTag::classify(tag) {
            TypeTag::Known(kind) => kind,
            TypeTag::Unknown(_) => return Ok(None),
        };
        if fields.len() != kind.field_count() {
            return Err(RejectReason::FieldCount {
                kind,
                expected: kind.field_count(),
                actual: fields.len(),
            });
        }

        let fields = Fields { kind, fields };
        let record = match kind {
            RecordKind::Topic => Record::Topic(fields.topic()?),
            RecordKind::Post => Record::Post(fields.post()?),
            RecordKind::Reply => Record::Reply(fields.reply()?),
            RecordKind::Reaction => Record::Reaction(fields.reaction(&self.config)?),
        };
        Ok(Some(record))
    }
}

/// Rejects `created_at` outside `[now - window, now]`.
///
/// # Errors
///
/// Returns [`RejectReason::FutureTimestamp`] or
/// [`RejectReason::StaleTimestamp`].
pub fn check_freshness(created_at: i64, now_ms: i64, window_ms: i64) -> Result<(), RejectReason> {
    if created_at > now_ms {
        return Err(RejectReason::FutureTimestamp {
            created_at,
            now: now_ms,
        });
    }
    if created_at < now_ms.saturating_sub(window_ms) {
        return Err(RejectReason::StaleTimestamp {
            created_at,
            now: now_ms,
        });
    }
    Ok(())
}

/// `[A-Za-z0-9_-]+`.
fn is_slug(title: &str) -> bool {
    !title.is_empty()
        && title
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Positional view over a field list whose arity has been checked.
struct Fields<'a> {
    kind: RecordKind,
    fields: &'a [Vec<u8>],
}

impl Fields<'_> {
    fn text(&self, index: usize, field: &'static str) -> Result<String, RejectReason> {
        let raw = self.fields.get(index).map(Vec::as_slice).unwrap_or_default();
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| RejectReason::InvalidUtf8 { field })
    }

    fn required(&self, index: usize, field: &'static str) -> Result<String, RejectReason> {
        let value = self.text(index, field)?;
        if value.is_empty() {
            return Err(RejectReason::EmptyField {
                kind: self.kind,
                field,
            });
        }
        Ok(value)
    }

    fn optional(&self, index: usize, field: &'static str) -> Result<Option<String>, RejectReason> {
        let value = self.text(index, field)?;
        Ok((!value.is_empty()).then_some(value))
    }

    fn timestamp(&self, index: usize) -> Result<i64, RejectReason> {
        let value = self.text(index, "createdAt")?;
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RejectReason::InvalidTimestamp(value));
        }
        value
            .parse()
            .map_err(|_| RejectReason::InvalidTimestamp(value))
    }

    /// Identity keys are stored in compressed hex so equality lookups work
    /// regardless of how the author encoded them.
    fn identity_key(&self, index: usize, field: &'static str) -> Result<String, RejectReason> {
        let value = self.text(index, field)?;
        let key =
            parse_identity_key(&value).map_err(|_| RejectReason::InvalidIdentityKey { field })?;
        Ok(to_compressed_hex(&key))
    }

    fn topic(&self) -> Result<Topic, RejectReason> {
        let title = self.required(1, "title")?;
        if !is_slug(&title) {
            return Err(RejectReason::TitleNotSlug(title));
        }
        Ok(Topic {
            title,
            description: self.required(2, "description")?,
            created_at: self.timestamp(3)?,
            created_by: self.identity_key(4, "createdBy")?,
        })
    }

    fn post(&self) -> Result<Post, RejectReason> {
        let tags = self
            .text(7, "tags")?
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Post {
            topic_txid: self.required(1, "topicTxid")?,
            title: self.required(2, "title")?,
            media_url: self.optional(3, "mediaUrl")?,
            body: self.required(4, "body")?,
            created_at: self.timestamp(5)?,
            created_by: self.identity_key(6, "createdBy")?,
            tags,
            pre_edit_txid: self.optional(8, "preEditTxid")?,
        })
    }

    fn reply(&self) -> Result<Reply, RejectReason> {
        Ok(Reply {
            post_txid: self.required(1, "postTxid")?,
            parent_reply_txid: self.optional(2, "parentReplyTxid")?,
            media_url: self.optional(3, "mediaUrl")?,
            body: self.required(4, "body")?,
            created_at: self.timestamp(5)?,
            created_by: self.identity_key(6, "createdBy")?,
            pre_edit_txid: self.optional(7, "preEditTxid")?,
        })
    }

    fn reaction(&self, config: &ProtocolConfig) -> Result<Reaction, RejectReason> {
        let emoji = self.required(4, "emoji")?;
        let payout_sats = required_price(&config.emoji_prices, &emoji)?;
        Ok(Reaction {
            topic_txid: self.required(1, "topicTxid")?,
            parent_post_txid: self.required(2, "parentPostTxid")?,
            direct_parent_txid: self.required(3, "directParentTxid")?,
            emoji,
            created_by: self.identity_key(5, "createdBy")?,
            recipient_key: self.identity_key(6, "recipientKey")?,
            derivation_prefix: self.text(7, "derivationPrefix")?,
            derivation_suffix: self.text(8, "derivationSuffix")?,
            payout_sats,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use k256::SecretKey;

    pub(crate) const NOW: i64 = 1_700_000_000_000;

    pub(crate) fn key_hex(seed: u8) -> String {
        let Ok(secret) = SecretKey::from_slice(&[seed; 32]) else {
            panic!("valid secret");
        };
        to_compressed_hex(&secret.public_key())
    }

    pub(crate) fn fields(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    pub(crate) fn topic_fields(title: &str, created_at: i64) -> Vec<Vec<u8>> {
        let author = key_hex(1);
        fields(&["topic", title, "all about cats", &created_at.to_string(), &author, ""])
    }

    pub(crate) fn post_fields(topic_txid: &str, created_at: i64) -> Vec<Vec<u8>> {
        let author = key_hex(2);
        fields(&[
            "post",
            topic_txid,
            "First!",
            "",
            "hello world",
            &created_at.to_string(),
            &author,
            " cats, ,kittens ",
            "",
        ])
    }

    pub(crate) fn reaction_fields(post_txid: &str, emoji: &str) -> Vec<Vec<u8>> {
        let reactor = key_hex(3);
        let recipient = key_hex(2);
        fields(&[
            "reaction", "topic-tx", post_txid, post_txid, emoji, &reactor, &recipient, "pfx",
            "sfx", "",
        ])
    }

    fn validator() -> RecordValidator {
        RecordValidator::new(Arc::new(ProtocolConfig::default()))
    }

    const WINDOW: i64 = 30 * 60 * 1000;

    #[test]
    fn fresh_topic_is_accepted() {
        let fields = topic_fields("cute-cats_2", NOW);
        let Ok(Some(Record::Topic(topic))) = validator().validate(&fields, NOW) else {
            panic!("topic should validate");
        };
        assert_eq!(topic.title, "cute-cats_2");
        assert_eq!(topic.created_at, NOW);
        assert_eq!(topic.created_by, key_hex(1));
    }

    #[test]
    fn freshness_window_boundaries() {
        let v = validator();
        assert!(v.validate(&topic_fields("cats", NOW - WINDOW), NOW).is_ok());
        assert!(matches!(
            v.validate(&topic_fields("cats", NOW - WINDOW - 1), NOW),
            Err(RejectReason::StaleTimestamp { .. })
        ));
        assert!(matches!(
            v.validate(&topic_fields("cats", NOW + 1), NOW),
            Err(RejectReason::FutureTimestamp { .. })
        ));
    }

    #[test]
    fn project_skips_freshness() {
        let old = topic_fields("cats", NOW - 10 * WINDOW);
        assert!(matches!(validator().project(&old), Ok(Some(Record::Topic(_)))));
    }

    #[test]
    fn topic_title_must_be_slug() {
        let v = validator();
        assert!(matches!(
            v.validate(&topic_fields("Cute Cats", NOW), NOW),
            Err(RejectReason::TitleNotSlug(_))
        ));
        assert!(matches!(
            v.validate(&topic_fields("café", NOW), NOW),
            Err(RejectReason::TitleNotSlug(_))
        ));
    }

    #[test]
    fn unknown_tag_is_ignored() {
        assert_eq!(validator().validate(&fields(&["vote", "x"]), NOW), Ok(None));
        assert_eq!(validator().validate(&fields(&["Topic"]), NOW), Ok(None));
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert_eq!(validator().validate(&[], NOW), Err(RejectReason::NoFields));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut reaction = reaction_fields("post-tx", "🔥");
        reaction.pop();
        assert_eq!(
            validator().validate(&reaction, NOW),
            Err(RejectReason::FieldCount {
                kind: RecordKind::Reaction,
                expected: 10,
                actual: 9,
            })
        );
    }

    #[test]
    fn post_tags_and_optionals() {
        let Ok(Some(Record::Post(post))) = validator().validate(&post_fields("topic-tx", NOW), NOW)
        else {
            panic!("post should validate");
        };
        assert_eq!(post.tags, vec!["cats".to_string(), "kittens".to_string()]);
        assert_eq!(post.media_url, None);
        assert_eq!(post.pre_edit_txid, None);
    }

    #[test]
    fn post_requires_body() {
        let mut post = post_fields("topic-tx", NOW);
        if let Some(body) = post.get_mut(4) {
            body.clear();
        }
        assert_eq!(
            validator().validate(&post, NOW),
            Err(RejectReason::EmptyField {
                kind: RecordKind::Post,
                field: "body",
            })
        );
    }

    #[test]
    fn reply_with_nested_parent() {
        let author = key_hex(4);
        let reply = fields(&[
            "reply",
            "post-tx",
            "reply-tx",
            "",
            "me too",
            &NOW.to_string(),
            &author,
            "",
        ]);
        let Ok(Some(Record::Reply(reply))) = validator().validate(&reply, NOW) else {
            panic!("reply should validate");
        };
        assert_eq!(reply.parent_reply_txid.as_deref(), Some("reply-tx"));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut topic = topic_fields("cats", NOW);
        if let Some(description) = topic.get_mut(2) {
            *description = vec![0xff, 0xfe];
        }
        assert_eq!(
            validator().validate(&topic, NOW),
            Err(RejectReason::InvalidUtf8 {
                field: "description"
            })
        );
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let author = key_hex(1);
        for bad in ["", "12abc", "-5", "1.5e3"] {
            let topic = fields(&["topic", "cats", "d", bad, &author, ""]);
            assert!(matches!(
                validator().validate(&topic, NOW),
                Err(RejectReason::InvalidTimestamp(_))
            ));
        }
    }

    #[test]
    fn author_must_be_a_public_key() {
        let topic = fields(&["topic", "cats", "d", &NOW.to_string(), "bob", ""]);
        assert_eq!(
            validator().validate(&topic, NOW),
            Err(RejectReason::InvalidIdentityKey { field: "createdBy" })
        );
    }

    #[test]
    fn reaction_carries_price() {
        let Ok(Some(Record::Reaction(reaction))) =
            validator().validate(&reaction_fields("post-tx", "🔥"), NOW)
        else {
            panic!("reaction should validate");
        };
        assert_eq!(reaction.payout_sats, 2_500);
        assert_eq!(reaction.recipient_key, key_hex(2));
    }

    #[test]
    fn unpriced_emoji_is_rejected() {
        assert_eq!(
            validator().validate(&reaction_fields("post-tx", "🦀"), NOW),
            Err(RejectReason::UnpricedEmoji("🦀".to_string()))
        );
    }
}
