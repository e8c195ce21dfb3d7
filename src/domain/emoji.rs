//! Emoji price table for paid reactions.
//!
//! [`EmojiPriceTable`] maps a canonical emoji to the payout, in satoshis, a
//! reaction with that emoji must carry. It is built once at startup and only
//! read afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variation selector-16 (emoji presentation).
const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Fitzpatrick skin-tone modifiers.
const SKIN_TONE_MODIFIERS: std::ops::RangeInclusive<char> = '\u{1F3FB}'..='\u{1F3FF}';

/// Immutable mapping from emoji to required payout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiPriceTable {
    prices: BTreeMap<String, u64>,
}

impl EmojiPriceTable {
    /// Builds a table from `(emoji, sats)` pairs.
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            prices: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Price for an emoji exactly as written, falling back to its canonical
    /// form with variation selectors and skin tones stripped.
    #[must_use]
    pub fn price_of(&self, emoji: &str) -> Option<u64> {
        if let Some(price) = self.prices.get(emoji) {
            return Some(*price);
        }
        self.prices.get(&normalize_emoji(emoji)).copied()
    }

    /// Number of configured emojis.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns `true` when no emoji is priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Iterates over `(emoji, sats)` in emoji order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.prices.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Strips U+FE0F and the U+1F3FB–U+1F3FF skin-tone modifiers.
#[must_use]
pub fn normalize_emoji(emoji: &str) -> String {
    emoji
        .chars()
        .filter(|c| *c != VARIATION_SELECTOR_16 && !SKIN_TONE_MODIFIERS.contains(c))
        .collect()
}

/// Table used when no price file is configured.
#[must_use]
pub fn default_price_table() -> EmojiPriceTable {
    EmojiPriceTable::new([
        ("👍", 1_000),
        ("👎", 1_000),
        ("👏", 1_500),
        ("🙏", 1_500),
        ("🙌", 1_500),
        ("👀", 1_000),
        ("😀", 1_000),
        ("😁", 1_000),
        ("😂", 1_000),
        ("🤣", 1_000),
        ("🙂", 1_000),
        ("😉", 1_000),
        ("😊", 1_000),
        ("😍", 2_000),
        ("😘", 2_000),
        ("😎", 1_500),
        ("😭", 1_000),
        ("😢", 1_000),
        ("😡", 1_000),
        ("😱", 1_000),
        ("😮", 1_000),
        ("🤔", 1_000),
        ("🙃", 1_000),
        ("🥲", 1_000),
        ("❤", 2_500),
        ("💔", 1_000),
        ("🔥", 2_500),
        ("✨", 1_500),
        ("🎉", 5_000),
        ("💯", 5_000),
    ])
}
