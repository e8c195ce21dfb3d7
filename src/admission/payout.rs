//! Reaction payout verification.
//!
//! A reaction is admitted only if some other output of the same transaction
//! pays at least the emoji's price to the P2PKH script of the key derived
//! from the recipient's identity key and the reaction's key id.

use std::sync::Arc;

use crate::config::ProtocolConfig;
use crate::domain::{EmojiPriceTable, Reaction, TransactionOutput};
use crate::keys::{derive_counterparty_key, p2pkh_locking_script, parse_identity_key};

use super::reject::RejectReason;

/// Positive price of `emoji`.
///
/// # Errors
///
/// Returns [`RejectReason::UnpricedEmoji`] when the emoji is missing from the
/// table or priced at zero.
pub fn required_price(prices: &EmojiPriceTable, emoji: &str) -> Result<u64, RejectReason> {
    match prices.price_of(emoji) {
        Some(price) if price > 0 => Ok(price),
        _ => Err(RejectReason::UnpricedEmoji(emoji.to_string())),
    }
}

/// Checks that reactions are paid for.
#[derive(Debug, Clone)]
pub struct PayoutVerifier {
    config: Arc<ProtocolConfig>,
}

impl PayoutVerifier {
    /// Creates a verifier bound to the given policy.
    #[must_use]
    pub fn new(config: Arc<ProtocolConfig>) -> Self {
        Self { config }
    }

    /// Locking script the payout for `reaction` must use.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::EmptyDerivationField`] if either half of the
    /// key id is empty, or a key error if the recipient key is unusable.
    pub fn expected_script(&self, reaction: &Reaction) -> Result<Vec<u8>, RejectReason> {
        if reaction.derivation_prefix.is_empty() || reaction.derivation_suffix.is_empty() {
            return Err(RejectReason::EmptyDerivationField);
        }
        let recipient = parse_identity_key(&reaction.recipient_key).map_err(|_| {
            RejectReason::InvalidIdentityKey {
                field: "recipientKey",
            }
        })?;
        let key_id = format!(
            "{} {}",
            reaction.derivation_prefix, reaction.derivation_suffix
        );
        let derived =
            derive_counterparty_key(&recipient, &self.config.payout_protocol, &key_id)?;
        Ok(p2pkh_locking_script(&derived))
    }

    /// Finds the sibling output paying for `reaction`, which sits at
    /// `own_index` in `outputs`. Returns the amount paid.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::MissingPayout`] when no sibling matches, or
    /// any error from pricing and key derivation.
    pub fn verify(
        &self,
        reaction: &Reaction,
        outputs: &[TransactionOutput],
        own_index: usize,
    ) -> Result<u64, RejectReason> {
        let required = required_price(&self.config.emoji_prices, &reaction.emoji)?;
        let expected = self.expected_script(reaction)?;

        outputs
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != own_index)
            .map(|(_, output)| output)
            .find(|output| output.satoshis >= required && output.locking_script == expected)
            .map(|output| output.satoshis)
            .ok_or(RejectReason::MissingPayout { required })
    }
}
