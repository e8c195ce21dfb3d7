//! Admission policy: which outputs of a transaction join the overlay.
//!
//! - [`validator`]: field-level rules and record projection
//! - [`payout`]: reaction payout verification
//! - [`decider`]: per-transaction decisions
//! - [`reject`]: diagnostic rejection reasons

pub mod decider;
pub mod payout;
pub mod reject;
pub mod validator;

pub use decider::{AdmissionDecider, AdmittanceInstructions};
pub use payout::{PayoutVerifier, required_price};
pub use reject::RejectReason;
pub use validator::{RecordValidator, check_freshness};
