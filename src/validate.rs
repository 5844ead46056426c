use solana_sdk::pubkey::Pubkey;

use crate::error::ActionError;
use crate::helper::{CENTS_PER_SOL, LAMPORTS_PER_CENT, parse_pubkey};

pub const DEFAULT_AMOUNT: f64 = 1.0;
pub const MIN_AMOUNT: f64 = 0.01;

/// Largest amount in hundredths that still fits in a u64 lamport count.
const MAX_CENTS: u64 = u64::MAX / LAMPORTS_PER_CENT;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferParameters {
    pub recipient: Pubkey,
    pub amount: f64,
    /// `amount` in hundredths. Every downstream unit is derived from this.
    pub cents: u64,
}

impl TransferParameters {
    pub fn lamports(&self) -> u64 {
        self.cents * LAMPORTS_PER_CENT
    }

    /// Raw units of the reward token owed for this purchase.
    pub fn reward_quantity(&self) -> u64 {
        self.cents
    }
}

pub fn validate(
    raw_to: Option<&str>,
    raw_amount: Option<&str>,
    default_recipient: &Pubkey,
) -> Result<TransferParameters, ActionError> {
    let recipient = match raw_to.filter(|s| !s.trim().is_empty()) {
        Some(to) => parse_pubkey(to).map_err(|_| ActionError::InvalidRecipient)?,
        None => *default_recipient,
    };

    let cents = match raw_amount.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_cents(raw.trim())?,
        None => (DEFAULT_AMOUNT * CENTS_PER_SOL as f64) as u64,
    };

    if cents > MAX_CENTS {
        return Err(ActionError::InvalidAmount("amount is too large"));
    }

    Ok(TransferParameters {
        recipient,
        amount: cents as f64 / CENTS_PER_SOL as f64,
        cents,
    })
}

/// Parses a decimal amount into hundredths. The fractional digits are counted
/// on the text so large amounts cannot round their way past the 2-digit limit.
fn parse_cents(raw: &str) -> Result<u64, ActionError> {
    let amount = raw
        .parse::<f64>()
        .map_err(|_| ActionError::InvalidAmount("not a number"))?;

    if !amount.is_finite() {
        return Err(ActionError::InvalidAmount("not a number"));
    }
    if amount <= 0.0 {
        return Err(ActionError::InvalidAmount("amount is too small"));
    }
    if amount < MIN_AMOUNT {
        return Err(ActionError::InvalidAmount("minimum amount is 0.01"));
    }

    let unsigned = raw.strip_prefix('+').unwrap_or(raw);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let fraction = fraction.trim_end_matches('0');
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(ActionError::InvalidAmount("not a plain decimal number"));
    }
    if fraction.len() > 2 {
        return Err(ActionError::InvalidAmount("at most 2 decimal places"));
    }

    let too_large = || ActionError::InvalidAmount("amount is too large");
    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| too_large())?
            .checked_mul(CENTS_PER_SOL)
            .ok_or_else(too_large)?
    };
    let fraction_cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u64>().map_err(|_| too_large())? * 10,
        _ => fraction.parse::<u64>().map_err(|_| too_large())?,
    };

    whole_cents.checked_add(fraction_cents).ok_or_else(too_large)
}
