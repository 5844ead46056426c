use std::str::FromStr;

use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey, signature::Keypair};
use thiserror::Error;

/// Hundredths of a SOL in one lamport-denominated SOL.
pub const CENTS_PER_SOL: u64 = 100;
pub const LAMPORTS_PER_CENT: u64 = LAMPORTS_PER_SOL / CENTS_PER_SOL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("Public key cannot be empty")]
    EmptyPubkey,
    #[error("Invalid public key format")]
    InvalidPubkey,
    #[error("Secret key cannot be empty")]
    EmptySecret,
    #[error("Invalid base58 secret key format")]
    InvalidBase58,
    #[error("Invalid secret key length")]
    InvalidLength,
    #[error("Invalid keypair format")]
    InvalidKeypair,
}

pub fn parse_pubkey(key_str: &str) -> Result<Pubkey, KeyParseError> {
    if key_str.trim().is_empty() {
        return Err(KeyParseError::EmptyPubkey);
    }
    Pubkey::from_str(key_str.trim()).map_err(|_| KeyParseError::InvalidPubkey)
}

pub fn parse_keypair(secret_str: &str) -> Result<Keypair, KeyParseError> {
    if secret_str.trim().is_empty() {
        return Err(KeyParseError::EmptySecret);
    }

    let bytes = bs58::decode(secret_str.trim())
        .into_vec()
        .map_err(|_| KeyParseError::InvalidBase58)?;

    if bytes.len() != 64 {
        return Err(KeyParseError::InvalidLength);
    }

    Keypair::from_bytes(&bytes).map_err(|_| KeyParseError::InvalidKeypair)
}

pub fn cents_to_lamports(cents: u64) -> Option<u64> {
    cents.checked_mul(LAMPORTS_PER_CENT)
}

pub fn explorer_tx_url(signature: &str, cluster: &str) -> String {
    if cluster == "mainnet-beta" {
        format!("https://explorer.solana.com/tx/{}", signature)
    } else {
        format!("https://explorer.solana.com/tx/{}?cluster={}", signature, cluster)
    }
}
