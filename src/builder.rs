use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey, system_instruction,
    transaction::Transaction,
};

use crate::error::ActionError;
use crate::helper::parse_pubkey;
use crate::response::ActionPostResponse;
use crate::rpc::ChainRpc;
use crate::validate::TransferParameters;

/// A transfer ready for the wallet to sign. Only valid until
/// `last_valid_block_height`, so it is rebuilt for every request.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
    pub last_valid_block_height: u64,
    pub instructions: Vec<Instruction>,
}

impl UnsignedTransaction {
    pub fn to_transaction(&self) -> Transaction {
        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &self.recent_blockhash,
        );
        Transaction::new_unsigned(message)
    }

    /// Legacy wire format with zeroed signature slots, base64 encoded.
    pub fn to_base64(&self) -> Result<String, ActionError> {
        let wire = bincode::serialize(&self.to_transaction())
            .map_err(|e| ActionError::Encoding(e.to_string()))?;
        Ok(BASE64.encode(wire))
    }
}

pub async fn build(
    rpc: &dyn ChainRpc,
    params: &TransferParameters,
    source: Option<&str>,
) -> Result<(UnsignedTransaction, String), ActionError> {
    let source = source
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ActionError::MissingSource)?;
    let from = parse_pubkey(source).map_err(|e| ActionError::InvalidSource(e.to_string()))?;

    let minimum_balance = rpc
        .get_minimum_balance_for_rent_exemption(0)
        .await
        .map_err(|e| ActionError::NetworkUnavailable(e.to_string()))?;

    let lamports = params.lamports();
    if lamports < minimum_balance {
        return Err(ActionError::BelowRentExemption(params.recipient.to_string()));
    }

    let instruction = system_instruction::transfer(&from, &params.recipient, lamports);

    let latest = rpc
        .get_latest_blockhash()
        .await
        .map_err(|e| ActionError::NetworkUnavailable(e.to_string()))?;

    let transaction = UnsignedTransaction {
        fee_payer: from,
        recent_blockhash: latest.blockhash,
        last_valid_block_height: latest.last_valid_block_height,
        instructions: vec![instruction],
    };
    let message = format!("Send {} SOL to {}", params.amount, params.recipient);

    log::debug!(
        "built transfer of {} lamports from {} to {} (valid until height {})",
        lamports,
        from,
        params.recipient,
        latest.last_valid_block_height
    );

    Ok((transaction, message))
}

pub fn into_post_response(
    transaction: &UnsignedTransaction,
    message: String,
) -> Result<ActionPostResponse, ActionError> {
    Ok(ActionPostResponse {
        transaction: transaction.to_base64()?,
        message,
    })
}
