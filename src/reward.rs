use std::sync::Arc;

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::instruction::mint_to;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::MintError;
use crate::helper::explorer_tx_url;
use crate::rpc::ChainRpc;
use crate::validate::TransferParameters;

pub const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    pub recipient: Pubkey,
    pub quantity: u64,
}

/// Server-side bookkeeping for a reward mint. Never reported to the client.
#[derive(Debug)]
pub enum MintState {
    Succeeded,
    Failed(MintError),
}

/// Mints reward tokens with the server's authority keypair.
pub struct RewardMinter {
    rpc: Arc<dyn ChainRpc>,
    mint: Pubkey,
    authority: Arc<Keypair>,
    explorer_cluster: String,
}

impl RewardMinter {
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        mint: Pubkey,
        authority: Arc<Keypair>,
        explorer_cluster: String,
    ) -> Self {
        RewardMinter {
            rpc,
            mint,
            authority,
            explorer_cluster,
        }
    }

    /// Returns the owner's associated token account and, if it does not exist
    /// yet, the instruction that creates it.
    async fn resolve_associated_account(
        &self,
        owner: &Pubkey,
    ) -> Result<(Pubkey, Option<Instruction>), MintError> {
        let ata = get_associated_token_address(owner, &self.mint);
        let exists = self
            .rpc
            .account_exists(&ata)
            .await
            .map_err(MintError::AssociatedAccount)?;

        if exists {
            return Ok((ata, None));
        }

        log::info!("creating associated token account {} for {}", ata, owner);
        let create = create_associated_token_account_idempotent(
            &self.authority.pubkey(),
            owner,
            &self.mint,
            &spl_token::id(),
        );
        Ok((ata, Some(create)))
    }

    pub async fn mint(&self, request: &MintRequest) -> Result<Signature, MintError> {
        let (ata, create) = self.resolve_associated_account(&request.recipient).await?;

        let mint_ix = mint_to(
            &spl_token::id(),
            &self.mint,
            &ata,
            &self.authority.pubkey(),
            &[],
            request.quantity,
        )
        .map_err(|e| MintError::MintFailed(format!("failed to create mint instruction: {}", e)))?;

        let instructions: Vec<Instruction> = create.into_iter().chain(Some(mint_ix)).collect();

        let latest = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| MintError::MintFailed(e.to_string()))?;

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&self.authority.pubkey()),
            &[self.authority.as_ref()],
            latest.blockhash,
        );

        self.rpc
            .send_transaction(&transaction)
            .await
            .map_err(|e| MintError::MintFailed(e.to_string()))
    }

    pub async fn process(&self, request: MintRequest) -> MintState {
        log::info!(
            "mint pending: {} reward units to {}",
            request.quantity,
            request.recipient
        );

        match self.mint(&request).await {
            Ok(signature) => {
                log::info!(
                    "mint succeeded for {}: {}",
                    request.recipient,
                    explorer_tx_url(&signature.to_string(), &self.explorer_cluster)
                );
                MintState::Succeeded
            }
            Err(e) => {
                let e = e.into_mint_failed();
                log::error!("mint for {} failed: {}", request.recipient, e);
                MintState::Failed(e)
            }
        }
    }
}

/// Hands mint requests to a background worker. Cloning shares the queue.
#[derive(Clone)]
pub struct RewardMintDispatcher {
    sender: Option<mpsc::Sender<MintRequest>>,
}

impl RewardMintDispatcher {
    pub fn disabled() -> Self {
        RewardMintDispatcher { sender: None }
    }

    /// Spawns the worker on the current tokio runtime.
    pub fn start(minter: RewardMinter, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        tokio::spawn(run_worker(Arc::new(minter), receiver));
        RewardMintDispatcher {
            sender: Some(sender),
        }
    }

    /// Queues a mint without waiting for it. Returns whether it was queued.
    pub fn dispatch(&self, params: &TransferParameters, recipient: Pubkey) -> bool {
        let request = MintRequest {
            recipient,
            quantity: params.reward_quantity(),
        };

        let Some(sender) = &self.sender else {
            log::warn!(
                "reward minting disabled, skipping {} units for {}",
                request.quantity,
                recipient
            );
            return false;
        };

        match sender.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                log::warn!("mint queue full, dropping reward for {}", request.recipient);
                false
            }
            Err(TrySendError::Closed(request)) => {
                log::error!("mint worker stopped, dropping reward for {}", request.recipient);
                false
            }
        }
    }
}

/// Mints one request at a time, so the channel capacity bounds the backlog.
async fn run_worker(minter: Arc<RewardMinter>, mut receiver: mpsc::Receiver<MintRequest>) {
    log::info!("reward mint worker started");
    let (mut succeeded, mut failed) = (0u64, 0u64);
    while let Some(request) = receiver.recv().await {
        match minter.process(request).await {
            MintState::Succeeded => succeeded += 1,
            MintState::Failed(e) => {
                failed += 1;
                log::debug!("last mint failure: {}", e);
            }
        }
        log::debug!(
            "mint worker totals: {} succeeded, {} failed, {} queued",
            succeeded,
            failed,
            receiver.len()
        );
    }
    log::info!("reward mint worker stopped");
}
