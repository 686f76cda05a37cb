//! Account state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo, program_error::ProgramError, pubkey::Pubkey,
};

use crate::error::EscrowError;

/// Lifecycle of an escrow record.
///
/// Zeroed account data decodes as `Uninitialized`, so a wiped record is never
/// mistaken for an open one.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowStatus {
    Uninitialized,
    Open,
    Settled,
    Cancelled,
}

/// Terms of a pending swap, written once by `Initialize`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    /// Wallet that deposited funds; may cancel and receives proceeds
    pub initiator: Pubkey,
    /// Mint of the escrowed tokens
    pub deposit_mint: Pubkey,
    /// Mint the initiator wants in exchange
    pub receive_mint: Pubkey,
    /// Amount locked in the vault
    pub amount_deposit: u64,
    /// Amount the taker must pay
    pub amount_wanted: u64,
    /// Vault PDA bump seed
    pub vault_bump: u8,
    pub status: EscrowStatus,
}

impl EscrowRecord {
    pub const LEN: usize = 32 + 32 + 32 + 8 + 8 + 1 + 1; // 114 bytes

    pub fn new(
        initiator: Pubkey,
        deposit_mint: Pubkey,
        receive_mint: Pubkey,
        amount_deposit: u64,
        amount_wanted: u64,
        vault_bump: u8,
    ) -> Self {
        Self {
            initiator,
            deposit_mint,
            receive_mint,
            amount_deposit,
            amount_wanted,
            vault_bump,
            status: EscrowStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == EscrowStatus::Open
    }

    /// Load an open record owned by `program_id`.
    ///
    /// A closed account is handed back to the system program with no data, so
    /// anything that is not a live program-owned record reports `AlreadySettled`.
    pub fn load_open(account: &AccountInfo, program_id: &Pubkey) -> Result<Self, ProgramError> {
        if account.owner != program_id || account.data_len() != Self::LEN {
            return Err(EscrowError::AlreadySettled.into());
        }
        let record = Self::try_from_slice(&account.data.borrow())
            .map_err(|_| EscrowError::AlreadySettled)?;
        if !record.is_open() {
            return Err(EscrowError::AlreadySettled.into());
        }
        Ok(record)
    }

    pub fn save(&self, account: &AccountInfo) -> Result<(), ProgramError> {
        self.serialize(&mut &mut account.data.borrow_mut()[..])?;
        Ok(())
    }
}

/// Seeds for PDA derivation
pub mod seeds {
    pub const VAULT_SEED: &[u8] = b"vault";
}
