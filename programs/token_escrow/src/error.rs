//! Error types

use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Mint mismatch")]
    MintMismatch,

    #[error("Vault bump does not derive the vault address")]
    BumpMismatch,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Escrow already settled")]
    AlreadySettled,

    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Invalid account owner")]
    InvalidAccountOwner,

    #[error("Invalid vault")]
    InvalidVault,

    #[error("Recipient mismatch")]
    RecipientMismatch,

    #[error("Escrow already exists")]
    EscrowAlreadyExists,

    #[error("Amount overflow")]
    AmountOverflow,
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
