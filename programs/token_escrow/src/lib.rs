//! Token Escrow Program (Native Solana)
//!
//! An initiator locks a deposit of one SPL token in a program-derived vault and
//! names the amount of a second token they want in return. Any taker can settle
//! the swap atomically; until then the initiator can cancel and recover the deposit.

pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use solana_program;

use solana_program::{program_error::ProgramError, pubkey::Pubkey};

// Re-export for tests and clients
pub use error::EscrowError;
pub use instruction::EscrowInstruction;
pub use state::{EscrowRecord, EscrowStatus};

/// Derive the vault token account address for an escrow record.
pub fn find_vault_address(escrow: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[state::seeds::VAULT_SEED, escrow.as_ref()], program_id)
}

/// Recompute the vault address from a known bump.
///
/// Fails when the seeds and bump land on the ed25519 curve.
pub fn vault_address_with_bump(
    escrow: &Pubkey,
    vault_bump: u8,
    program_id: &Pubkey,
) -> Result<Pubkey, ProgramError> {
    Pubkey::create_program_address(
        &[state::seeds::VAULT_SEED, escrow.as_ref(), &[vault_bump]],
        program_id,
    )
    .map_err(|_| EscrowError::BumpMismatch.into())
}
