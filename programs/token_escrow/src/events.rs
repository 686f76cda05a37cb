//! Event definitions for the token escrow program.
//!
//! Events are emitted via solana_program::msg! and can be parsed from transaction logs.

use solana_program::{msg, pubkey::Pubkey};

use crate::state::EscrowRecord;

/// Emitted when a deposit is locked and the escrow opens.
pub fn emit_escrow_opened(escrow: &Pubkey, vault: &Pubkey, record: &EscrowRecord) {
    msg!(
        "EscrowOpened: escrow={}, vault={}, initiator={}, deposit_mint={}, amount_deposit={}, receive_mint={}, amount_wanted={}",
        escrow,
        vault,
        record.initiator,
        record.deposit_mint,
        record.amount_deposit,
        record.receive_mint,
        record.amount_wanted
    );
}

/// Emitted when a taker completes the swap.
pub fn emit_escrow_settled(escrow: &Pubkey, taker: &Pubkey, amount_paid: u64, amount_released: u64) {
    msg!(
        "EscrowSettled: escrow={}, taker={}, amount_paid={}, amount_released={}",
        escrow,
        taker,
        amount_paid,
        amount_released
    );
}

/// Emitted when the initiator withdraws the offer.
pub fn emit_escrow_cancelled(escrow: &Pubkey, initiator: &Pubkey, amount_refunded: u64) {
    msg!(
        "EscrowCancelled: escrow={}, initiator={}, amount_refunded={}",
        escrow,
        initiator,
        amount_refunded
    );
}
