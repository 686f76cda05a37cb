//! Instruction definitions and client-side builders

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program, sysvar,
};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Open an escrow: create the record and vault, then lock the deposit
    ///
    /// Accounts expected:
    /// 0. `[writable, signer]` Initiator
    /// 1. `[writable]` Initiator token account (deposit mint)
    /// 2. `[]` Deposit mint
    /// 3. `[]` Receive mint
    /// 4. `[writable, signer]` Escrow record (fresh account)
    /// 5. `[writable]` Vault (PDA)
    /// 6. `[]` Token program
    /// 7. `[]` System program
    /// 8. `[]` Rent sysvar
    Initialize {
        vault_bump: u8,
        amount_deposit: u64,
        amount_wanted: u64,
    },

    /// Swap the taker's payment for the vault contents and close the escrow
    ///
    /// Accounts expected:
    /// 0. `[signer]` Taker
    /// 1. `[writable]` Taker payment token account (receive mint)
    /// 2. `[writable]` Taker receive token account (deposit mint)
    /// 3. `[writable]` Initiator receive token account (receive mint)
    /// 4. `[writable]` Initiator, refunded the record and vault rent
    /// 5. `[writable]` Escrow record
    /// 6. `[writable]` Vault (PDA)
    /// 7. `[]` Token program
    Accept,

    /// Return the deposit to the initiator and close the escrow
    ///
    /// Accounts expected:
    /// 0. `[writable, signer]` Initiator
    /// 1. `[writable]` Initiator refund token account (deposit mint)
    /// 2. `[writable]` Escrow record
    /// 3. `[writable]` Vault (PDA)
    /// 4. `[]` Token program
    Cancel,
}

/// Build an `Initialize` instruction.
#[allow(clippy::too_many_arguments)]
pub fn initialize(
    program_id: &Pubkey,
    initiator: &Pubkey,
    initiator_token_account: &Pubkey,
    deposit_mint: &Pubkey,
    receive_mint: &Pubkey,
    escrow: &Pubkey,
    vault: &Pubkey,
    vault_bump: u8,
    amount_deposit: u64,
    amount_wanted: u64,
) -> Result<Instruction, ProgramError> {
    let data = EscrowInstruction::Initialize {
        vault_bump,
        amount_deposit,
        amount_wanted,
    }
    .try_to_vec()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*initiator, true),
            AccountMeta::new(*initiator_token_account, false),
            AccountMeta::new_readonly(*deposit_mint, false),
            AccountMeta::new_readonly(*receive_mint, false),
            AccountMeta::new(*escrow, true),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data,
    })
}

/// Build an `Accept` instruction. The vault address is derived from `escrow`.
pub fn accept(
    program_id: &Pubkey,
    taker: &Pubkey,
    taker_payment_account: &Pubkey,
    taker_receive_account: &Pubkey,
    initiator_receive_account: &Pubkey,
    initiator: &Pubkey,
    escrow: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (vault, _) = crate::find_vault_address(escrow, program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*taker, true),
            AccountMeta::new(*taker_payment_account, false),
            AccountMeta::new(*taker_receive_account, false),
            AccountMeta::new(*initiator_receive_account, false),
            AccountMeta::new(*initiator, false),
            AccountMeta::new(*escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: EscrowInstruction::Accept.try_to_vec()?,
    })
}

/// Build a `Cancel` instruction. The vault address is derived from `escrow`.
pub fn cancel(
    program_id: &Pubkey,
    initiator: &Pubkey,
    initiator_refund_account: &Pubkey,
    escrow: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (vault, _) = crate::find_vault_address(escrow, program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*initiator, true),
            AccountMeta::new(*initiator_refund_account, false),
            AccountMeta::new(*escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: EscrowInstruction::Cancel.try_to_vec()?,
    })
}
