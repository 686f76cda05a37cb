//! Instruction processing

#![allow(deprecated)] // system_instruction deprecation - will migrate when solana_system_interface is stable

use borsh::BorshDeserialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::{
    error::EscrowError,
    events,
    instruction::EscrowInstruction,
    state::{seeds, EscrowRecord, EscrowStatus},
    vault_address_with_bump,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = EscrowInstruction::try_from_slice(instruction_data)
            .map_err(|_| EscrowError::InvalidInstructionData)?;

        match instruction {
            EscrowInstruction::Initialize {
                vault_bump,
                amount_deposit,
                amount_wanted,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(
                    program_id,
                    accounts,
                    vault_bump,
                    amount_deposit,
                    amount_wanted,
                )
            }
            EscrowInstruction::Accept => {
                msg!("Instruction: Accept");
                Self::process_accept(program_id, accounts)
            }
            EscrowInstruction::Cancel => {
                msg!("Instruction: Cancel");
                Self::process_cancel(program_id, accounts)
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        vault_bump: u8,
        amount_deposit: u64,
        amount_wanted: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let initiator = next_account_info(account_info_iter)?;
        let initiator_token_account = next_account_info(account_info_iter)?;
        let deposit_mint = next_account_info(account_info_iter)?;
        let receive_mint = next_account_info(account_info_iter)?;
        let escrow_account = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;
        let system_program = next_account_info(account_info_iter)?;
        let rent_sysvar = next_account_info(account_info_iter)?;

        // Validate inputs
        if amount_deposit == 0 || amount_wanted == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }
        if !initiator.is_signer || !escrow_account.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        check_token_program(token_program)?;

        load_mint(deposit_mint)?;
        load_mint(receive_mint)?;

        let source = load_token_account(initiator_token_account)?;
        if source.mint != *deposit_mint.key {
            return Err(EscrowError::MintMismatch.into());
        }
        if source.owner != *initiator.key {
            return Err(EscrowError::Unauthorized.into());
        }
        if source.amount < amount_deposit {
            return Err(EscrowError::InsufficientFunds.into());
        }

        if vault_address_with_bump(escrow_account.key, vault_bump, program_id)? != *vault.key {
            return Err(EscrowError::BumpMismatch.into());
        }

        if escrow_account.lamports() > 0 || escrow_account.data_len() > 0 {
            return Err(EscrowError::EscrowAlreadyExists.into());
        }

        let rent = Rent::from_account_info(rent_sysvar)?;

        // Create escrow record account
        invoke(
            &system_instruction::create_account(
                initiator.key,
                escrow_account.key,
                rent.minimum_balance(EscrowRecord::LEN),
                EscrowRecord::LEN as u64,
                program_id,
            ),
            &[initiator.clone(), escrow_account.clone(), system_program.clone()],
        )?;

        // Create vault token account
        let vault_seeds: &[&[u8]] = &[seeds::VAULT_SEED, escrow_account.key.as_ref(), &[vault_bump]];
        invoke_signed(
            &system_instruction::create_account(
                initiator.key,
                vault.key,
                rent.minimum_balance(TokenAccount::LEN),
                TokenAccount::LEN as u64,
                &spl_token::id(),
            ),
            &[initiator.clone(), vault.clone(), system_program.clone()],
            &[vault_seeds],
        )?;

        // The vault is its own token authority
        invoke(
            &spl_token::instruction::initialize_account3(
                &spl_token::id(),
                vault.key,
                deposit_mint.key,
                vault.key,
            )?,
            &[vault.clone(), deposit_mint.clone(), token_program.clone()],
        )?;

        // Transfer deposit to vault
        invoke(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                initiator_token_account.key,
                vault.key,
                initiator.key,
                &[],
                amount_deposit,
            )?,
            &[
                initiator_token_account.clone(),
                vault.clone(),
                initiator.clone(),
                token_program.clone(),
            ],
        )?;

        let record = EscrowRecord::new(
            *initiator.key,
            *deposit_mint.key,
            *receive_mint.key,
            amount_deposit,
            amount_wanted,
            vault_bump,
        );
        record.save(escrow_account)?;

        events::emit_escrow_opened(escrow_account.key, vault.key, &record);
        Ok(())
    }

    fn process_accept(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let taker = next_account_info(account_info_iter)?;
        let taker_payment_account = next_account_info(account_info_iter)?;
        let taker_receive_account = next_account_info(account_info_iter)?;
        let initiator_receive_account = next_account_info(account_info_iter)?;
        let initiator = next_account_info(account_info_iter)?;
        let escrow_account = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !taker.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        check_token_program(token_program)?;

        let mut record = EscrowRecord::load_open(escrow_account, program_id)?;
        let vault_state = load_vault(vault, escrow_account.key, &record, program_id)?;

        let payment = load_token_account(taker_payment_account)?;
        if payment.mint != record.receive_mint {
            return Err(EscrowError::MintMismatch.into());
        }
        if payment.owner != *taker.key {
            return Err(EscrowError::Unauthorized.into());
        }
        if payment.amount < record.amount_wanted {
            return Err(EscrowError::InsufficientFunds.into());
        }

        let taker_receive = load_token_account(taker_receive_account)?;
        if taker_receive.mint != record.deposit_mint {
            return Err(EscrowError::MintMismatch.into());
        }

        let proceeds = load_token_account(initiator_receive_account)?;
        if proceeds.mint != record.receive_mint {
            return Err(EscrowError::MintMismatch.into());
        }
        if proceeds.owner != record.initiator || *initiator.key != record.initiator {
            return Err(EscrowError::RecipientMismatch.into());
        }

        // Leg 1: taker pays the initiator
        invoke(
            &spl_token::instruction::transfer(
                &spl_token::id(),
                taker_payment_account.key,
                initiator_receive_account.key,
                taker.key,
                &[],
                record.amount_wanted,
            )?,
            &[
                taker_payment_account.clone(),
                initiator_receive_account.clone(),
                taker.clone(),
                token_program.clone(),
            ],
        )?;

        // Leg 2: vault releases the deposit to the taker
        let released = vault_state.amount;
        release_vault(
            vault,
            taker_receive_account,
            initiator,
            token_program,
            escrow_account.key,
            record.vault_bump,
            released,
        )?;

        record.status = EscrowStatus::Settled;
        close_record(escrow_account, &record, initiator)?;

        events::emit_escrow_settled(escrow_account.key, taker.key, record.amount_wanted, released);
        Ok(())
    }

    fn process_cancel(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let initiator = next_account_info(account_info_iter)?;
        let refund_account = next_account_info(account_info_iter)?;
        let escrow_account = next_account_info(account_info_iter)?;
        let vault = next_account_info(account_info_iter)?;
        let token_program = next_account_info(account_info_iter)?;

        if !initiator.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        check_token_program(token_program)?;

        let mut record = EscrowRecord::load_open(escrow_account, program_id)?;
        if record.initiator != *initiator.key {
            return Err(EscrowError::Unauthorized.into());
        }
        let vault_state = load_vault(vault, escrow_account.key, &record, program_id)?;

        let refund = load_token_account(refund_account)?;
        if refund.mint != record.deposit_mint {
            return Err(EscrowError::MintMismatch.into());
        }
        if refund.owner != record.initiator {
            return Err(EscrowError::RecipientMismatch.into());
        }

        let refunded = vault_state.amount;
        release_vault(
            vault,
            refund_account,
            initiator,
            token_program,
            escrow_account.key,
            record.vault_bump,
            refunded,
        )?;

        record.status = EscrowStatus::Cancelled;
        close_record(escrow_account, &record, initiator)?;

        events::emit_escrow_cancelled(escrow_account.key, initiator.key, refunded);
        Ok(())
    }
}

fn check_token_program(token_program: &AccountInfo) -> ProgramResult {
    if *token_program.key != spl_token::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn load_mint(mint: &AccountInfo) -> Result<Mint, ProgramError> {
    if *mint.owner != spl_token::id() {
        return Err(EscrowError::InvalidAccountOwner.into());
    }
    Mint::unpack(&mint.data.borrow())
}

fn load_token_account(account: &AccountInfo) -> Result<TokenAccount, ProgramError> {
    if *account.owner != spl_token::id() {
        return Err(EscrowError::InvalidAccountOwner.into());
    }
    TokenAccount::unpack(&account.data.borrow())
}

/// Load the vault of an open escrow. A vault no longer held by the token
/// program has already been closed.
fn load_vault(
    vault: &AccountInfo,
    escrow: &Pubkey,
    record: &EscrowRecord,
    program_id: &Pubkey,
) -> Result<TokenAccount, ProgramError> {
    if *vault.owner != spl_token::id() {
        return Err(EscrowError::AlreadySettled.into());
    }
    let expected = vault_address_with_bump(escrow, record.vault_bump, program_id)
        .map_err(|_| EscrowError::InvalidVault)?;
    if expected != *vault.key {
        return Err(EscrowError::InvalidVault.into());
    }
    let state = TokenAccount::unpack(&vault.data.borrow())?;
    if state.mint != record.deposit_mint || state.owner != *vault.key {
        return Err(EscrowError::InvalidVault.into());
    }
    Ok(state)
}

/// Move the whole vault balance to `destination`, then close the vault and
/// send its rent to `rent_recipient`. The vault PDA signs both CPIs.
fn release_vault<'a>(
    vault: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    rent_recipient: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    escrow: &Pubkey,
    vault_bump: u8,
    amount: u64,
) -> ProgramResult {
    let vault_seeds: &[&[u8]] = &[seeds::VAULT_SEED, escrow.as_ref(), &[vault_bump]];

    invoke_signed(
        &spl_token::instruction::transfer(
            &spl_token::id(),
            vault.key,
            destination.key,
            vault.key,
            &[],
            amount,
        )?,
        &[
            vault.clone(),
            destination.clone(),
            vault.clone(),
            token_program.clone(),
        ],
        &[vault_seeds],
    )?;

    invoke_signed(
        &spl_token::instruction::close_account(
            &spl_token::id(),
            vault.key,
            rent_recipient.key,
            vault.key,
            &[],
        )?,
        &[
            vault.clone(),
            rent_recipient.clone(),
            vault.clone(),
            token_program.clone(),
        ],
        &[vault_seeds],
    )?;

    Ok(())
}

/// Persist the terminal status and move every lamport to `rent_recipient`.
///
/// The runtime drops zero-lamport accounts when the transaction commits; until
/// then the record reads as terminal to any later instruction in the same
/// transaction.
fn close_record(
    escrow_account: &AccountInfo,
    record: &EscrowRecord,
    rent_recipient: &AccountInfo,
) -> ProgramResult {
    record.save(escrow_account)?;

    let lamports = escrow_account.lamports();
    **rent_recipient.try_borrow_mut_lamports()? = rent_recipient
        .lamports()
        .checked_add(lamports)
        .ok_or(EscrowError::AmountOverflow)?;
    **escrow_account.try_borrow_mut_lamports()? = 0;
    Ok(())
}
