#![allow(dead_code)]
#![allow(deprecated)]

use borsh::BorshDeserialize;
use solana_program::program_pack::Pack;
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::system_instruction;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};

use token_escrow::{find_vault_address, instruction, EscrowError, EscrowRecord};

// ============================================================================
// TEST PROGRAM ID
// ============================================================================

/// Fixed program ID for testing. Actual deployed program ID is determined by
/// the deployment keypair, not this value.
pub fn test_program_id() -> Pubkey {
    solana_sdk::pubkey!("Escrow11111111111111111111111111111111111111")
}

// ============================================================================
// TEST HARNESS HELPERS
// ============================================================================

/// Helper: Build a ProgramTest instance with token_escrow + spl_token
pub fn program_test() -> ProgramTest {
    let program_id = test_program_id();
    let mut program_test = ProgramTest::new(
        "token_escrow",
        program_id,
        processor!(token_escrow::processor::Processor::process),
    );
    program_test.add_program(
        "spl_token",
        spl_token::id(),
        processor!(spl_token::processor::Processor::process),
    );
    program_test
}

/// Helper: Sign and submit a transaction, returning the raw result
pub async fn try_send_tx(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.banks_client.get_latest_blockhash().await.unwrap();
    let mut all_signers = Vec::with_capacity(signers.len() + 1);
    all_signers.push(payer);
    for signer in signers {
        if signer.pubkey() != payer.pubkey() {
            all_signers.push(*signer);
        }
    }

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &all_signers,
        blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

/// Helper: Send a transaction with a specific payer and signers
pub async fn send_tx(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    instructions: &[Instruction],
    signers: &[&Keypair],
) {
    try_send_tx(context, payer, instructions, signers)
        .await
        .unwrap();
}

// ============================================================================
// SPL TOKEN HELPERS
// ============================================================================

/// Helper: Create a new SPL token mint
pub async fn create_mint(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint_authority: &Keypair,
    decimals: u8,
) -> Pubkey {
    let mint = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let mint_rent = rent.minimum_balance(spl_token::state::Mint::LEN);

    let create_mint_ix = system_instruction::create_account(
        &payer.pubkey(),
        &mint.pubkey(),
        mint_rent,
        spl_token::state::Mint::LEN as u64,
        &spl_token::id(),
    );
    let init_mint_ix = spl_token::instruction::initialize_mint2(
        &spl_token::id(),
        &mint.pubkey(),
        &mint_authority.pubkey(),
        None,
        decimals,
    )
    .unwrap();

    send_tx(context, payer, &[create_mint_ix, init_mint_ix], &[&mint]).await;
    mint.pubkey()
}

/// Helper: Create an SPL token account for a given mint and owner
pub async fn create_token_account(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint: Pubkey,
    owner: Pubkey,
) -> Pubkey {
    let token_account = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let token_rent = rent.minimum_balance(spl_token::state::Account::LEN);

    let create_ix = system_instruction::create_account(
        &payer.pubkey(),
        &token_account.pubkey(),
        token_rent,
        spl_token::state::Account::LEN as u64,
        &spl_token::id(),
    );
    let init_ix = spl_token::instruction::initialize_account3(
        &spl_token::id(),
        &token_account.pubkey(),
        &mint,
        &owner,
    )
    .unwrap();

    send_tx(context, payer, &[create_ix, init_ix], &[&token_account]).await;
    token_account.pubkey()
}

/// Helper: Mint tokens to a token account
pub async fn mint_to(
    context: &mut ProgramTestContext,
    payer: &Keypair,
    mint: Pubkey,
    mint_authority: &Keypair,
    destination: Pubkey,
    amount: u64,
) {
    let ix = spl_token::instruction::mint_to(
        &spl_token::id(),
        &mint,
        &destination,
        &mint_authority.pubkey(),
        &[],
        amount,
    )
    .unwrap();

    send_tx(context, payer, &[ix], &[mint_authority]).await;
}

/// Helper: Read SPL token account balance
pub async fn get_token_balance(context: &mut ProgramTestContext, token_account: Pubkey) -> u64 {
    let account = context
        .banks_client
        .get_account(token_account)
        .await
        .unwrap()
        .unwrap();
    let token_state = spl_token::state::Account::unpack(&account.data).unwrap();
    token_state.amount
}

/// Helper: Read lamport balance, zero for accounts that do not exist
pub async fn get_lamports(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .map(|account| account.lamports)
        .unwrap_or(0)
}

/// Helper: Whether an account currently exists on the ledger
pub async fn account_exists(context: &mut ProgramTestContext, address: Pubkey) -> bool {
    context
        .banks_client
        .get_account(address)
        .await
        .unwrap()
        .is_some()
}

// ============================================================================
// PROGRAM HELPERS
// ============================================================================

/// Helper: Read escrow record from account data
pub fn read_escrow(account: &solana_sdk::account::Account) -> EscrowRecord {
    EscrowRecord::try_from_slice(&account.data).unwrap()
}

/// Helper: Fetch and decode an escrow record
pub async fn fetch_escrow(context: &mut ProgramTestContext, escrow: Pubkey) -> EscrowRecord {
    let account = context
        .banks_client
        .get_account(escrow)
        .await
        .unwrap()
        .unwrap();
    read_escrow(&account)
}

/// Helper: Build an Initialize instruction with the canonical vault bump
pub fn create_initialize_ix(
    env: &TestEnv,
    escrow: Pubkey,
    amount_deposit: u64,
    amount_wanted: u64,
) -> Instruction {
    let (vault, vault_bump) = find_vault_address(&escrow, &env.program_id);
    instruction::initialize(
        &env.program_id,
        &env.initiator.pubkey(),
        &env.initiator_deposit_token,
        &env.mint_a,
        &env.mint_b,
        &escrow,
        &vault,
        vault_bump,
        amount_deposit,
        amount_wanted,
    )
    .unwrap()
}

/// Helper: Build an Accept instruction for the default taker accounts
pub fn create_accept_ix(env: &TestEnv, escrow: Pubkey) -> Instruction {
    instruction::accept(
        &env.program_id,
        &env.taker.pubkey(),
        &env.taker_deposit_token,
        &env.taker_receive_token,
        &env.initiator_receive_token,
        &env.initiator.pubkey(),
        &escrow,
    )
    .unwrap()
}

/// Helper: Build a Cancel instruction refunding to the initiator's deposit account
pub fn create_cancel_ix(env: &TestEnv, escrow: Pubkey) -> Instruction {
    instruction::cancel(
        &env.program_id,
        &env.initiator.pubkey(),
        &env.initiator_deposit_token,
        &escrow,
    )
    .unwrap()
}

/// Helper: Open an escrow and return the record keypair
pub async fn open_escrow(
    context: &mut ProgramTestContext,
    env: &TestEnv,
    amount_deposit: u64,
    amount_wanted: u64,
) -> Keypair {
    let escrow = Keypair::new();
    let ix = create_initialize_ix(env, escrow.pubkey(), amount_deposit, amount_wanted);
    send_tx(context, &env.initiator, &[ix], &[&escrow]).await;
    escrow
}

// ============================================================================
// TEST ENVIRONMENT
// ============================================================================

pub const INITIATOR_MINT_A: u64 = 1_000;
pub const TAKER_MINT_B: u64 = 1_000;

/// Test environment with two mints and funded token accounts on both sides
pub struct TestEnv {
    pub program_id: Pubkey,
    pub initiator: Keypair,
    pub taker: Keypair,
    pub mint_authority: Keypair,
    /// Mint the initiator deposits
    pub mint_a: Pubkey,
    /// Mint the initiator wants
    pub mint_b: Pubkey,
    pub initiator_deposit_token: Pubkey,
    pub initiator_receive_token: Pubkey,
    pub taker_deposit_token: Pubkey,
    pub taker_receive_token: Pubkey,
}

/// Helper: Create a baseline environment used by most tests
pub async fn setup_basic_env(context: &mut ProgramTestContext) -> TestEnv {
    let payer = context.payer.insecure_clone();
    let payer_pubkey = payer.pubkey();
    let initiator = Keypair::new();
    let taker = Keypair::new();
    let mint_authority = Keypair::new();

    // Fund initiator and taker
    let fund_ix =
        system_instruction::transfer(&payer_pubkey, &initiator.pubkey(), 2_000_000_000);
    let fund_ix2 = system_instruction::transfer(&payer_pubkey, &taker.pubkey(), 2_000_000_000);
    send_tx(context, &payer, &[fund_ix, fund_ix2], &[]).await;

    let mint_a = create_mint(context, &payer, &mint_authority, 0).await;
    let mint_b = create_mint(context, &payer, &mint_authority, 0).await;

    let initiator_deposit_token =
        create_token_account(context, &payer, mint_a, initiator.pubkey()).await;
    let initiator_receive_token =
        create_token_account(context, &payer, mint_b, initiator.pubkey()).await;
    let taker_deposit_token = create_token_account(context, &payer, mint_b, taker.pubkey()).await;
    let taker_receive_token = create_token_account(context, &payer, mint_a, taker.pubkey()).await;

    mint_to(
        context,
        &payer,
        mint_a,
        &mint_authority,
        initiator_deposit_token,
        INITIATOR_MINT_A,
    )
    .await;
    mint_to(
        context,
        &payer,
        mint_b,
        &mint_authority,
        taker_deposit_token,
        TAKER_MINT_B,
    )
    .await;

    TestEnv {
        program_id: test_program_id(),
        initiator,
        taker,
        mint_authority,
        mint_a,
        mint_b,
        initiator_deposit_token,
        initiator_receive_token,
        taker_deposit_token,
        taker_receive_token,
    }
}

// ============================================================================
// ERROR CHECKING HELPERS
// ============================================================================

/// Helper: Assert a transaction failed with a specific escrow error code
pub fn assert_escrow_error(result: Result<(), BanksClientError>, expected: EscrowError) {
    let error = result.expect_err("Should have thrown an error");
    match error.unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            assert_eq!(code, expected as u32, "Expected {expected:?}, got code {code}");
        }
        other => panic!("Expected {expected:?}, got {other:?}"),
    }
}
