use borsh::BorshDeserialize;
use solana_client::rpc_client::RpcClient;
use solana_program::program_pack::Pack;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use spl_token::state::Account as TokenAccount;
use std::{collections::HashMap, env, error::Error, str::FromStr};
use token_escrow::{find_vault_address, instruction, EscrowRecord};
use token_escrow_cli::{parse_options, parse_u64, parse_u8, required_option};

// ============================================================================
// CLI ENTRYPOINT
// ============================================================================

fn main() {
    if let Err(error) = run() {
        eprintln!("[token_escrow_cli] Error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    let command = args[0].as_str();
    let options = parse_options(&args[1..])?;

    let rpc_url = options
        .get("rpc")
        .cloned()
        .unwrap_or_else(|| "http://localhost:8899".to_string());
    let client = RpcClient::new(rpc_url);

    // Commands that don't require program-id
    if command == "get-token-balance" {
        return handle_get_token_balance(&client, &options);
    }

    let program_id = match options.get("program-id") {
        Some(value) => parse_pubkey(value)?,
        None => {
            eprintln!("Error: --program-id is required for '{}'", command);
            print_usage();
            std::process::exit(1);
        }
    };

    match command {
        "initialize" | "make" => handle_initialize(&client, &options, program_id),
        "accept" => handle_accept(&client, &options, program_id),
        "cancel" => handle_cancel(&client, &options, program_id),
        "get-escrow" => handle_get_escrow(&client, &options, program_id),
        "find-vault" => handle_find_vault(&options, program_id),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_initialize(
    client: &RpcClient,
    options: &HashMap<String, String>,
    program_id: Pubkey,
) -> Result<(), Box<dyn Error>> {
    let payer = read_keypair(options, "payer")?;
    let initiator = read_keypair(options, "initiator")?;
    let initiator_token = parse_pubkey(required_option(options, "initiator-token")?)?;
    let deposit_mint = parse_pubkey(required_option(options, "deposit-mint")?)?;
    let receive_mint = parse_pubkey(required_option(options, "receive-mint")?)?;
    let amount_deposit = parse_u64(required_option(options, "amount-deposit")?)?;
    let amount_wanted = parse_u64(required_option(options, "amount-wanted")?)?;

    // Fresh record keypair unless the caller wants a known address
    let escrow = match options.get("escrow") {
        Some(path) => read_keypair_file(path)?,
        None => Keypair::new(),
    };

    let (vault, canonical_bump) = find_vault_address(&escrow.pubkey(), &program_id);
    let vault_bump = match options.get("vault-bump") {
        Some(value) => parse_u8(value)?,
        None => canonical_bump,
    };

    let ix = instruction::initialize(
        &program_id,
        &initiator.pubkey(),
        &initiator_token,
        &deposit_mint,
        &receive_mint,
        &escrow.pubkey(),
        &vault,
        vault_bump,
        amount_deposit,
        amount_wanted,
    )?;

    let signature = send_tx(client, &[ix], &payer, &[&initiator, &escrow])?;
    println!("Initialize signature: {signature}");
    println!("Escrow: {}", escrow.pubkey());
    println!("Vault: {vault}");
    Ok(())
}

fn handle_accept(
    client: &RpcClient,
    options: &HashMap<String, String>,
    program_id: Pubkey,
) -> Result<(), Box<dyn Error>> {
    let payer = read_keypair(options, "payer")?;
    let taker = read_keypair(options, "taker")?;
    let escrow = parse_pubkey(required_option(options, "escrow")?)?;
    let taker_payment_token = parse_pubkey(required_option(options, "taker-payment-token")?)?;
    let taker_receive_token = parse_pubkey(required_option(options, "taker-receive-token")?)?;
    let initiator_receive_token =
        parse_pubkey(required_option(options, "initiator-receive-token")?)?;

    // The initiator is read from the record so the rent goes to the right wallet
    let record = fetch_record(client, &escrow)?;

    let ix = instruction::accept(
        &program_id,
        &taker.pubkey(),
        &taker_payment_token,
        &taker_receive_token,
        &initiator_receive_token,
        &record.initiator,
        &escrow,
    )?;

    let signature = send_tx(client, &[ix], &payer, &[&taker])?;
    println!("Accept signature: {signature}");
    println!("Paid: {} of {}", record.amount_wanted, record.receive_mint);
    println!("Received: {} of {}", record.amount_deposit, record.deposit_mint);
    Ok(())
}

fn handle_cancel(
    client: &RpcClient,
    options: &HashMap<String, String>,
    program_id: Pubkey,
) -> Result<(), Box<dyn Error>> {
    let payer = read_keypair(options, "payer")?;
    let initiator = read_keypair(options, "initiator")?;
    let escrow = parse_pubkey(required_option(options, "escrow")?)?;
    let refund_token = parse_pubkey(required_option(options, "initiator-refund-token")?)?;

    let ix = instruction::cancel(&program_id, &initiator.pubkey(), &refund_token, &escrow)?;

    let signature = send_tx(client, &[ix], &payer, &[&initiator])?;
    println!("Cancel signature: {signature}");
    Ok(())
}

fn handle_get_escrow(
    client: &RpcClient,
    options: &HashMap<String, String>,
    program_id: Pubkey,
) -> Result<(), Box<dyn Error>> {
    let escrow = parse_pubkey(required_option(options, "escrow")?)?;
    let record = fetch_record(client, &escrow)?;
    let (vault, _) = find_vault_address(&escrow, &program_id);

    println!("Escrow: {escrow}");
    println!("Vault: {vault}");
    println!("Initiator: {}", record.initiator);
    println!("Deposit mint: {}", record.deposit_mint);
    println!("Amount deposit: {}", record.amount_deposit);
    println!("Receive mint: {}", record.receive_mint);
    println!("Amount wanted: {}", record.amount_wanted);
    println!("Vault bump: {}", record.vault_bump);
    println!("Status: {:?}", record.status);
    Ok(())
}

fn handle_find_vault(
    options: &HashMap<String, String>,
    program_id: Pubkey,
) -> Result<(), Box<dyn Error>> {
    let escrow = parse_pubkey(required_option(options, "escrow")?)?;
    let (vault, bump) = find_vault_address(&escrow, &program_id);
    println!("Vault: {vault}");
    println!("Bump: {bump}");
    Ok(())
}

fn handle_get_token_balance(
    client: &RpcClient,
    options: &HashMap<String, String>,
) -> Result<(), Box<dyn Error>> {
    let token_account = parse_pubkey(required_option(options, "token-account")?)?;
    let account = client.get_account(&token_account)?;
    let token_state = TokenAccount::unpack(&account.data)?;
    println!("Token account: {token_account}");
    println!("Mint: {}", token_state.mint);
    println!("Balance: {}", token_state.amount);
    Ok(())
}

// ============================================================================
// TRANSACTION HELPERS
// ============================================================================

fn send_tx(
    client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
) -> Result<solana_sdk::signature::Signature, Box<dyn Error>> {
    let blockhash = client.get_latest_blockhash()?;
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
    let signature = client.send_and_confirm_transaction(&tx)?;
    Ok(signature)
}

/// Closed records are purged by the runtime, so a missing account is reported as settled.
fn fetch_record(client: &RpcClient, escrow: &Pubkey) -> Result<EscrowRecord, Box<dyn Error>> {
    let account = client
        .get_account_with_commitment(escrow, client.commitment())?
        .value
        .ok_or_else(|| format!("Escrow {escrow} not found (settled, cancelled or never created)"))?;
    Ok(EscrowRecord::try_from_slice(&account.data)?)
}

// ============================================================================
// LOCAL HELPERS
// ============================================================================

fn read_keypair(
    options: &HashMap<String, String>,
    key: &str,
) -> Result<Keypair, Box<dyn Error>> {
    let path = required_option(options, key)?;
    Ok(read_keypair_file(path)?)
}

fn parse_pubkey(value: &str) -> Result<Pubkey, Box<dyn Error>> {
    Ok(Pubkey::from_str(value)?)
}

// ============================================================================
// USAGE
// ============================================================================

fn print_usage() {
    eprintln!(
        r#"Token Escrow CLI

Usage:
  token_escrow_cli <command> [--option value]...

Escrow Commands:
  initialize | make  --program-id <pubkey> --payer <keypair> --initiator <keypair>
                     --initiator-token <pubkey> --deposit-mint <pubkey> --receive-mint <pubkey>
                     --amount-deposit <u64> --amount-wanted <u64>
                     [--escrow <keypair>] [--vault-bump <u8>] [--rpc <url>]
  accept             --program-id <pubkey> --payer <keypair> --taker <keypair> --escrow <pubkey>
                     --taker-payment-token <pubkey> --taker-receive-token <pubkey>
                     --initiator-receive-token <pubkey> [--rpc <url>]
  cancel             --program-id <pubkey> --payer <keypair> --initiator <keypair> --escrow <pubkey>
                     --initiator-refund-token <pubkey> [--rpc <url>]

Query Commands:
  get-escrow         --program-id <pubkey> --escrow <pubkey> [--rpc <url>]
  find-vault         --program-id <pubkey> --escrow <pubkey>
  get-token-balance  --token-account <pubkey> [--rpc <url>]
        "#
    );
}
