//! Carenode CLI - demo-chain interface
//!
//! Chain commands run against the in-memory demo provider (a funded
//! wallet plus empty contract ledgers), so chain state lives for one
//! invocation; use `repl` to keep it across commands:
//!   carenode seed                       → register the sample doctors
//!   carenode doctors                    → list registered doctors
//!   carenode book 2 1700000000 0.025    → book and await confirmation
//!
//! Explorer commands hit the real REST API and need an API key:
//!   carenode balance 0xAb58...aeC9B
//!   carenode gas
//!
//! Local demo records are a separate store, never chain data:
//!   carenode local list
//!
//! Configuration:
//!   carenode init --app <name> --chain <id> --api-key <key>
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use carenode::logging::init_logging;
use carenode::{MemoryProvider, Node, NodeConfig, StoredAppointment};
use serde_json::{json, Value};
use std::env;
use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("carenode 0.1.0");
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let result = match command.as_str() {
        "init" => cmd_init(&opts),
        "repl" => match build_node(&opts).await {
            Ok(node) => cmd_repl(&node).await,
            Err(e) => Err(e),
        },
        _ => match build_node(&opts).await {
            Ok(node) => {
                if needs_session(&command) {
                    match node.connect().await {
                        Ok(_) => run_command(&node, &command, &opts.args).await,
                        Err(e) => Err(e.to_string()),
                    }
                } else {
                    run_command(&node, &command, &opts.args).await
                }
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(output) => {
            let formatted = if opts.pretty || (!opts.json && std::io::stdout().is_terminal()) {
                serde_json::to_string_pretty(&output).unwrap_or_default()
            } else {
                serde_json::to_string(&output).unwrap_or_default()
            };
            println!("{}", formatted);
        }
        Err(e) => {
            let err = json!({"error": e});
            if opts.pretty || (!opts.json && std::io::stdout().is_terminal()) {
                eprintln!("{}", serde_json::to_string_pretty(&err).unwrap_or_default());
            } else {
                eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
            }
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    app: Option<String>,
    chain_id: Option<u64>,
    appointments_address: Option<String>,
    staking_address: Option<String>,
    api_key: Option<String>,
    data_dir: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--app" | "-a" => {
                    if i + 1 < args.len() {
                        opts.app = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--chain" | "-c" => {
                    if i + 1 < args.len() {
                        opts.chain_id = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--appointments" => {
                    if i + 1 < args.len() {
                        opts.appointments_address = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--staking" => {
                    if i + 1 < args.len() {
                        opts.staking_address = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--api-key" | "-k" => {
                    if i + 1 < args.len() {
                        opts.api_key = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--data-dir" | "-d" => {
                    if i + 1 < args.len() {
                        opts.data_dir = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.args = positional;

        // Apply environment variables (lower priority than CLI args)
        if opts.app.is_none() {
            opts.app = env::var("CARENODE_APP").ok().filter(|s| !s.is_empty());
        }
        if opts.chain_id.is_none() {
            opts.chain_id = env::var("CARENODE_CHAIN_ID").ok().and_then(|s| s.parse().ok());
        }
        if opts.appointments_address.is_none() {
            opts.appointments_address =
                env::var("CARENODE_APPOINTMENTS").ok().filter(|s| !s.is_empty());
        }
        if opts.staking_address.is_none() {
            opts.staking_address = env::var("CARENODE_STAKING").ok().filter(|s| !s.is_empty());
        }
        if opts.api_key.is_none() {
            opts.api_key = env::var("ETHERSCAN_API_KEY")
                .ok()
                .or_else(|| env::var("CARENODE_ETHERSCAN_KEY").ok())
                .filter(|s| !s.is_empty());
        }
        if opts.data_dir.is_none() {
            opts.data_dir = env::var("CARENODE_DATA_DIR").ok().filter(|s| !s.is_empty());
        }

        opts
    }
}

fn print_usage() {
    println!(
        r#"carenode - wallet-session and contract client node

USAGE:
    carenode <command> [args] [options]

SESSION:
    status                      Connect and show the session snapshot

DOCTORS & APPOINTMENTS (demo chain):
    seed                        Register the sample doctors
    doctors                     List active doctors (IDs 1..10)
    appointments                List my appointments (IDs 1..100)
    book <doctorId> <ts> <eth>  Book an appointment, fee attached
    cancel <id>                 Cancel an appointment
    add-doctor <name> <spec> <eth>
    add-slot <doctorId> <ts>
    slots <doctorId> <ts,ts,..> Show still-bookable timestamps

STAKING & TRANSFER (demo chain):
    stake <eth>                 Stake the given amount
    withdraw                    Withdraw stake plus rewards
    stake-info [address]        Staking position (default: my account)
    send <to> <eth>             Native transfer

EXPLORER (real REST API, needs --api-key):
    balance <address>           Native balance in ETH
    gas                         Current gas price in gwei
    tx <hash>                   Transaction details
    receipt <hash>              Transaction receipt
    abi <address>               Verified contract ABI

LOCAL DEMO RECORDS (file store, never chain data):
    local list
    local add <json>
    local remove <id>

OTHER:
    init                        Save configuration for this directory
    repl                        Interactive mode (chain state persists)

OPTIONS:
    --app, -a <name>            Application name (env: CARENODE_APP)
    --chain, -c <id>            Chain id (env: CARENODE_CHAIN_ID)
    --appointments <address>    Appointments contract (env: CARENODE_APPOINTMENTS)
    --staking <address>         Staking contract (env: CARENODE_STAKING)
    --api-key, -k <key>         Explorer API key (env: ETHERSCAN_API_KEY)
    --data-dir, -d <path>       Data directory (env: CARENODE_DATA_DIR)
    --json / --pretty           Output format
    --version, -V               Print version

EXAMPLES:
    carenode init --app careapp --chain 11155111 --api-key KEY
    carenode repl
    carenode balance 0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B
    carenode local list --json | jq length
"#
    );
}

fn config_path(app: &str) -> String {
    format!(".carenode-{}.json", app)
}

fn save_config(app: &str, config: &NodeConfig) -> Result<(), String> {
    let data = json!({
        "app": config.app,
        "chain_id": config.chain_id,
        "appointments_address": config.appointments_address,
        "staking_address": config.staking_address,
        "etherscan_api_key": config.etherscan_api_key,
        "data_dir": config.data_dir,
    });
    std::fs::write(
        config_path(app),
        serde_json::to_string_pretty(&data).unwrap_or_default(),
    )
    .map_err(|e| format!("Failed to save config: {}", e))
}

fn load_config() -> Option<Value> {
    let entries = std::fs::read_dir(".").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(".carenode-") && name.ends_with(".json") {
            let data = std::fs::read_to_string(entry.path()).ok()?;
            return serde_json::from_str(&data).ok();
        }
    }
    None
}

fn resolve_config(opts: &ParsedArgs) -> NodeConfig {
    let saved = load_config();
    let saved_str = |key: &str| -> Option<String> {
        saved
            .as_ref()
            .and_then(|cfg| cfg.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    let app = opts
        .app
        .clone()
        .or_else(|| saved_str("app"))
        .unwrap_or_else(|| "careapp".into());
    let mut config = NodeConfig::new(app);

    if let Some(chain_id) = opts
        .chain_id
        .or_else(|| saved.as_ref().and_then(|cfg| cfg.get("chain_id")).and_then(|v| v.as_u64()))
    {
        config = config.with_chain_id(chain_id);
    }
    if let Some(address) = opts
        .appointments_address
        .clone()
        .or_else(|| saved_str("appointments_address"))
    {
        config = config.with_appointments_address(address);
    }
    if let Some(address) = opts
        .staking_address
        .clone()
        .or_else(|| saved_str("staking_address"))
    {
        config = config.with_staking_address(address);
    }
    if let Some(key) = opts.api_key.clone().or_else(|| saved_str("etherscan_api_key")) {
        config = config.with_etherscan_api_key(key);
    }
    if let Some(dir) = opts.data_dir.clone().or_else(|| saved_str("data_dir")) {
        config = config.with_data_dir(dir);
    }
    config
}

fn cmd_init(opts: &ParsedArgs) -> Result<Value, String> {
    let config = resolve_config(opts);
    save_config(&config.app, &config)?;
    Ok(json!({
        "saved": config_path(&config.app),
        "app": config.app,
        "chain_id": config.chain_id,
    }))
}

async fn build_node(opts: &ParsedArgs) -> Result<Node, String> {
    let config = resolve_config(opts);
    let appointments = carenode::Address::parse(&config.appointments_address)
        .map_err(|e| e.to_string())?;
    let staking = carenode::Address::parse(&config.staking_address).map_err(|e| e.to_string())?;

    let provider = Arc::new(MemoryProvider::demo(appointments, staking, config.chain_id).await);
    Node::from_config(config, provider).map_err(|e| e.to_string())
}

fn needs_session(command: &str) -> bool {
    !matches!(
        command,
        "init" | "local" | "balance" | "gas" | "tx" | "receipt" | "abi" | "connect" | "disconnect"
    )
}

async fn run_command(node: &Node, command: &str, args: &[String]) -> Result<Value, String> {
    match command {
        "status" => {
            let session = node.session().snapshot().await;
            Ok(json!({
                "connected": session.connected,
                "account": session.account.as_ref().map(|a| a.to_string()),
                "accountShort": session.account.as_ref().map(|a| a.short()),
                "chainId": session.chain_id,
            }))
        }
        "connect" => {
            let session = node.connect().await.map_err(|e| e.to_string())?;
            Ok(json!({
                "connected": session.connected,
                "account": session.account.map(|a| a.to_string()),
                "chainId": session.chain_id,
            }))
        }
        "disconnect" => {
            node.disconnect().await;
            Ok(json!({"connected": false}))
        }
        "seed" => cmd_seed(node).await,
        "doctors" => {
            let doctors = node.appointments().list_doctors().await.map_err(|e| e.to_string())?;
            Ok(json!(doctors))
        }
        "appointments" => {
            let list = node
                .appointments()
                .list_appointments()
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!(list))
        }
        "book" => {
            let doctor_id = arg_u64(args, 0, "doctorId")?;
            let timestamp = arg_u64(args, 1, "timestamp")?;
            let fee = args.get(2).ok_or("book <doctorId> <timestamp> <feeEth>")?;
            let receipt = node
                .appointments()
                .book_appointment(doctor_id, timestamp, fee)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "txHash": receipt.tx_hash,
                "blockNumber": receipt.block_number,
                "appointments": node.appointments().cached_appointments().await,
            }))
        }
        "cancel" => {
            let id = arg_u64(args, 0, "id")?;
            let receipt = node
                .appointments()
                .cancel_appointment(id)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash, "cancelled": id}))
        }
        "add-doctor" => {
            let name = args.first().ok_or("add-doctor <name> <specialization> <feeEth>")?;
            let specialization = args.get(1).ok_or("add-doctor <name> <specialization> <feeEth>")?;
            let fee = args.get(2).ok_or("add-doctor <name> <specialization> <feeEth>")?;
            let receipt = node
                .appointments()
                .add_doctor(name, specialization, fee)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash, "added": name}))
        }
        "add-slot" => {
            let doctor_id = arg_u64(args, 0, "doctorId")?;
            let timestamp = arg_u64(args, 1, "timestamp")?;
            let receipt = node
                .appointments()
                .add_time_slot(doctor_id, timestamp)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash}))
        }
        "slots" => {
            let doctor_id = arg_u64(args, 0, "doctorId")?;
            let timestamps: Vec<u64> = args
                .get(1)
                .ok_or("slots <doctorId> <ts,ts,..>")?
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            let open = node
                .appointments()
                .available_time_slots(doctor_id, &timestamps)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"doctorId": doctor_id, "available": open}))
        }
        "stake" => {
            let amount = args.first().ok_or("stake <amountEth>")?;
            let receipt = node.staking().stake(amount).await.map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash, "staked": amount}))
        }
        "withdraw" => {
            let receipt = node.staking().withdraw().await.map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash}))
        }
        "stake-info" => {
            let account = match args.first() {
                Some(raw) => carenode::Address::parse(raw).map_err(|e| e.to_string())?,
                None => node.session().account().await.map_err(|e| e.to_string())?,
            };
            let info = node.staking().stake_info(&account).await.map_err(|e| e.to_string())?;
            Ok(json!({
                "account": account.to_string(),
                "amountEth": carenode::format_eth(info.amount_wei),
                "rewardsEth": carenode::format_eth(info.rewards_wei),
                "active": info.active,
                "timestamp": info.timestamp,
            }))
        }
        "send" => {
            let to = args.first().ok_or("send <to> <amountEth>")?;
            let amount = args.get(1).ok_or("send <to> <amountEth>")?;
            let receipt = node.transfer(to, amount).await.map_err(|e| e.to_string())?;
            Ok(json!({"txHash": receipt.tx_hash, "to": to, "amountEth": amount}))
        }
        "balance" => {
            let address = args.first().ok_or("balance <address>")?;
            let wei = node
                .explorer()
                .address_balance(address, None)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "address": address,
                "balanceEth": carenode::format_eth_fixed(wei, 4),
            }))
        }
        "gas" => {
            let wei = node.explorer().gas_price(None).await.map_err(|e| e.to_string())?;
            Ok(json!({"gasPriceGwei": format!("{:.2}", carenode::core::wei_to_gwei(wei))}))
        }
        "tx" => {
            let hash = args.first().ok_or("tx <hash>")?;
            node.explorer().transaction(hash, None).await.map_err(|e| e.to_string())
        }
        "receipt" => {
            let hash = args.first().ok_or("receipt <hash>")?;
            node.explorer()
                .transaction_receipt(hash, None)
                .await
                .map_err(|e| e.to_string())
        }
        "abi" => {
            let address = args.first().ok_or("abi <address>")?;
            node.explorer().contract_abi(address, None).await.map_err(|e| e.to_string())
        }
        "local" => cmd_local(node, args),
        cmd => Err(format!("Unknown command: {}", cmd)),
    }
}

/// The sample roster the demo seeds, matching the deployment script.
const SAMPLE_DOCTORS: &[(&str, &str, &str)] = &[
    ("Dr. Sarah Johnson", "Cardiologist", "0.02"),
    ("Dr. Michael Chen", "Neurologist", "0.025"),
    ("Dr. Emily Rodriguez", "Pediatrician", "0.015"),
    ("Dr. David Williams", "Dermatologist", "0.018"),
];

async fn cmd_seed(node: &Node) -> Result<Value, String> {
    let mut added = Vec::new();
    for (name, specialization, fee) in SAMPLE_DOCTORS {
        match node.appointments().add_doctor(name, specialization, fee).await {
            Ok(_) => {
                info!(name, "added doctor");
                added.push(*name);
            }
            Err(e) => warn!(name, error = %e, "failed to add doctor"),
        }
    }
    Ok(json!({"added": added}))
}

fn cmd_local(node: &Node, args: &[String]) -> Result<Value, String> {
    match args.first().map(String::as_str) {
        Some("list") | None => {
            let records = node.local_store().load().map_err(|e| e.to_string())?;
            Ok(json!(records))
        }
        Some("add") => {
            let raw = args.get(1).ok_or("local add <json>")?;
            let record: StoredAppointment =
                serde_json::from_str(raw).map_err(|e| format!("Invalid record: {}", e))?;
            node.local_store().add(record.clone()).map_err(|e| e.to_string())?;
            Ok(json!({"added": record.id}))
        }
        Some("remove") => {
            let id = args.get(1).ok_or("local remove <id>")?;
            let removed = node.local_store().remove(id).map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed}))
        }
        Some(sub) => Err(format!("Unknown local subcommand: {}", sub)),
    }
}

async fn cmd_repl(node: &Node) -> Result<Value, String> {
    if let Err(e) = node.connect().await {
        warn!(error = %e, "demo wallet connect failed");
    }
    println!("carenode repl - 'help' for commands, 'exit' to quit");

    let stdin = std::io::stdin();
    let mut commands_run = 0u64;
    loop {
        print!("carenode> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("stdin: {}", e)),
        }
        let parts: Vec<String> = line.split_whitespace().map(String::from).collect();
        let Some(command) = parts.first() else {
            continue;
        };
        match command.as_str() {
            "exit" | "quit" => break,
            "help" => {
                print_usage();
                continue;
            }
            _ => {}
        }

        commands_run += 1;
        match run_command(node, command, &parts[1..]).await {
            Ok(output) => {
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default())
            }
            Err(e) => eprintln!("{}", json!({"error": e})),
        }
    }

    Ok(json!({"commands": commands_run}))
}

fn arg_u64(args: &[String], index: usize, name: &str) -> Result<u64, String> {
    args.get(index)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("Invalid {}", name))
}
