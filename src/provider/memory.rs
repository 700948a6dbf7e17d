//! In-memory wallet provider - demo chain for the CLI and tests
//!
//! Holds the whole simulated chain behind locks: wallet accounts, native
//! balances, the appointments contract ledger, and the staking contract
//! ledger. Transactions confirm instantly unless a receipt delay is set.
//!
//! Contract reads mirror Solidity public-mapping semantics: a missing ID
//! returns a zeroed record rather than an error. Injected failures
//! (`fail_reads_for`, `fail_next_send`, `reject_next_request`) let tests
//! drive the error paths a real wallet would produce.

use super::{ProviderError, ProviderEvent, TxReceipt, WalletProvider};
use crate::core::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone)]
struct DoctorRow {
    id: u64,
    name: String,
    specialization: String,
    fee_wei: u128,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct AppointmentRow {
    id: u64,
    doctor_id: u64,
    patient: String,
    timestamp: u64,
    fee_wei: u128,
    is_paid: bool,
    is_cancelled: bool,
}

#[derive(Debug, Clone, Default)]
struct StakeRow {
    amount_wei: u128,
    timestamp: u64,
    rewards_wei: u128,
    active: bool,
}

#[derive(Default)]
struct ChainState {
    doctors: HashMap<u64, DoctorRow>,
    next_doctor_id: u64,
    appointments: HashMap<u64, AppointmentRow>,
    next_appointment_id: u64,
    /// doctor id -> timestamp -> booked
    slots: HashMap<u64, HashMap<u64, bool>>,
    /// lowercase address -> stake
    stakes: HashMap<String, StakeRow>,
    /// lowercase address -> wei
    balances: HashMap<String, u128>,
}

pub struct MemoryProvider {
    appointments_address: Address,
    staking_address: Address,
    accounts: RwLock<Vec<Address>>,
    chain_id: RwLock<u64>,
    chain: RwLock<ChainState>,
    receipts: RwLock<HashMap<String, TxReceipt>>,
    events: broadcast::Sender<ProviderEvent>,
    next_tx: AtomicU64,
    next_block: AtomicU64,
    send_count: AtomicU64,
    call_count: AtomicU64,
    unavailable: Mutex<bool>,
    fail_next_request: Mutex<Option<ProviderError>>,
    fail_next_send: Mutex<Option<String>>,
    failing_reads: Mutex<HashSet<(String, u64)>>,
    receipt_delay: Mutex<Option<Duration>>,
}

impl MemoryProvider {
    pub fn new(appointments_address: Address, staking_address: Address, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            appointments_address,
            staking_address,
            accounts: RwLock::new(Vec::new()),
            chain_id: RwLock::new(chain_id),
            chain: RwLock::new(ChainState {
                next_doctor_id: 1,
                next_appointment_id: 1,
                ..Default::default()
            }),
            receipts: RwLock::new(HashMap::new()),
            events,
            next_tx: AtomicU64::new(1),
            next_block: AtomicU64::new(1),
            send_count: AtomicU64::new(0),
            call_count: AtomicU64::new(0),
            unavailable: Mutex::new(false),
            fail_next_request: Mutex::new(None),
            fail_next_send: Mutex::new(None),
            failing_reads: Mutex::new(HashSet::new()),
            receipt_delay: Mutex::new(None),
        }
    }

    /// Demo chain: two funded wallet accounts, ready to connect.
    pub async fn demo(
        appointments_address: Address,
        staking_address: Address,
        chain_id: u64,
    ) -> Self {
        let provider = Self::new(appointments_address, staking_address, chain_id);
        let accounts = vec![
            Address::parse("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").expect("demo address"),
            Address::parse("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").expect("demo address"),
        ];
        for account in &accounts {
            provider.credit(account, 10 * crate::core::WEI_PER_ETH).await;
        }
        *provider.accounts.write().await = accounts;
        provider
    }

    // ------------------------------------------------------------------
    // Wallet-side controls (what a user or the wallet UI would do)
    // ------------------------------------------------------------------

    pub async fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write().await = accounts;
    }

    /// Change the account list and notify subscribers, as the wallet does
    /// when the user switches or disconnects accounts.
    pub async fn push_accounts_changed(&self, accounts: Vec<Address>) {
        *self.accounts.write().await = accounts.clone();
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    /// Switch chains and notify subscribers.
    pub async fn push_chain_changed(&self, chain_id: u64) {
        *self.chain_id.write().await = chain_id;
        let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
    }

    pub async fn credit(&self, account: &Address, wei: u128) {
        let mut chain = self.chain.write().await;
        *chain.balances.entry(lower(account)).or_insert(0) += wei;
    }

    pub async fn balance_of(&self, account: &Address) -> u128 {
        self.chain
            .read()
            .await
            .balances
            .get(&lower(account))
            .copied()
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Ledger seeding (tests write contract state directly)
    // ------------------------------------------------------------------

    pub async fn insert_doctor(
        &self,
        id: u64,
        name: &str,
        specialization: &str,
        fee_wei: u128,
        is_active: bool,
    ) {
        let mut chain = self.chain.write().await;
        chain.next_doctor_id = chain.next_doctor_id.max(id + 1);
        chain.doctors.insert(
            id,
            DoctorRow {
                id,
                name: name.to_string(),
                specialization: specialization.to_string(),
                fee_wei,
                is_active,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_appointment(
        &self,
        id: u64,
        doctor_id: u64,
        patient: &str,
        timestamp: u64,
        fee_wei: u128,
        is_paid: bool,
        is_cancelled: bool,
    ) {
        let mut chain = self.chain.write().await;
        chain.next_appointment_id = chain.next_appointment_id.max(id + 1);
        chain.appointments.insert(
            id,
            AppointmentRow {
                id,
                doctor_id,
                patient: patient.to_string(),
                timestamp,
                fee_wei,
                is_paid,
                is_cancelled,
            },
        );
    }

    // ------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------

    /// Every `request_accounts` fails as if no wallet were installed.
    pub fn make_unavailable(&self) {
        *self.unavailable.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }

    /// The next `request_accounts` fails as a user rejection.
    pub fn reject_next_request(&self) {
        *self.fail_next_request.lock().unwrap_or_else(|p| p.into_inner()) = Some(ProviderError::Rejected);
    }

    /// Reads of `method(id)` revert until cleared.
    pub fn fail_reads_for(&self, method: &str, id: u64) {
        self.failing_reads
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((method.to_string(), id));
    }

    pub fn fail_next_send(&self, message: &str) {
        *self.fail_next_send.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.to_string());
    }

    /// Delay receipts so tests can observe an in-flight write.
    pub fn set_receipt_delay(&self, delay: Duration) {
        *self.receipt_delay.lock().unwrap_or_else(|p| p.into_inner()) = Some(delay);
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn active_account(&self) -> Result<Address, ProviderError> {
        self.accounts
            .read()
            .await
            .first()
            .cloned()
            .ok_or_else(|| ProviderError::Call("no active account".into()))
    }

    async fn mint_receipt(&self) -> String {
        let tx_hash = format!("0x{:064x}", self.next_tx.fetch_add(1, Ordering::SeqCst));
        let receipt = TxReceipt {
            tx_hash: tx_hash.clone(),
            status: true,
            block_number: self.next_block.fetch_add(1, Ordering::SeqCst),
        };
        self.receipts.write().await.insert(tx_hash.clone(), receipt);
        tx_hash
    }

    async fn debit(&self, account: &Address, wei: u128) -> Result<(), ProviderError> {
        let mut chain = self.chain.write().await;
        let balance = chain.balances.entry(lower(account)).or_insert(0);
        if *balance < wei {
            return Err(ProviderError::Call("insufficient funds".into()));
        }
        *balance -= wei;
        Ok(())
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }

    fn doctor_json(row: Option<&DoctorRow>) -> Value {
        match row {
            Some(d) => json!({
                "id": d.id,
                "name": d.name,
                "specialization": d.specialization,
                "feeInWei": d.fee_wei.to_string(),
                "isActive": d.is_active,
            }),
            None => json!({
                "id": 0,
                "name": "",
                "specialization": "",
                "feeInWei": "0",
                "isActive": false,
            }),
        }
    }

    fn appointment_json(row: Option<&AppointmentRow>) -> Value {
        match row {
            Some(a) => json!({
                "id": a.id,
                "doctorId": a.doctor_id,
                "patient": a.patient,
                "timestamp": a.timestamp,
                "feeInWei": a.fee_wei.to_string(),
                "isPaid": a.is_paid,
                "isCancelled": a.is_cancelled,
            }),
            None => json!({
                "id": 0,
                "doctorId": 0,
                "patient": ZERO_ADDRESS,
                "timestamp": 0,
                "feeInWei": "0",
                "isPaid": false,
                "isCancelled": false,
            }),
        }
    }

    async fn handle_send(
        &self,
        to: &Address,
        method: &str,
        args: &[Value],
        value_wei: u128,
    ) -> Result<(), ProviderError> {
        let from = self.active_account().await?;

        if *to == self.appointments_address {
            match method {
                "addDoctor" => {
                    let name = arg_str(args, 0)?;
                    let specialization = arg_str(args, 1)?;
                    let fee_wei = arg_wei(args, 2)?;
                    let mut chain = self.chain.write().await;
                    let id = chain.next_doctor_id;
                    chain.next_doctor_id += 1;
                    chain.doctors.insert(
                        id,
                        DoctorRow {
                            id,
                            name,
                            specialization,
                            fee_wei,
                            is_active: true,
                        },
                    );
                    Ok(())
                }
                "addTimeSlot" => {
                    let doctor_id = arg_u64(args, 0)?;
                    let timestamp = arg_u64(args, 1)?;
                    let mut chain = self.chain.write().await;
                    if !chain.doctors.contains_key(&doctor_id) {
                        return Err(ProviderError::Call("doctor not found".into()));
                    }
                    chain
                        .slots
                        .entry(doctor_id)
                        .or_default()
                        .insert(timestamp, false);
                    Ok(())
                }
                "bookAppointment" => {
                    let doctor_id = arg_u64(args, 0)?;
                    let timestamp = arg_u64(args, 1)?;
                    {
                        let chain = self.chain.read().await;
                        let doctor = chain
                            .doctors
                            .get(&doctor_id)
                            .filter(|d| d.is_active)
                            .ok_or_else(|| ProviderError::Call("doctor not found".into()))?;
                        if value_wei < doctor.fee_wei {
                            return Err(ProviderError::Call("insufficient fee".into()));
                        }
                    }
                    self.debit(&from, value_wei).await?;
                    let mut chain = self.chain.write().await;
                    let id = chain.next_appointment_id;
                    chain.next_appointment_id += 1;
                    chain.appointments.insert(
                        id,
                        AppointmentRow {
                            id,
                            doctor_id,
                            patient: from.as_str().to_string(),
                            timestamp,
                            fee_wei: value_wei,
                            is_paid: true,
                            is_cancelled: false,
                        },
                    );
                    if let Some(slots) = chain.slots.get_mut(&doctor_id) {
                        if let Some(booked) = slots.get_mut(&timestamp) {
                            *booked = true;
                        }
                    }
                    Ok(())
                }
                "cancelAppointment" => {
                    let id = arg_u64(args, 0)?;
                    let mut chain = self.chain.write().await;
                    let appointment = chain
                        .appointments
                        .get_mut(&id)
                        .ok_or_else(|| ProviderError::Call("appointment not found".into()))?;
                    if !appointment.patient.eq_ignore_ascii_case(from.as_str()) {
                        return Err(ProviderError::Call("not your appointment".into()));
                    }
                    if appointment.is_cancelled {
                        return Err(ProviderError::Call("already cancelled".into()));
                    }
                    appointment.is_cancelled = true;
                    Ok(())
                }
                _ => Err(ProviderError::Call(format!("unknown method {method}"))),
            }
        } else if *to == self.staking_address {
            match method {
                "stake" => {
                    if value_wei == 0 {
                        return Err(ProviderError::Call("nothing to stake".into()));
                    }
                    self.debit(&from, value_wei).await?;
                    let mut chain = self.chain.write().await;
                    let row = chain.stakes.entry(lower(&from)).or_default();
                    row.amount_wei += value_wei;
                    row.timestamp = Self::now();
                    row.active = true;
                    Ok(())
                }
                "withdraw" => {
                    let refund = {
                        let mut chain = self.chain.write().await;
                        let row = chain
                            .stakes
                            .get_mut(&lower(&from))
                            .filter(|r| r.active)
                            .ok_or_else(|| ProviderError::Call("no active stake".into()))?;
                        let refund = row.amount_wei + row.rewards_wei;
                        *row = StakeRow::default();
                        refund
                    };
                    self.credit(&from, refund).await;
                    Ok(())
                }
                _ => Err(ProviderError::Call(format!("unknown method {method}"))),
            }
        } else {
            Err(ProviderError::Call(format!("unknown contract {to}")))
        }
    }
}

#[async_trait]
impl WalletProvider for MemoryProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if *self.unavailable.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(ProviderError::Unavailable);
        }
        if let Some(err) = self.fail_next_request.lock().unwrap_or_else(|p| p.into_inner()).take() {
            return Err(err);
        }
        Ok(self.accounts.read().await.clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(*self.chain_id.read().await)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn call(
        &self,
        to: &Address,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = args.first().and_then(|v| v.as_u64()) {
            let failing = self.failing_reads.lock().unwrap_or_else(|p| p.into_inner());
            if failing.contains(&(method.to_string(), id)) {
                return Err(ProviderError::Call("execution reverted".into()));
            }
        }

        if *to == self.appointments_address {
            match method {
                "doctors" => {
                    let id = arg_u64(args, 0)?;
                    let chain = self.chain.read().await;
                    Ok(Self::doctor_json(chain.doctors.get(&id)))
                }
                "appointments" => {
                    let id = arg_u64(args, 0)?;
                    let chain = self.chain.read().await;
                    Ok(Self::appointment_json(chain.appointments.get(&id)))
                }
                "getDoctorTimeSlots" => {
                    let doctor_id = arg_u64(args, 0)?;
                    let timestamps: Vec<u64> = args
                        .get(1)
                        .and_then(|v| v.as_array())
                        .map(|arr| arr.iter().filter_map(|v| v.as_u64()).collect())
                        .ok_or_else(|| ProviderError::Call("bad timestamps".into()))?;
                    let chain = self.chain.read().await;
                    let slots = chain.slots.get(&doctor_id);
                    let available: Vec<bool> = timestamps
                        .iter()
                        .map(|ts| {
                            slots
                                .and_then(|s| s.get(ts))
                                .map(|booked| !booked)
                                .unwrap_or(false)
                        })
                        .collect();
                    Ok(json!(available))
                }
                _ => Err(ProviderError::Call(format!("unknown method {method}"))),
            }
        } else if *to == self.staking_address {
            match method {
                "getStakeInfo" => {
                    let address = arg_str(args, 0)?.to_lowercase();
                    let chain = self.chain.read().await;
                    let row = chain.stakes.get(&address).cloned().unwrap_or_default();
                    Ok(json!({
                        "amount": row.amount_wei.to_string(),
                        "timestamp": row.timestamp,
                        "rewards": row.rewards_wei.to_string(),
                        "active": row.active,
                    }))
                }
                _ => Err(ProviderError::Call(format!("unknown method {method}"))),
            }
        } else {
            Err(ProviderError::Call(format!("unknown contract {to}")))
        }
    }

    async fn send(
        &self,
        to: &Address,
        method: &str,
        args: &[Value],
        value_wei: u128,
    ) -> Result<String, ProviderError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.fail_next_send.lock().unwrap_or_else(|p| p.into_inner()).take() {
            return Err(ProviderError::Call(msg));
        }
        self.handle_send(to, method, args, value_wei).await?;
        Ok(self.mint_receipt().await)
    }

    async fn transfer(&self, to: &Address, value_wei: u128) -> Result<String, ProviderError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.fail_next_send.lock().unwrap_or_else(|p| p.into_inner()).take() {
            return Err(ProviderError::Call(msg));
        }
        let from = self.active_account().await?;
        self.debit(&from, value_wei).await?;
        self.credit(to, value_wei).await;
        Ok(self.mint_receipt().await)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ProviderError> {
        let delay = *self.receipt_delay.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.receipts
            .read()
            .await
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| ProviderError::Call("unknown transaction".into()))
    }
}

fn lower(address: &Address) -> String {
    address.as_str().to_lowercase()
}

fn arg_u64(args: &[Value], index: usize) -> Result<u64, ProviderError> {
    args.get(index)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| ProviderError::Call(format!("bad argument {index}")))
}

fn arg_str(args: &[Value], index: usize) -> Result<String, ProviderError> {
    args.get(index)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| ProviderError::Call(format!("bad argument {index}")))
}

fn arg_wei(args: &[Value], index: usize) -> Result<u128, ProviderError> {
    args.get(index)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProviderError::Call(format!("bad argument {index}")))
}
