//! Integration tests: contract clients over the demo chain
//!
//! These tests verify:
//! 1. Doctor probing keeps only valid records inside the bound, ascending
//! 2. Appointment filtering: case-insensitive ownership, no cancelled rows
//! 3. Booking attaches the exact wei fee and refreshes the cached list
//! 4. The doctor-name fallback when the nested read fails
//! 5. The write gate rejects a second submit while one is pending
//! 6. Staking round trip and local amount validation

use carenode::{
    Address, AppointmentsClient, MemoryProvider, NodeError, SessionManager, StakingClient,
    WriteState,
};
use std::sync::Arc;
use std::time::Duration;

const APPOINTMENTS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const STAKING: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
const SEPOLIA: u64 = 11_155_111;

// First demo wallet account, checksum casing.
const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const OTHER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

const ETH: u128 = 1_000_000_000_000_000_000;

fn addr(s: &str) -> Address {
    Address::parse(s).expect("address")
}

async fn connected_client() -> (Arc<MemoryProvider>, Arc<AppointmentsClient>) {
    let provider =
        Arc::new(MemoryProvider::demo(addr(APPOINTMENTS), addr(STAKING), SEPOLIA).await);
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");
    let client = Arc::new(AppointmentsClient::new(
        provider.clone(),
        session,
        addr(APPOINTMENTS),
    ));
    (provider, client)
}

/// Test: probing keeps only id != 0 && active, ascending, inside 1..=10
#[tokio::test]
async fn doctor_probe_filters_and_orders() {
    let (provider, client) = connected_client().await;

    provider.insert_doctor(3, "Dr. Emily Rodriguez", "Pediatrician", 15_000_000_000_000_000, true).await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 25_000_000_000_000_000, true).await;
    provider.insert_doctor(5, "Dr. Retired", "Cardiologist", ETH, false).await;
    provider.insert_doctor(11, "Dr. Invisible", "Oncologist", ETH, true).await;
    provider.insert_doctor(7, "Dr. Unreachable", "Dermatologist", ETH, true).await;
    provider.fail_reads_for("doctors", 7);

    let doctors = client.list_doctors().await.expect("list");
    let ids: Vec<u64> = doctors.iter().map(|d| d.id).collect();
    // 5 is inactive, 7 reverts (treated as absent), 11 is beyond the bound.
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(doctors[0].name, "Dr. Michael Chen");
    assert_eq!(doctors[0].fee_eth, "0.025");
}

/// Test: probing requires a live session
#[tokio::test]
async fn probing_requires_connection() {
    let provider =
        Arc::new(MemoryProvider::demo(addr(APPOINTMENTS), addr(STAKING), SEPOLIA).await);
    let session = SessionManager::new(provider.clone());
    let client = AppointmentsClient::new(provider, session, addr(APPOINTMENTS));

    assert!(matches!(
        client.list_doctors().await,
        Err(NodeError::NotConnected)
    ));
    assert!(matches!(
        client.list_appointments().await,
        Err(NodeError::NotConnected)
    ));
}

/// Test: ownership matches case-insensitively; cancelled and foreign
/// records are excluded; IDs beyond 100 are invisible
#[tokio::test]
async fn appointment_filter_ownership_and_lifecycle() {
    let (provider, client) = connected_client().await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 25_000_000_000_000_000, true).await;

    // Patient stored lower-cased; the session account is checksum-cased.
    let lower = ACCOUNT.to_lowercase();
    provider.insert_appointment(5, 2, &lower, 1_700_000_000, 25_000_000_000_000_000, true, false).await;
    provider.insert_appointment(6, 2, OTHER, 1_700_000_000, ETH, true, false).await;
    provider.insert_appointment(7, 2, ACCOUNT, 1_700_000_000, ETH, true, true).await;
    provider.insert_appointment(101, 2, ACCOUNT, 1_700_000_000, ETH, true, false).await;

    let views = client.list_appointments().await.expect("list");
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.appointment.id, 5);
    assert_eq!(view.doctor_name, "Dr. Michael Chen");
    assert_eq!(view.doctor_specialization, "Neurologist");
    assert_eq!(view.fee_eth, "0.025");
}

/// Test: a failing nested doctor read falls back to "Unknown"
#[tokio::test]
async fn unknown_doctor_fallback() {
    let (provider, client) = connected_client().await;
    provider.insert_appointment(1, 9, ACCOUNT, 1_700_000_000, ETH, true, false).await;
    provider.fail_reads_for("doctors", 9);

    let views = client.list_appointments().await.expect("list");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].doctor_name, "Unknown");
    assert_eq!(views[0].doctor_specialization, "Unknown");
}

/// Test: booking attaches exactly fee x 10^18 wei and refreshes the list
#[tokio::test]
async fn booking_attaches_exact_fee_and_refreshes() {
    let (provider, client) = connected_client().await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 20_000_000_000_000_000, true).await;
    let account = addr(ACCOUNT);
    let before = provider.balance_of(&account).await;

    let receipt = client
        .book_appointment(2, 1_700_000_000, "0.025")
        .await
        .expect("book");
    assert!(receipt.status);

    // 0.025 ETH left the account, to the base unit.
    assert_eq!(before - provider.balance_of(&account).await, 25_000_000_000_000_000);

    let cached = client.cached_appointments().await;
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].appointment.doctor_id, 2);
    assert_eq!(cached[0].fee_eth, "0.025");
    assert_eq!(client.write_state(), WriteState::Succeeded);
}

/// Test: a failed write surfaces the wallet's message and releases the gate
#[tokio::test]
async fn booking_failure_surfaces_and_releases_gate() {
    let (provider, client) = connected_client().await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 20_000_000_000_000_000, true).await;

    provider.fail_next_send("user rejected transaction");
    let err = client
        .book_appointment(2, 1_700_000_000, "0.025")
        .await
        .expect_err("failure");
    assert!(err.to_string().contains("user rejected transaction"));
    assert_eq!(client.write_state(), WriteState::Failed);

    // The gate settled; the next explicit attempt goes through.
    client
        .book_appointment(2, 1_700_000_000, "0.025")
        .await
        .expect("retry");
}

/// Test: cancellation tombstones the record out of the list
#[tokio::test]
async fn cancel_removes_appointment_from_list() {
    let (provider, client) = connected_client().await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 20_000_000_000_000_000, true).await;

    client.book_appointment(2, 1_700_000_000, "0.025").await.expect("book");
    assert_eq!(client.cached_appointments().await.len(), 1);

    client.cancel_appointment(1).await.expect("cancel");
    assert!(client.cached_appointments().await.is_empty());
    assert!(client.list_appointments().await.expect("list").is_empty());
}

/// Test: a second submit while one is pending fails fast
#[tokio::test]
async fn write_gate_blocks_concurrent_writes() {
    let (provider, client) = connected_client().await;
    provider.insert_doctor(2, "Dr. Michael Chen", "Neurologist", 20_000_000_000_000_000, true).await;
    provider.set_receipt_delay(Duration::from_millis(200));

    let racing = client.clone();
    let first = tokio::spawn(async move {
        racing.book_appointment(2, 1_700_000_000, "0.025").await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = client
        .book_appointment(2, 1_700_000_100, "0.025")
        .await
        .expect_err("in flight");
    assert!(matches!(err, NodeError::WriteInFlight));

    first.await.expect("join").expect("first booking");
    // Settled now; a new write is accepted.
    client
        .book_appointment(2, 1_700_000_200, "0.025")
        .await
        .expect("after settle");
}

/// Test: added doctors and time slots show up in availability checks
#[tokio::test]
async fn time_slots_reflect_bookings() {
    let (_provider, client) = connected_client().await;

    client
        .add_doctor("Dr. Sarah Johnson", "Cardiologist", "0.02")
        .await
        .expect("add doctor");
    let doctors = client.list_doctors().await.expect("list");
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, 1);

    client.add_time_slot(1, 1_700_000_000).await.expect("slot");
    let open = client
        .available_time_slots(1, &[1_700_000_000, 1_700_003_600])
        .await
        .expect("slots");
    assert_eq!(open, vec![1_700_000_000]);

    client.book_appointment(1, 1_700_000_000, "0.02").await.expect("book");
    let open = client
        .available_time_slots(1, &[1_700_000_000, 1_700_003_600])
        .await
        .expect("slots");
    assert!(open.is_empty());
}

/// Test: stake, read the position back, withdraw it
#[tokio::test]
async fn staking_round_trip() {
    let provider =
        Arc::new(MemoryProvider::demo(addr(APPOINTMENTS), addr(STAKING), SEPOLIA).await);
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");
    let staking = StakingClient::new(provider.clone(), session, addr(STAKING));
    let account = addr(ACCOUNT);
    let before = provider.balance_of(&account).await;

    staking.stake("1.5").await.expect("stake");
    let info = staking.stake_info(&account).await.expect("info");
    assert_eq!(info.amount_wei, 1_500_000_000_000_000_000);
    assert!(info.active);
    assert_eq!(provider.balance_of(&account).await, before - 1_500_000_000_000_000_000);

    staking.withdraw().await.expect("withdraw");
    let info = staking.stake_info(&account).await.expect("info");
    assert_eq!(info.amount_wei, 0);
    assert!(!info.active);
    assert_eq!(provider.balance_of(&account).await, before);
}

/// Test: bad amounts are rejected locally, before any wallet call
#[tokio::test]
async fn stake_rejects_bad_amounts_locally() {
    let provider =
        Arc::new(MemoryProvider::demo(addr(APPOINTMENTS), addr(STAKING), SEPOLIA).await);
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");
    let staking = StakingClient::new(provider.clone(), session, addr(STAKING));

    for bad in ["-1", "0", "abc", ""] {
        let err = staking.stake(bad).await.expect_err("invalid amount");
        assert_eq!(err.to_string(), "Please enter a valid amount");
    }
    assert_eq!(provider.send_count(), 0);
}
