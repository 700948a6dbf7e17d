//! Integration tests: wallet session lifecycle
//!
//! These tests verify:
//! 1. Connect adopts the wallet's first account and chain id
//! 2. Failed connects leave state unchanged
//! 3. Account-change notifications applied only to a connected session
//! 4. Chain changes update identity and demand a reload
//! 5. Reconnect reads fresh values, never stale ones

use carenode::{Address, MemoryProvider, NodeError, SessionEvent, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const APPOINTMENTS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const STAKING: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
const SEPOLIA: u64 = 11_155_111;

fn addr(s: &str) -> Address {
    Address::parse(s).expect("address")
}

async fn demo_provider() -> Arc<MemoryProvider> {
    Arc::new(MemoryProvider::demo(addr(APPOINTMENTS), addr(STAKING), SEPOLIA).await)
}

async fn recv_event(
    rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
) -> SessionEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event timeout")
        .expect("event")
}

/// Test: connect adopts the first account and reads the chain id
#[tokio::test]
async fn connect_adopts_first_account_and_chain() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());

    let snapshot = session.connect().await.expect("connect");
    assert!(snapshot.connected);
    assert_eq!(snapshot.chain_id, Some(SEPOLIA));
    assert_eq!(
        snapshot.account.expect("account"),
        addr("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
    );
    assert!(session.is_connected().await);
}

/// Test: a rejected request leaves state unchanged and is not retried
#[tokio::test]
async fn rejected_connect_leaves_state_unchanged() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());

    provider.reject_next_request();
    let err = session.connect().await.expect_err("rejection");
    assert!(matches!(err, NodeError::Rejected));

    let snapshot = session.snapshot().await;
    assert!(!snapshot.connected);
    assert!(snapshot.account.is_none());
    assert!(snapshot.chain_id.is_none());

    // The failure consumed nothing; a fresh explicit connect works.
    assert!(session.connect().await.is_ok());
}

/// Test: a missing wallet is fatal for the attempt
#[tokio::test]
async fn unavailable_wallet_fails_connect() {
    let provider = demo_provider().await;
    provider.make_unavailable();
    let session = SessionManager::new(provider.clone());

    let err = session.connect().await.expect_err("unavailable");
    assert!(matches!(err, NodeError::WalletUnavailable(_)));
    assert!(!session.is_connected().await);
}

/// Test: a wallet with zero accounts cannot establish a session
#[tokio::test]
async fn empty_account_list_fails_connect() {
    let provider = Arc::new(MemoryProvider::new(addr(APPOINTMENTS), addr(STAKING), SEPOLIA));
    let session = SessionManager::new(provider.clone());

    let err = session.connect().await.expect_err("no accounts");
    assert!(matches!(err, NodeError::WalletUnavailable(_)));
}

/// Test: the session adopts the first address of an account change
#[tokio::test]
async fn account_change_adopts_new_address() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");

    let mut events = session.events();
    let replacement = addr("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    provider.push_accounts_changed(vec![replacement.clone()]).await;

    match recv_event(&mut events).await {
        SessionEvent::AccountChanged(account) => assert_eq!(account, replacement),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(session.account().await.expect("account"), replacement);
    assert!(session.is_connected().await);
}

/// Test: an empty account list ends the session
#[tokio::test]
async fn empty_account_list_disconnects() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");

    let mut events = session.events();
    provider.push_accounts_changed(vec![]).await;

    assert!(matches!(
        recv_event(&mut events).await,
        SessionEvent::Disconnected
    ));
    let snapshot = session.snapshot().await;
    assert!(!snapshot.connected);
    assert!(snapshot.account.is_none());
    assert!(snapshot.chain_id.is_none());
}

/// Test: a chain change updates the chain id and demands a reload
#[tokio::test]
async fn chain_change_requires_reload() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());
    session.connect().await.expect("connect");

    let mut events = session.events();
    provider.push_chain_changed(1).await;

    match recv_event(&mut events).await {
        SessionEvent::ReloadRequired(chain_id) => assert_eq!(chain_id, 1),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(session.chain_id().await, Some(1));
}

/// Test: notifications while disconnected do not create session state
#[tokio::test]
async fn notifications_ignored_while_disconnected() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());

    let mut events = session.events();
    provider
        .push_accounts_changed(vec![addr("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")])
        .await;
    provider.push_chain_changed(1).await;

    assert!(timeout(Duration::from_millis(100), events.recv()).await.is_err());
    let snapshot = session.snapshot().await;
    assert!(!snapshot.connected);
    assert!(snapshot.account.is_none());
}

/// Test: disconnect then reconnect picks up fresh wallet values
#[tokio::test]
async fn reconnect_reads_fresh_values() {
    let provider = demo_provider().await;
    let session = SessionManager::new(provider.clone());

    let first = session.connect().await.expect("connect");
    assert_eq!(first.chain_id, Some(SEPOLIA));

    session.disconnect().await;
    assert!(!session.is_connected().await);

    // The wallet moved on while we were disconnected.
    let replacement = addr("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    provider.set_accounts(vec![replacement.clone()]).await;
    provider.push_chain_changed(1).await;

    let second = session.connect().await.expect("reconnect");
    assert_eq!(second.account.expect("account"), replacement);
    assert_eq!(second.chain_id, Some(1));
}
