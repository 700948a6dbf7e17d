//! Contract clients: doctor appointments and staking.
//!
//! Both clients are bound to a deployed contract address and a live
//! session; the wallet provider carries the actual call encoding. Wei
//! amounts serialize as decimal strings, the same shape the wallet's
//! big-number layer hands back.

mod appointments;
mod staking;
pub mod tx;

pub use appointments::{AppointmentsClient, APPOINTMENT_PROBE_RANGE, DOCTOR_PROBE_RANGE};
pub use staking::StakingClient;
pub use tx::{WriteGate, WriteState};

use crate::core::{format_eth, Address};
use serde::{Serialize, Serializer};

fn wei_string<S: Serializer>(wei: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&wei.to_string())
}

/// A registered doctor. Immutable once created; valid only while the
/// active flag is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: u64,
    pub name: String,
    pub specialization: String,
    #[serde(rename = "feeInWei", serialize_with = "wei_string")]
    pub fee_wei: u128,
    #[serde(rename = "feeInEth")]
    pub fee_eth: String,
    pub is_active: bool,
}

impl Doctor {
    pub(crate) fn with_fee(mut self) -> Self {
        self.fee_eth = format_eth(self.fee_wei);
        self
    }
}

/// An on-chain appointment. Created by a payable booking call, mutated
/// only by cancellation (a tombstone flag, never a delete).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: u64,
    pub doctor_id: u64,
    pub patient: Address,
    pub timestamp: u64,
    #[serde(rename = "feeInWei", serialize_with = "wei_string")]
    pub fee_wei: u128,
    pub is_paid: bool,
    pub is_cancelled: bool,
}

/// An appointment joined with its doctor's details and display fields,
/// the shape list callers consume.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_name: String,
    pub doctor_specialization: String,
    pub date: String,
    #[serde(rename = "feeInEth")]
    pub fee_eth: String,
}

/// Staking position for one account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeInfo {
    #[serde(rename = "amount", serialize_with = "wei_string")]
    pub amount_wei: u128,
    pub timestamp: u64,
    #[serde(rename = "rewards", serialize_with = "wei_string")]
    pub rewards_wei: u128,
    pub active: bool,
}
