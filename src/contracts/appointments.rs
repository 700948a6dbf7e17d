//! Doctor-appointments contract client
//!
//! The contract exposes no enumeration accessor, so collections are
//! reconstructed by probing a bounded ID range in ascending order:
//! doctors 1..=10, appointments 1..=100. A read error for an ID is
//! treated as "does not exist" and skipped; records beyond the bound are
//! invisible to this client even if they exist on chain.

use super::tx::{WriteGate, WriteState};
use super::{Appointment, AppointmentView, Doctor};
use crate::core::{parse_eth_amount, Address};
use crate::error::{NodeError, NodeResult};
use crate::provider::{TxReceipt, WalletProvider};
use crate::session::SessionManager;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const DOCTOR_PROBE_RANGE: RangeInclusive<u64> = 1..=10;
pub const APPOINTMENT_PROBE_RANGE: RangeInclusive<u64> = 1..=100;

/// Sentinel shown when the nested doctor read fails.
const UNKNOWN: &str = "Unknown";

pub struct AppointmentsClient {
    provider: Arc<dyn WalletProvider>,
    session: Arc<SessionManager>,
    address: Address,
    gate: WriteGate,
    cache: RwLock<Vec<AppointmentView>>,
}

impl AppointmentsClient {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        session: Arc<SessionManager>,
        address: Address,
    ) -> Self {
        Self {
            provider,
            session,
            address,
            gate: WriteGate::new(),
            cache: RwLock::new(Vec::new()),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn write_state(&self) -> WriteState {
        self.gate.state()
    }

    /// The last successful appointment scan.
    pub async fn cached_appointments(&self) -> Vec<AppointmentView> {
        self.cache.read().await.clone()
    }

    /// Drop cached results, forcing the next list call to re-scan. Used
    /// when the session reloads against a different chain.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// Probe doctor IDs in ascending order and keep the valid records:
    /// id != 0 and active.
    pub async fn list_doctors(&self) -> NodeResult<Vec<Doctor>> {
        if !self.session.is_connected().await {
            return Err(NodeError::NotConnected);
        }

        let mut doctors = Vec::new();
        for id in DOCTOR_PROBE_RANGE {
            let value = match self.provider.call(&self.address, "doctors", &[json!(id)]).await {
                Ok(value) => value,
                Err(e) => {
                    debug!(id, error = %e, "doctor probe failed, skipping");
                    continue;
                }
            };
            if let Some(doctor) = decode_doctor(&value) {
                if doctor.id != 0 && doctor.is_active {
                    doctors.push(doctor.with_fee());
                }
            }
        }
        Ok(doctors)
    }

    /// Probe appointment IDs in ascending order and keep records owned by
    /// the current account (case-insensitive) that are not cancelled. Each
    /// kept record is joined with its doctor's name and specialization,
    /// falling back to "Unknown" when that nested read fails.
    pub async fn list_appointments(&self) -> NodeResult<Vec<AppointmentView>> {
        let account = self.session.account().await?;

        let mut views = Vec::new();
        for id in APPOINTMENT_PROBE_RANGE {
            let value = match self
                .provider
                .call(&self.address, "appointments", &[json!(id)])
                .await
            {
                Ok(value) => value,
                Err(e) => {
                    debug!(id, error = %e, "appointment probe failed, skipping");
                    continue;
                }
            };
            let Some(appointment) = decode_appointment(&value) else {
                continue;
            };
            if appointment.id == 0 || appointment.patient != account || appointment.is_cancelled {
                continue;
            }
            views.push(self.resolve_view(appointment).await);
        }

        *self.cache.write().await = views.clone();
        Ok(views)
    }

    /// Submit a payable booking with the fee attached. Success is reported
    /// only after on-chain confirmation, then the cached list is refreshed.
    pub async fn book_appointment(
        &self,
        doctor_id: u64,
        timestamp: u64,
        fee_eth: &str,
    ) -> NodeResult<TxReceipt> {
        let fee_wei = parse_eth_amount(fee_eth)?;
        let receipt = self
            .submit("bookAppointment", vec![json!(doctor_id), json!(timestamp)], fee_wei)
            .await?;
        self.refresh_after_write().await;
        Ok(receipt)
    }

    pub async fn cancel_appointment(&self, id: u64) -> NodeResult<TxReceipt> {
        let receipt = self.submit("cancelAppointment", vec![json!(id)], 0).await?;
        self.refresh_after_write().await;
        Ok(receipt)
    }

    /// Register a doctor (admin path).
    pub async fn add_doctor(
        &self,
        name: &str,
        specialization: &str,
        fee_eth: &str,
    ) -> NodeResult<TxReceipt> {
        let fee_wei = parse_eth_amount(fee_eth)?;
        self.submit(
            "addDoctor",
            vec![json!(name), json!(specialization), json!(fee_wei.to_string())],
            0,
        )
        .await
    }

    /// Open a bookable time slot for a doctor (admin path).
    pub async fn add_time_slot(&self, doctor_id: u64, timestamp: u64) -> NodeResult<TxReceipt> {
        self.submit("addTimeSlot", vec![json!(doctor_id), json!(timestamp)], 0)
            .await
    }

    /// Of the candidate timestamps, the ones still bookable.
    pub async fn available_time_slots(
        &self,
        doctor_id: u64,
        timestamps: &[u64],
    ) -> NodeResult<Vec<u64>> {
        if !self.session.is_connected().await {
            return Err(NodeError::NotConnected);
        }
        let value = self
            .provider
            .call(
                &self.address,
                "getDoctorTimeSlots",
                &[json!(doctor_id), json!(timestamps)],
            )
            .await?;
        let flags: Vec<bool> = value
            .as_array()
            .map(|arr| arr.iter().map(|v| v.as_bool().unwrap_or(false)).collect())
            .unwrap_or_default();
        Ok(timestamps
            .iter()
            .zip(flags)
            .filter_map(|(ts, open)| open.then_some(*ts))
            .collect())
    }

    async fn resolve_view(&self, appointment: Appointment) -> AppointmentView {
        let (doctor_name, doctor_specialization) = match self
            .provider
            .call(&self.address, "doctors", &[json!(appointment.doctor_id)])
            .await
            .ok()
            .as_ref()
            .and_then(decode_doctor)
        {
            Some(doctor) => (doctor.name, doctor.specialization),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };

        AppointmentView {
            date: format_timestamp(appointment.timestamp),
            fee_eth: crate::core::format_eth(appointment.fee_wei),
            doctor_name,
            doctor_specialization,
            appointment,
        }
    }

    async fn submit(
        &self,
        method: &str,
        args: Vec<Value>,
        value_wei: u128,
    ) -> NodeResult<TxReceipt> {
        self.session.account().await?;
        self.gate.begin()?;
        let result = self.submit_inner(method, &args, value_wei).await;
        self.gate.settle(result.is_ok());
        result
    }

    async fn submit_inner(
        &self,
        method: &str,
        args: &[Value],
        value_wei: u128,
    ) -> NodeResult<TxReceipt> {
        let tx_hash = self
            .provider
            .send(&self.address, method, args, value_wei)
            .await?;
        self.gate.confirming();
        debug!(method, %tx_hash, "awaiting confirmation");
        let receipt = self.provider.wait_for_receipt(&tx_hash).await?;
        if !receipt.status {
            return Err(NodeError::Contract(format!(
                "transaction {} reverted",
                receipt.tx_hash
            )));
        }
        Ok(receipt)
    }

    async fn refresh_after_write(&self) {
        if let Err(e) = self.list_appointments().await {
            warn!(error = %e, "appointment refresh after write failed");
        }
    }
}

fn decode_doctor(value: &Value) -> Option<Doctor> {
    Some(Doctor {
        id: value.get("id")?.as_u64()?,
        name: value.get("name")?.as_str()?.to_string(),
        specialization: value.get("specialization")?.as_str()?.to_string(),
        fee_wei: value.get("feeInWei")?.as_str()?.parse().ok()?,
        fee_eth: String::new(),
        is_active: value.get("isActive")?.as_bool()?,
    })
}

fn decode_appointment(value: &Value) -> Option<Appointment> {
    Some(Appointment {
        id: value.get("id")?.as_u64()?,
        doctor_id: value.get("doctorId")?.as_u64()?,
        patient: Address::parse(value.get("patient")?.as_str()?).ok()?,
        timestamp: value.get("timestamp")?.as_u64()?,
        fee_wei: value.get("feeInWei")?.as_str()?.parse().ok()?,
        is_paid: value.get("isPaid")?.as_bool()?,
        is_cancelled: value.get("isCancelled")?.as_bool()?,
    })
}

fn format_timestamp(timestamp: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_doctor_record() {
        let value = json!({
            "id": 2,
            "name": "Dr. Michael Chen",
            "specialization": "Neurologist",
            "feeInWei": "25000000000000000",
            "isActive": true,
        });
        let doctor = decode_doctor(&value).expect("doctor").with_fee();
        assert_eq!(doctor.id, 2);
        assert_eq!(doctor.fee_wei, 25_000_000_000_000_000);
        assert_eq!(doctor.fee_eth, "0.025");
    }

    #[test]
    fn decode_rejects_malformed_records() {
        assert!(decode_doctor(&json!({"id": 1})).is_none());
        assert!(decode_appointment(&json!({"id": 1, "doctorId": "two"})).is_none());
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13 UTC");
    }
}
