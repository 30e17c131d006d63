// src/treatment.rs

use std::{fmt, str::FromStr};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
//
use crate::{error::ClinicError, incentive::Percent};

// currency amounts are compared with this slack after summing
const SPLIT_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(PaymentStatus::Paid),
            "partial" => Ok(PaymentStatus::Partial),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err(ClinicError::InvalidStatus(s.to_string())),
        }
    }
}

/// Unvalidated treatment row as it is stored in the `treatments` collection.
///
/// Stored keys are snake_case, the same keys `db` filters and sorts on. Any
/// `incentive_amount` present in the stored document is ignored; the amount is
/// always derived again from `paid_amount` and `incentive_percent`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TreatmentDocument {
    pub record_id: u32,
    pub doctor_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub treatment_date: NaiveDate,
    pub treatment_type: String,
    pub treatment_amount: f64,
    pub payment_status: PaymentStatus,
    pub paid_amount: f64,
    pub pending_amount: f64,
    #[serde(default)]
    pub incentive_percent: f64,
}

/// One billable treatment belonging to a single doctor's record set.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "TreatmentDocument")]
pub struct TreatmentRecord {
    record_id: u32,
    doctor_id: String,
    patient_id: String,
    patient_name: String,
    treatment_date: NaiveDate,
    treatment_type: String,
    treatment_amount: f64,
    payment_status: PaymentStatus,
    paid_amount: f64,
    pending_amount: f64,
    incentive_percent: Percent,
    incentive_amount: f64,
}

impl TreatmentRecord {
    pub fn record_id(&self) -> u32 {
        self.record_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn treatment_date(&self) -> NaiveDate {
        self.treatment_date
    }

    pub fn treatment_type(&self) -> &str {
        &self.treatment_type
    }

    pub fn treatment_amount(&self) -> f64 {
        self.treatment_amount
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn paid_amount(&self) -> f64 {
        self.paid_amount
    }

    pub fn pending_amount(&self) -> f64 {
        self.pending_amount
    }

    pub fn incentive_percent(&self) -> Percent {
        self.incentive_percent
    }

    pub fn incentive_amount(&self) -> f64 {
        self.incentive_amount
    }

    /// Set the incentive percentage and recompute the incentive amount from the paid amount.
    pub fn set_incentive_percent(&mut self, percent: Percent) {
        self.incentive_percent = percent;
        self.incentive_amount = percent.of(self.paid_amount);
    }
}

impl TryFrom<TreatmentDocument> for TreatmentRecord {
    type Error = ClinicError;

    fn try_from(doc: TreatmentDocument) -> Result<Self, Self::Error> {
        let record_id = doc.record_id;
        let invalid = |reason: String| ClinicError::InvalidRecord { record_id, reason };

        check_split(&doc).map_err(invalid)?;

        let incentive_percent = Percent::try_from(doc.incentive_percent)
            .map_err(|_| invalid(format!("incentive percent {} is outside 0..=100", doc.incentive_percent)))?;

        let mut record = TreatmentRecord {
            record_id,
            doctor_id: doc.doctor_id,
            patient_id: doc.patient_id,
            patient_name: doc.patient_name,
            treatment_date: doc.treatment_date,
            treatment_type: doc.treatment_type,
            treatment_amount: doc.treatment_amount,
            payment_status: doc.payment_status,
            paid_amount: doc.paid_amount,
            pending_amount: doc.pending_amount,
            incentive_percent: Percent::ZERO,
            incentive_amount: 0.0,
        };
        record.set_incentive_percent(incentive_percent);

        Ok(record)
    }
}

fn check_split(doc: &TreatmentDocument) -> Result<(), String> {
    let amounts = [
        ("treatment amount", doc.treatment_amount),
        ("paid amount", doc.paid_amount),
        ("pending amount", doc.pending_amount),
    ];

    for (label, amount) in amounts {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{} must be a non-negative amount, got {}", label, amount));
        }
    }

    if (doc.paid_amount + doc.pending_amount - doc.treatment_amount).abs() > SPLIT_TOLERANCE {
        return Err(format!(
            "paid {} + pending {} does not equal treatment amount {}",
            doc.paid_amount, doc.pending_amount, doc.treatment_amount
        ));
    }

    Ok(())
}
