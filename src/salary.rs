// src/salary.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
//
use crate::{
    db::DB,
    doctor::Doctor,
    error::{ClinicError, ClinicResult},
    incentive::{IncentiveCalculator, IncentiveTotals, StatusFilter},
    treatment::TreatmentRecord,
};

/// Snapshot of a doctor's salary breakdown for one status filter.
#[derive(Clone, Debug, Serialize)]
pub struct SalaryReport {
    pub doctor_id: String,
    pub doctor_name: String,
    pub status_filter: StatusFilter,
    pub generated_at: DateTime<Utc>,
    pub totals: IncentiveTotals,
    pub lines: Vec<TreatmentRecord>,
}

impl SalaryReport {
    pub fn build(doctor: &Doctor, calculator: &IncentiveCalculator, status_filter: StatusFilter) -> Self {
        SalaryReport {
            doctor_id: doctor.doctor_id.clone(),
            doctor_name: doctor.name.clone(),
            status_filter,
            generated_at: Utc::now(),
            totals: calculator.totals(status_filter),
            lines: calculator.filter(status_filter).into_iter().cloned().collect(),
        }
    }
}

pub struct SalaryView {
    pub db: DB,
    pub doctor: Doctor,
    pub calculator: IncentiveCalculator,
}

impl SalaryView {
    // load the doctor and their treatment records
    pub async fn new(db: DB, doctor_id: &str) -> ClinicResult<Self> {
        let doctor = db
            .find_doctor(doctor_id)
            .await?
            .ok_or_else(|| ClinicError::DoctorNotFound(doctor_id.to_string()))?;

        let records = db.find_treatments(doctor_id).await?;

        info!("loaded {} treatment records for {} ({})", records.len(), doctor.name, doctor.doctor_id);

        let calculator = IncentiveCalculator::new(doctor.fixed_salary, records)?;

        Ok(Self { db, doctor, calculator })
    }

    pub fn report(&self, status_filter: StatusFilter) -> SalaryReport {
        SalaryReport::build(&self.doctor, &self.calculator, status_filter)
    }

    // build the report and store it in place of the doctor's previous one
    pub async fn publish(&self, status_filter: StatusFilter) -> ClinicResult<SalaryReport> {
        let report = self.report(status_filter);

        self.db.replace_report(&report).await?;

        info!(
            "published salary report for {}: {} lines, incentives {:.2}, grand total {:.2}",
            report.doctor_id,
            report.lines.len(),
            report.totals.total_incentives,
            report.totals.grand_total
        );

        Ok(report)
    }
}
