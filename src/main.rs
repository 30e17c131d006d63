// src/main.rs

pub mod db;
pub mod doctor;
pub mod error;
pub mod incentive;
pub mod salary;
pub mod treatment;

use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
//
use crate::{db::{Config, DB}, incentive::RecordUpdate, salary::SalaryView};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = DB::new(&config).await?;

    let mut salary = SalaryView::new(db, &config.doctor_id).await?;

    if let Some(percent) = &config.incentive_percent {
        salary.calculator.apply_uniform_percent_str(percent)?;
        info!("applied {}% incentive to every record", percent);
    }

    // per-record overrides win over the uniform percentage
    for (record_id, value) in &config.incentive_overrides {
        if salary.calculator.apply_record_percent(*record_id, value) == RecordUpdate::Applied {
            if let Some(record) = salary.calculator.record(*record_id) {
                info!("record {} incentive set to {} ({:.2})", record_id, record.incentive_percent(), record.incentive_amount());
            }
        }
    }

    let report = salary.publish(config.status_filter).await?;

    match &salary.doctor.specialization {
        Some(specialization) => println!("{}, {} ({})", report.doctor_name, specialization, report.status_filter),
        None => println!("{} ({})", report.doctor_name, report.status_filter),
    }
    for line in &report.lines {
        println!(
            "  #{:<4} {:<10} {:<20} {:<10} {:<16} {:>10.2} {:>10.2} {:>6}% {:>10.2}",
            line.record_id(),
            line.patient_id(),
            line.patient_name(),
            line.treatment_date(),
            line.treatment_type(),
            line.treatment_amount(),
            line.paid_amount(),
            line.incentive_percent().value(),
            line.incentive_amount(),
        );
    }
    println!("  fixed salary      {:>12.2}", report.totals.fixed_salary);
    println!("  total incentives  {:>12.2}", report.totals.total_incentives);
    println!("  grand total       {:>12.2}", report.totals.grand_total);

    Ok(())
}
