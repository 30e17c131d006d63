// src/db.rs

use futures::stream::TryStreamExt;
use mongodb::{bson::{doc, to_document, Document}, options::{FindOptions, ReplaceOptions}, Client};
use tracing::debug;
//
use crate::{
    doctor::Doctor,
    error::{ClinicError, ClinicResult},
    incentive::StatusFilter,
    salary::SalaryReport,
    treatment::TreatmentRecord,
};

pub const DOCTORS: &str = "doctors";
pub const TREATMENTS: &str = "treatments";
pub const SALARY_REPORTS: &str = "salary_reports";

const DEFAULT_DATABASE: &str = "clinic";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub uri: String,
    pub database: String,
    pub doctor_id: String,
    pub incentive_percent: Option<String>,
    pub incentive_overrides: Vec<(u32, String)>,
    pub status_filter: StatusFilter,
}

impl Config {
    /// Read configuration from the process environment (after `.env` has been loaded).
    pub fn from_env() -> ClinicResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ClinicResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let uri = value("MONGODB_URI").ok_or(ClinicError::MissingConfig("MONGODB_URI"))?;
        let doctor_id = value("DOCTOR_ID").ok_or(ClinicError::MissingConfig("DOCTOR_ID"))?;
        let database = value("CLINIC_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        // checked when it is applied to the calculator
        let incentive_percent = value("INCENTIVE_PERCENT");

        let incentive_overrides = match value("INCENTIVE_OVERRIDES") {
            Some(raw) => parse_overrides(&raw)?,
            None => Vec::new(),
        };

        let status_filter = match value("STATUS_FILTER") {
            Some(raw) => raw.parse::<StatusFilter>()?,
            None => StatusFilter::All,
        };

        Ok(Self {
            uri,
            database,
            doctor_id,
            incentive_percent,
            incentive_overrides,
            status_filter,
        })
    }
}

// "3=12.5, 7=20" -> [(3, "12.5"), (7, "20")]; values are validated later by the calculator
fn parse_overrides(raw: &str) -> ClinicResult<Vec<(u32, String)>> {
    let invalid = |pair: &str| ClinicError::InvalidConfig {
        key: "INCENTIVE_OVERRIDES",
        value: pair.to_string(),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> ClinicResult<(u32, String)> {
            let (id, value) = pair.split_once('=').ok_or_else(|| invalid(pair))?;
            let id = id.trim().parse::<u32>().map_err(|_| invalid(pair))?;

            Ok((id, value.trim().to_string()))
        })
        .collect()
}

pub fn doctor_filter(doctor_id: &str) -> Document {
    doc! { "doctor_id": doctor_id }
}

pub fn treatment_sort() -> Document {
    doc! { "record_id": 1 }
}

pub fn report_replace_options() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

#[derive(Clone, Debug)]
pub struct DB {
    pub client: Client,
    pub database: String,
}

impl DB {
    pub async fn new(config: &Config) -> ClinicResult<Self> {
        let client = Client::with_uri_str(&config.uri).await?;

        Ok(Self {
            client,
            database: config.database.clone(),
        })
    }

    pub async fn find_doctor(&self, doctor_id: &str) -> ClinicResult<Option<Doctor>> {
        let collection = self.client.database(&self.database).collection::<Doctor>(DOCTORS);

        Ok(collection.find_one(doctor_filter(doctor_id), None).await?)
    }

    // records come back in record_id order so listings stay stable between runs
    pub async fn find_treatments(&self, doctor_id: &str) -> ClinicResult<Vec<TreatmentRecord>> {
        let collection = self.client.database(&self.database).collection::<TreatmentRecord>(TREATMENTS);

        let find_options = FindOptions::builder().sort(treatment_sort()).build();

        let mut cursor = collection.find(doctor_filter(doctor_id), find_options).await?;

        let mut records = Vec::new();
        while let Some(record) = cursor.try_next().await? {
            records.push(record);
        }

        debug!("loaded {} treatment records for {}", records.len(), doctor_id);

        Ok(records)
    }

    pub async fn replace_report(&self, report: &SalaryReport) -> ClinicResult<()> {
        let collection = self.client.database(&self.database).collection::<Document>(SALARY_REPORTS);
        let document = to_document(report)?;

        // one report per doctor
        collection
            .replace_one(doctor_filter(&report.doctor_id), document, report_replace_options())
            .await?;

        Ok(())
    }
}
