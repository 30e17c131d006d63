// src/error.rs

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid percentage: {0} (expected a number between 0 and 100)")]
    InvalidPercentage(String),
    #[error("invalid payment status filter: {0}")]
    InvalidStatus(String),
    #[error("invalid treatment record {record_id}: {reason}")]
    InvalidRecord { record_id: u32, reason: String },
    #[error("duplicate treatment record id: {0}")]
    DuplicateRecord(u32),
    #[error("invalid fixed salary: {0}")]
    InvalidSalary(f64),
    #[error("doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),
    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
