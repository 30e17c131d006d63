// src/doctor.rs

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    pub fixed_salary: f64,
}
