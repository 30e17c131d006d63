// src/incentive.rs

use std::{collections::HashSet, fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
//
use crate::{error::{ClinicError, ClinicResult}, treatment::{PaymentStatus, TreatmentRecord}};

/// A finite percentage in `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Share of `amount` this percentage represents.
    pub fn of(self, amount: f64) -> f64 {
        amount * self.0 / 100.0
    }
}

impl TryFrom<f64> for Percent {
    type Error = ClinicError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Percent(value))
        } else {
            Err(ClinicError::InvalidPercentage(value.to_string()))
        }
    }
}

impl From<Percent> for f64 {
    fn from(percent: Percent) -> f64 {
        percent.0
    }
}

impl FromStr for Percent {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| ClinicError::InvalidPercentage(s.to_string()))?;

        Percent::try_from(value).map_err(|_| ClinicError::InvalidPercentage(s.to_string()))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Which records an aggregation or listing covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(PaymentStatus),
}

impl StatusFilter {
    pub fn matches(&self, record: &TreatmentRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => record.payment_status() == *status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => f.write_str(status.as_str()),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }

        s.parse::<PaymentStatus>().map(StatusFilter::Only)
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = ClinicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> String {
        filter.to_string()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct IncentiveTotals {
    pub total_treatment: f64,
    pub total_paid: f64,
    pub total_pending: f64,
    pub total_incentives: f64,
    pub fixed_salary: f64,
    pub grand_total: f64,
}

impl IncentiveTotals {
    pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a TreatmentRecord>, fixed_salary: f64) -> Self {
        let mut totals = IncentiveTotals {
            fixed_salary,
            ..Default::default()
        };

        for record in records {
            totals.total_treatment += record.treatment_amount();
            totals.total_paid += record.paid_amount();
            totals.total_pending += record.pending_amount();
            totals.total_incentives += record.incentive_amount();
        }

        totals.grand_total = fixed_salary + totals.total_incentives;

        totals
    }
}

/// Outcome of a per-record percentage update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordUpdate {
    Applied,
    Ignored,
}

/// Incentive bookkeeping over one doctor's treatment records.
#[derive(Clone, Debug)]
pub struct IncentiveCalculator {
    fixed_salary: f64,
    records: Vec<TreatmentRecord>,
}

impl IncentiveCalculator {
    pub fn new(fixed_salary: f64, records: Vec<TreatmentRecord>) -> ClinicResult<Self> {
        if !fixed_salary.is_finite() || fixed_salary < 0.0 {
            return Err(ClinicError::InvalidSalary(fixed_salary));
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.record_id()) {
                return Err(ClinicError::DuplicateRecord(record.record_id()));
            }
        }

        Ok(Self { fixed_salary, records })
    }

    pub fn records(&self) -> &[TreatmentRecord] {
        &self.records
    }

    pub fn record(&self, record_id: u32) -> Option<&TreatmentRecord> {
        self.records.iter().find(|record| record.record_id() == record_id)
    }

    /// Overwrite every record's percentage with `percent`.
    pub fn apply_uniform_percent(&mut self, percent: Percent) {
        for record in self.records.iter_mut() {
            record.set_incentive_percent(percent);
        }
    }

    /// Parse `value` and apply it to every record. Nothing changes when it is rejected.
    pub fn apply_uniform_percent_str(&mut self, value: &str) -> ClinicResult<()> {
        let percent = value.parse::<Percent>().map_err(|err| {
            warn!("rejected uniform incentive percentage {:?}", value);
            err
        })?;

        self.apply_uniform_percent(percent);

        Ok(())
    }

    /// Update a single record's percentage from free text.
    ///
    /// Unparseable or out-of-range values and unknown ids are dropped silently.
    pub fn apply_record_percent(&mut self, record_id: u32, value: &str) -> RecordUpdate {
        let percent = match value.parse::<Percent>() {
            Ok(percent) => percent,
            Err(_) => {
                debug!("ignoring incentive percentage {:?} for record {}", value, record_id);
                return RecordUpdate::Ignored;
            }
        };

        match self.records.iter_mut().find(|record| record.record_id() == record_id) {
            Some(record) => {
                record.set_incentive_percent(percent);
                RecordUpdate::Applied
            }
            None => {
                debug!("ignoring incentive percentage for unknown record {}", record_id);
                RecordUpdate::Ignored
            }
        }
    }

    pub fn filter(&self, filter: StatusFilter) -> Vec<&TreatmentRecord> {
        self.records.iter().filter(|record| filter.matches(record)).collect()
    }

    /// Totals over the filtered records. The grand total only counts incentives of
    /// records that pass `filter`.
    pub fn totals(&self, filter: StatusFilter) -> IncentiveTotals {
        IncentiveTotals::aggregate(self.filter(filter), self.fixed_salary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treatment::tests::record;

    fn calculator() -> IncentiveCalculator {
        IncentiveCalculator::new(
            50000.0,
            vec![
                record(1, PaymentStatus::Paid, 1000.0, 0.0),
                record(2, PaymentStatus::Pending, 500.0, 0.0),
            ],
        )
        .unwrap()
    }

    fn mixed() -> IncentiveCalculator {
        IncentiveCalculator::new(
            30000.0,
            vec![
                record(1, PaymentStatus::Paid, 2000.0, 0.0),
                record(2, PaymentStatus::Partial, 400.0, 600.0),
                record(3, PaymentStatus::Pending, 0.0, 750.0),
                record(4, PaymentStatus::Paid, 1500.0, 0.0),
                record(5, PaymentStatus::Partial, 900.0, 100.0),
            ],
        )
        .unwrap()
    }

    fn ids(records: &[&TreatmentRecord]) -> Vec<u32> {
        records.iter().map(|record| record.record_id()).collect()
    }

    #[test]
    fn percent_accepts_bounds() {
        assert_eq!(Percent::try_from(0.0).unwrap().value(), 0.0);
        assert_eq!(Percent::try_from(100.0).unwrap().value(), 100.0);
        assert_eq!("12.5".parse::<Percent>().unwrap().value(), 12.5);
        assert_eq!(" 7 ".parse::<Percent>().unwrap().value(), 7.0);
    }

    #[test]
    fn percent_rejects_out_of_range_and_non_numeric() {
        for value in ["-1", "100.01", "abc", "", "NaN", "inf"] {
            assert!(
                matches!(value.parse::<Percent>(), Err(ClinicError::InvalidPercentage(_))),
                "{:?} should be rejected",
                value
            );
        }
        assert!(Percent::try_from(f64::NAN).is_err());
    }

    #[test]
    fn status_filter_parses() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("partial".parse::<StatusFilter>().unwrap(), StatusFilter::Only(PaymentStatus::Partial));
        assert!(matches!("some".parse::<StatusFilter>(), Err(ClinicError::InvalidStatus(_))));
    }

    #[test]
    fn uniform_percent_sets_every_record() {
        let mut calculator = mixed();

        calculator.apply_uniform_percent(Percent::try_from(10.0).unwrap());

        for record in calculator.records() {
            assert_eq!(record.incentive_percent().value(), 10.0);
            assert_eq!(record.incentive_amount(), record.paid_amount() * 10.0 / 100.0);
        }
    }

    #[test]
    fn uniform_percent_overwrites_per_record_values() {
        let mut calculator = mixed();
        assert_eq!(calculator.apply_record_percent(4, "30"), RecordUpdate::Applied);

        calculator.apply_uniform_percent_str("5").unwrap();

        assert_eq!(calculator.record(4).unwrap().incentive_percent().value(), 5.0);
        assert_eq!(calculator.record(4).unwrap().incentive_amount(), 75.0);
    }

    #[test]
    fn rejected_uniform_percent_leaves_records_unchanged() {
        let mut calculator = mixed();
        calculator.apply_uniform_percent_str("20").unwrap();
        let before = calculator.records().to_vec();

        for value in ["101", "-5", "twenty", "NaN"] {
            assert!(matches!(
                calculator.apply_uniform_percent_str(value),
                Err(ClinicError::InvalidPercentage(_))
            ));
        }

        assert_eq!(calculator.records(), before.as_slice());
    }

    #[test]
    fn record_percent_touches_only_that_record() {
        let mut calculator = mixed();

        assert_eq!(calculator.apply_record_percent(2, "15"), RecordUpdate::Applied);

        assert_eq!(calculator.record(2).unwrap().incentive_amount(), 60.0);
        for record in calculator.records().iter().filter(|record| record.record_id() != 2) {
            assert_eq!(record.incentive_amount(), 0.0);
        }
    }

    #[test]
    fn record_percent_ignores_bad_input() {
        let mut calculator = mixed();
        calculator.apply_record_percent(1, "10");
        let before = calculator.records().to_vec();

        assert_eq!(calculator.apply_record_percent(1, "ten"), RecordUpdate::Ignored);
        assert_eq!(calculator.apply_record_percent(1, ""), RecordUpdate::Ignored);
        assert_eq!(calculator.apply_record_percent(1, "250"), RecordUpdate::Ignored);
        assert_eq!(calculator.apply_record_percent(99, "10"), RecordUpdate::Ignored);

        assert_eq!(calculator.records(), before.as_slice());
    }

    #[test]
    fn filter_all_keeps_insertion_order() {
        let calculator = mixed();

        assert_eq!(ids(&calculator.filter(StatusFilter::All)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn filter_by_status_is_stable() {
        let calculator = mixed();

        assert_eq!(ids(&calculator.filter(StatusFilter::Only(PaymentStatus::Paid))), vec![1, 4]);
        assert_eq!(ids(&calculator.filter(StatusFilter::Only(PaymentStatus::Partial))), vec![2, 5]);
        assert_eq!(ids(&calculator.filter(StatusFilter::Only(PaymentStatus::Pending))), vec![3]);
    }

    #[test]
    fn totals_over_empty_set_are_just_the_salary() {
        let calculator = IncentiveCalculator::new(42000.0, Vec::new()).unwrap();

        let totals = calculator.totals(StatusFilter::All);

        assert_eq!(totals.total_treatment, 0.0);
        assert_eq!(totals.total_paid, 0.0);
        assert_eq!(totals.total_pending, 0.0);
        assert_eq!(totals.total_incentives, 0.0);
        assert_eq!(totals.grand_total, 42000.0);
    }

    #[test]
    fn uniform_ten_percent_over_all_records() {
        let mut calculator = calculator();

        calculator.apply_uniform_percent_str("10").unwrap();

        let incentives: Vec<f64> = calculator.records().iter().map(|record| record.incentive_amount()).collect();
        assert_eq!(incentives, vec![100.0, 50.0]);

        let totals = calculator.totals(StatusFilter::All);
        assert_eq!(totals.total_treatment, 1500.0);
        assert_eq!(totals.total_paid, 1500.0);
        assert_eq!(totals.total_pending, 0.0);
        assert_eq!(totals.total_incentives, 150.0);
        assert_eq!(totals.grand_total, 50150.0);
    }

    #[test]
    fn paid_only_totals_drop_pending_incentives() {
        let mut calculator = calculator();
        calculator.apply_uniform_percent_str("10").unwrap();

        let totals = calculator.totals(StatusFilter::Only(PaymentStatus::Paid));

        assert_eq!(totals.total_incentives, 100.0);
        assert_eq!(totals.grand_total, 50100.0);
    }

    #[test]
    fn grand_total_follows_the_status_filter() {
        let mut calculator = mixed();
        calculator.apply_uniform_percent_str("10").unwrap();

        let all = calculator.totals(StatusFilter::All);
        let paid = calculator.totals(StatusFilter::Only(PaymentStatus::Paid));
        let pending = calculator.totals(StatusFilter::Only(PaymentStatus::Pending));

        assert_eq!(all.total_incentives, 480.0);
        assert_eq!(all.grand_total, 30480.0);
        assert_eq!(paid.total_incentives, 350.0);
        assert_eq!(paid.grand_total, 30350.0);
        assert_eq!(pending.total_incentives, 0.0);
        assert_eq!(pending.grand_total, 30000.0);
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_salary() {
        let duplicate = IncentiveCalculator::new(
            1000.0,
            vec![record(1, PaymentStatus::Paid, 10.0, 0.0), record(1, PaymentStatus::Paid, 20.0, 0.0)],
        );
        assert!(matches!(duplicate, Err(ClinicError::DuplicateRecord(1))));

        assert!(matches!(IncentiveCalculator::new(-1.0, Vec::new()), Err(ClinicError::InvalidSalary(_))));
        assert!(matches!(IncentiveCalculator::new(f64::INFINITY, Vec::new()), Err(ClinicError::InvalidSalary(_))));
    }
}
