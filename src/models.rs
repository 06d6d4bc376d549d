use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{FobError, Result};
use crate::modes::AnalysisMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringScheme {
    /// Base value such as `4` followed by an optional run of `+` or `-`.
    GradedWithModifiers,
    /// Literal `Normal` / `Abnormal`.
    BinaryNormalAbnormal,
    /// Physical measurement (°C, grams) used as-is.
    ContinuousMeasurement,
}

impl fmt::Display for ScoringScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringScheme::GradedWithModifiers => "graded",
            ScoringScheme::BinaryNormalAbnormal => "binary",
            ScoringScheme::ContinuousMeasurement => "continuous",
        };
        f.write_str(name)
    }
}

/// One animal's raw cell value as entered.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Blank text collapses to `Missing`; cells that read as a number become
    /// `Number`.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            RawValue::Missing
        } else if let Ok(number) = trimmed.parse::<f64>() {
            RawValue::Number(number)
        } else {
            RawValue::Text(cell.to_string())
        }
    }
}

/// Normalized value of one raw cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Value(f64),
    Missing,
}

impl Severity {
    pub fn value(self) -> Option<f64> {
        match self {
            Severity::Value(value) => Some(value),
            Severity::Missing => None,
        }
    }
}

/// A point on a worksheet's time axis.
#[derive(Debug, Clone, Copy)]
pub enum TimePoint {
    Minutes(f64),
    Before,
    After,
}

impl TimePoint {
    pub fn parse(mode: AnalysisMode, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || FobError::InvalidTimePoint {
            mode,
            value: text.to_string(),
        };

        if mode.uses_before_after() {
            return match trimmed.to_ascii_lowercase().as_str() {
                "before" => Ok(TimePoint::Before),
                "after" => Ok(TimePoint::After),
                _ => Err(invalid()),
            };
        }

        let minutes: f64 = trimmed.parse().map_err(|_| invalid())?;
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(invalid());
        }
        Ok(TimePoint::Minutes(minutes))
    }

    pub fn minutes(self) -> Option<f64> {
        match self {
            TimePoint::Minutes(minutes) => Some(minutes),
            TimePoint::Before | TimePoint::After => None,
        }
    }

    fn rank(self) -> u8 {
        match self {
            TimePoint::Minutes(_) => 0,
            TimePoint::Before => 1,
            TimePoint::After => 2,
        }
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TimePoint::Minutes(a), TimePoint::Minutes(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimePoint {}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePoint::Minutes(minutes) => write!(f, "{minutes}"),
            TimePoint::Before => f.write_str("before"),
            TimePoint::After => f.write_str("after"),
        }
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TimePoint::Minutes(minutes) => serializer.serialize_f64(*minutes),
            other => serializer.collect_str(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetRow {
    pub time: TimePoint,
    pub observation: String,
    /// Indexed by animal.
    pub values: Vec<RawValue>,
}

/// Immutable snapshot of one group's scores for one analysis mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    mode: AnalysisMode,
    scheme: ScoringScheme,
    animal_count: usize,
    rows: Vec<WorksheetRow>,
}

impl Worksheet {
    /// Validates the snapshot against the mode: the scheme must be the one the
    /// mode is bound to, every observation must belong to the mode and every
    /// time-point must sit on the mode's time axis. Each (time-point,
    /// observation) cell may appear only once.
    pub fn new(
        mode: AnalysisMode,
        scheme: ScoringScheme,
        animal_count: usize,
        rows: Vec<WorksheetRow>,
    ) -> Result<Self> {
        mode.check_scheme(scheme)?;

        let mut seen: BTreeSet<(TimePoint, &'static str)> = BTreeSet::new();
        let mut validated = Vec::with_capacity(rows.len());
        for mut row in rows {
            let observation = mode.canonical_observation(&row.observation)?;
            if row.time.minutes().is_some() == mode.uses_before_after() {
                return Err(FobError::InvalidTimePoint {
                    mode,
                    value: row.time.to_string(),
                });
            }
            if !seen.insert((row.time, observation)) {
                return Err(FobError::DuplicateCell {
                    observation: observation.to_string(),
                    time: row.time.to_string(),
                });
            }
            row.observation = observation.to_string();
            validated.push(row);
        }

        Ok(Self {
            mode,
            scheme,
            animal_count,
            rows: validated,
        })
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn scheme(&self) -> ScoringScheme {
        self.scheme
    }

    pub fn animal_count(&self) -> usize {
        self.animal_count
    }

    pub fn rows(&self) -> &[WorksheetRow] {
        &self.rows
    }
}

/// Summary of all animals at one (time-point, observation) cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatePoint {
    pub time: TimePoint,
    pub observation: String,
    /// Mean severity or abnormal percentage; `None` when every animal value
    /// is missing.
    pub value: Option<f64>,
    pub contributing: usize,
    /// Only counted under the binary scheme.
    pub abnormal_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Peak {
    Severity(f64),
    Percentage(f64),
}

impl fmt::Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peak::Severity(value) => write!(f, "{value}"),
            Peak::Percentage(value) => write!(f, "{value:.0}%"),
        }
    }
}

impl Serialize for Peak {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Peak::Severity(value) => serializer.serialize_f64(*value),
            Peak::Percentage(_) => serializer.collect_str(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub group: String,
    pub observation: String,
    pub onset: f64,
    pub offset: f64,
    pub duration: f64,
    pub peak: Peak,
}

/// Before/after body-weight summary for one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightChange {
    pub observation: String,
    pub before: Option<f64>,
    pub after: Option<f64>,
    pub delta: Option<f64>,
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub worksheets: BTreeMap<AnalysisMode, Worksheet>,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub animal_count: usize,
    pub groups: Vec<Group>,
}
