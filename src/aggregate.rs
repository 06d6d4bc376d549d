use crate::models::{AggregatePoint, RawValue, ScoringScheme, TimePoint, Worksheet, WorksheetRow};
use crate::score;

/// Reduced form of one cell before it is tied to a time-point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSummary {
    pub value: Option<f64>,
    pub contributing: usize,
    pub abnormal_count: usize,
}

/// Reduces the first `animal_count` values of one cell. Missing values are
/// dropped from both numerator and denominator.
pub fn aggregate_cell(
    values: &[RawValue],
    scheme: ScoringScheme,
    animal_count: usize,
) -> CellSummary {
    let severities: Vec<f64> = values
        .iter()
        .take(animal_count)
        .filter_map(|raw| score::normalize(raw, scheme).value())
        .collect();

    let contributing = severities.len();
    if contributing == 0 {
        return CellSummary {
            value: None,
            contributing,
            abnormal_count: 0,
        };
    }

    match scheme {
        ScoringScheme::BinaryNormalAbnormal => {
            let abnormal_count = severities.iter().filter(|value| **value == 1.0).count();
            CellSummary {
                value: Some(100.0 * abnormal_count as f64 / contributing as f64),
                contributing,
                abnormal_count,
            }
        }
        ScoringScheme::GradedWithModifiers | ScoringScheme::ContinuousMeasurement => {
            CellSummary {
                value: Some(severities.iter().sum::<f64>() / contributing as f64),
                contributing,
                abnormal_count: 0,
            }
        }
    }
}

fn aggregate_row(row: &WorksheetRow, scheme: ScoringScheme, animal_count: usize) -> AggregatePoint {
    let summary = aggregate_cell(&row.values, scheme, animal_count);
    AggregatePoint {
        time: row.time,
        observation: row.observation.clone(),
        value: summary.value,
        contributing: summary.contributing,
        abnormal_count: summary.abnormal_count,
    }
}

/// Aggregates every row of the worksheet, ordered by the mode's observation
/// order and then by ascending time.
pub fn aggregate_worksheet(worksheet: &Worksheet) -> Vec<AggregatePoint> {
    let mode = worksheet.mode();
    let mut points: Vec<AggregatePoint> = worksheet
        .rows()
        .iter()
        .map(|row| aggregate_row(row, worksheet.scheme(), worksheet.animal_count()))
        .collect();

    points.sort_by(|a, b| {
        mode.observation_index(&a.observation)
            .cmp(&mode.observation_index(&b.observation))
            .then(a.time.cmp(&b.time))
    });

    let undefined = points.iter().filter(|point| point.value.is_none()).count();
    if undefined > 0 {
        tracing::debug!(mode = %mode, undefined, "cells with no readable animal values");
    }

    points
}

/// One observation's time-ordered series out of `points`.
pub fn series(points: &[AggregatePoint], observation: &str) -> Vec<(TimePoint, Option<f64>)> {
    let mut series: Vec<(TimePoint, Option<f64>)> = points
        .iter()
        .filter(|point| point.observation == observation)
        .map(|point| (point.time, point.value))
        .collect();
    series.sort_by(|a, b| a.0.cmp(&b.0));
    series
}

/// Observations present in `points`, in first-seen order.
pub fn observations(points: &[AggregatePoint]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for point in points {
        if !names.contains(&point.observation.as_str()) {
            names.push(&point.observation);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::AnalysisMode;

    fn texts(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|value| RawValue::from_cell(value)).collect()
    }

    #[test]
    fn binary_percentage_counts_abnormal_animals() {
        let values = texts(&["Abnormal", "Normal", "normal", "abnormal", "", "", "", ""]);
        let summary = aggregate_cell(&values, ScoringScheme::BinaryNormalAbnormal, 8);
        assert_eq!(summary.contributing, 4);
        assert_eq!(summary.abnormal_count, 2);
        assert_eq!(summary.value, Some(50.0));
    }

    #[test]
    fn binary_two_of_eight_is_quarter() {
        let values = texts(&[
            "Abnormal", "Abnormal", "Normal", "Normal", "Normal", "Normal", "Normal", "Normal",
        ]);
        let summary = aggregate_cell(&values, ScoringScheme::BinaryNormalAbnormal, 8);
        assert_eq!(summary.value, Some(25.0));
        assert_eq!(summary.abnormal_count, 2);
    }

    #[test]
    fn mean_excludes_missing_values() {
        let values = texts(&["4", "8", "", "junk"]);
        let summary = aggregate_cell(&values, ScoringScheme::GradedWithModifiers, 4);
        assert_eq!(summary.contributing, 2);
        assert_eq!(summary.value, Some(6.0));
    }

    #[test]
    fn all_missing_is_undefined() {
        let values = texts(&["", "n/a", ""]);
        for scheme in [
            ScoringScheme::GradedWithModifiers,
            ScoringScheme::BinaryNormalAbnormal,
            ScoringScheme::ContinuousMeasurement,
        ] {
            let summary = aggregate_cell(&values, scheme, 3);
            assert_eq!(summary.value, None);
            assert_eq!(summary.contributing, 0);
        }
    }

    #[test]
    fn values_beyond_animal_count_are_ignored() {
        let values = texts(&["37.0", "38.0", "99.0"]);
        let summary = aggregate_cell(&values, ScoringScheme::ContinuousMeasurement, 2);
        assert_eq!(summary.value, Some(37.5));
    }

    #[test]
    fn worksheet_points_sorted_by_observation_then_time() {
        let rows = vec![
            WorksheetRow {
                time: TimePoint::Minutes(30.0),
                observation: "grooming".to_string(),
                values: texts(&["4"]),
            },
            WorksheetRow {
                time: TimePoint::Minutes(0.0),
                observation: "grooming".to_string(),
                values: texts(&["4+"]),
            },
            WorksheetRow {
                time: TimePoint::Minutes(0.0),
                observation: "awareness".to_string(),
                values: texts(&["8"]),
            },
        ];
        let sheet = Worksheet::new(
            AnalysisMode::GeneralBehavior,
            ScoringScheme::GradedWithModifiers,
            1,
            rows,
        )
        .unwrap();

        let points = aggregate_worksheet(&sheet);
        let order: Vec<(&str, TimePoint)> = points
            .iter()
            .map(|point| (point.observation.as_str(), point.time))
            .collect();
        assert_eq!(
            order,
            vec![
                ("awareness", TimePoint::Minutes(0.0)),
                ("grooming", TimePoint::Minutes(0.0)),
                ("grooming", TimePoint::Minutes(30.0)),
            ]
        );
        assert_eq!(observations(&points), vec!["awareness", "grooming"]);
        assert_eq!(
            series(&points, "grooming"),
            vec![
                (TimePoint::Minutes(0.0), Some(5.0)),
                (TimePoint::Minutes(30.0), Some(4.0))
            ]
        );
        assert_eq!(aggregate_worksheet(&sheet), points);
    }
}
