use serde::Deserialize;

use crate::aggregate;
use crate::error::{FobError, Result};
use crate::models::{Episode, Peak, ScoringScheme, TimePoint, Worksheet};
use crate::modes::AnalysisMode;

/// Inclusive normal band; aggregates outside it are abnormal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn validate(self, name: &str) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(FobError::Config(format!(
                "{name} band bounds must be finite, got [{}, {}]",
                self.low, self.high
            )));
        }
        if self.low > self.high {
            return Err(FobError::Config(format!(
                "{name} band low {} is above high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Distance outside the band, zero inside it.
    pub fn distance(self, value: f64) -> f64 {
        if value < self.low {
            self.low - value
        } else if value > self.high {
            value - self.high
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub general_behavior: Band,
    pub body_temperature: Band,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            general_behavior: Band { low: 2.0, high: 6.0 },
            body_temperature: Band {
                low: 36.0,
                high: 38.0,
            },
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        self.general_behavior.validate("general_behavior")?;
        self.body_temperature.validate("body_temperature")
    }

    /// Normal band for `mode`. Binary modes are normal only at 0% abnormal.
    /// Body weight has no episode concept and yields `None`.
    pub fn band(&self, mode: AnalysisMode) -> Option<Band> {
        match mode {
            AnalysisMode::GeneralBehavior => Some(self.general_behavior),
            AnalysisMode::BodyTemperature => Some(self.body_temperature),
            AnalysisMode::AutonomicSensorimotor
            | AnalysisMode::ReflexCapabilities
            | AnalysisMode::ConvulsiveExcitability => Some(Band {
                low: 0.0,
                high: 0.0,
            }),
            AnalysisMode::BodyWeight => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Quiescent,
    InEpisode {
        onset: f64,
        peak: f64,
        peak_distance: f64,
    },
}

/// Scans one (group, observation) series for abnormal episodes.
///
/// Undefined points are skipped: they neither open, extend nor close an
/// episode. An episode still open when the series ends is closed at the last
/// time-point present. Peak is the aggregate farthest from the normal band;
/// the earliest wins a tie.
pub fn extract_episodes(
    group: &str,
    observation: &str,
    mode: AnalysisMode,
    series: &[(TimePoint, Option<f64>)],
    thresholds: &Thresholds,
) -> Vec<Episode> {
    let Some(band) = thresholds.band(mode) else {
        return Vec::new();
    };

    let mut ordered: Vec<(f64, Option<f64>)> = series
        .iter()
        .filter_map(|(time, value)| time.minutes().map(|minutes| (minutes, *value)))
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let make_peak = |value: f64| match mode.scheme() {
        ScoringScheme::BinaryNormalAbnormal => Peak::Percentage(value),
        _ => Peak::Severity(value),
    };
    let close = |onset: f64, offset: f64, peak: f64| Episode {
        group: group.to_string(),
        observation: observation.to_string(),
        onset,
        offset,
        duration: offset - onset,
        peak: make_peak(peak),
    };

    let mut episodes = Vec::new();
    let mut state = ScanState::Quiescent;

    for &(time, value) in &ordered {
        let Some(value) = value else {
            continue;
        };
        let distance = band.distance(value);

        match &mut state {
            ScanState::Quiescent => {
                if distance > 0.0 {
                    tracing::debug!(group, observation, onset = time, "episode opened");
                    state = ScanState::InEpisode {
                        onset: time,
                        peak: value,
                        peak_distance: distance,
                    };
                }
            }
            ScanState::InEpisode {
                onset,
                peak,
                peak_distance,
            } => {
                if distance > 0.0 {
                    if distance > *peak_distance {
                        *peak = value;
                        *peak_distance = distance;
                    }
                } else {
                    let (onset, peak) = (*onset, *peak);
                    tracing::debug!(group, observation, onset, offset = time, "episode closed");
                    episodes.push(close(onset, time, peak));
                    state = ScanState::Quiescent;
                }
            }
        }
    }

    if let (ScanState::InEpisode { onset, peak, .. }, Some(&(last, _))) = (state, ordered.last()) {
        tracing::debug!(group, observation, onset, offset = last, "episode open at end of series");
        episodes.push(close(onset, last, peak));
    }

    episodes
}

/// All episodes for one group's worksheet, flattened in observation order.
pub fn extract_group_episodes(
    group: &str,
    worksheet: &Worksheet,
    thresholds: &Thresholds,
) -> Vec<Episode> {
    let mode = worksheet.mode();
    if thresholds.band(mode).is_none() {
        return Vec::new();
    }

    let points = aggregate::aggregate_worksheet(worksheet);
    let mut episodes = Vec::new();
    for observation in aggregate::observations(&points) {
        let series = aggregate::series(&points, observation);
        episodes.extend(extract_episodes(group, observation, mode, &series, thresholds));
    }

    tracing::info!(group, mode = %mode, count = episodes.len(), "episodes extracted");
    episodes
}
