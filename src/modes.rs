use std::fmt;

use serde::Deserialize;

use crate::error::FobError;
use crate::models::ScoringScheme;

/// The six fixed FOB analysis modes. Each mode owns an ordered observation
/// list and is bound to exactly one scoring scheme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    GeneralBehavior,
    AutonomicSensorimotor,
    ReflexCapabilities,
    ConvulsiveExcitability,
    BodyTemperature,
    BodyWeight,
}

const GENERAL_BEHAVIOR: &[&str] = &[
    "awareness",
    "alertness",
    "motor activity",
    "reactivity",
    "touch response",
    "startle response",
    "grooming",
    "gait",
    "posture",
    "limb tone",
    "abdominal tone",
];

const AUTONOMIC_SENSORIMOTOR: &[&str] = &[
    "piloerection",
    "skin color",
    "respiration",
    "salivation",
    "lacrimation",
    "pupil size",
    "ptosis",
    "exophthalmos",
    "diarrhea",
    "urination",
    "pain response",
];

const REFLEX_CAPABILITIES: &[&str] = &[
    "pinna reflex",
    "corneal reflex",
    "righting reflex",
    "grip strength",
    "visual placing",
    "tail pinch",
];

const CONVULSIVE_EXCITABILITY: &[&str] = &[
    "spontaneous convulsion",
    "tremor",
    "straub tail",
    "stereotypy",
    "jumping",
    "head twitch",
    "writhing",
    "vocalization",
];

const BODY_TEMPERATURE: &[&str] = &["temperature"];

const BODY_WEIGHT: &[&str] = &["weight"];

impl AnalysisMode {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::GeneralBehavior => "General Behavior",
            AnalysisMode::AutonomicSensorimotor => "Autonomic and Sensorimotor Functions",
            AnalysisMode::ReflexCapabilities => "Reflex Capabilities",
            AnalysisMode::ConvulsiveExcitability => "Convulsive Behaviors and Excitability",
            AnalysisMode::BodyTemperature => "Body Temperature",
            AnalysisMode::BodyWeight => "Body Weight",
        }
    }

    pub fn scheme(self) -> ScoringScheme {
        match self {
            AnalysisMode::GeneralBehavior => ScoringScheme::GradedWithModifiers,
            AnalysisMode::AutonomicSensorimotor
            | AnalysisMode::ReflexCapabilities
            | AnalysisMode::ConvulsiveExcitability => ScoringScheme::BinaryNormalAbnormal,
            AnalysisMode::BodyTemperature | AnalysisMode::BodyWeight => {
                ScoringScheme::ContinuousMeasurement
            }
        }
    }

    pub fn observations(self) -> &'static [&'static str] {
        match self {
            AnalysisMode::GeneralBehavior => GENERAL_BEHAVIOR,
            AnalysisMode::AutonomicSensorimotor => AUTONOMIC_SENSORIMOTOR,
            AnalysisMode::ReflexCapabilities => REFLEX_CAPABILITIES,
            AnalysisMode::ConvulsiveExcitability => CONVULSIVE_EXCITABILITY,
            AnalysisMode::BodyTemperature => BODY_TEMPERATURE,
            AnalysisMode::BodyWeight => BODY_WEIGHT,
        }
    }

    /// Body weight is recorded once before and once after dosing instead of
    /// on a minutes axis.
    pub fn uses_before_after(self) -> bool {
        self == AnalysisMode::BodyWeight
    }

    /// Position of `name` in this mode's observation list, matched
    /// case-insensitively.
    pub fn observation_index(self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.observations()
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
    }

    /// Canonical spelling of an observation name for this mode.
    pub fn canonical_observation(self, name: &str) -> Result<&'static str, FobError> {
        self.observation_index(name)
            .map(|index| self.observations()[index])
            .ok_or_else(|| FobError::UnknownObservation {
                mode: self,
                observation: name.to_string(),
            })
    }

    /// Rejects any scheme other than the one this mode is bound to.
    pub fn check_scheme(self, scheme: ScoringScheme) -> Result<(), FobError> {
        if self.scheme() == scheme {
            Ok(())
        } else {
            Err(FobError::UnsupportedScheme { mode: self, scheme })
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
