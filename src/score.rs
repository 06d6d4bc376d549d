use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{RawValue, ScoringScheme, Severity};

static GRADED_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)(\++|-+)?$").expect("graded score pattern is valid")
});

/// Maps one raw cell to a severity under `scheme`. Anything that cannot be
/// read collapses to `Severity::Missing`, never to zero.
pub fn normalize(raw: &RawValue, scheme: ScoringScheme) -> Severity {
    match raw {
        RawValue::Missing => Severity::Missing,
        RawValue::Number(value) => normalize_number(*value, scheme),
        RawValue::Text(text) => match scheme {
            ScoringScheme::GradedWithModifiers => parse_graded(text),
            ScoringScheme::BinaryNormalAbnormal => parse_binary(text),
            ScoringScheme::ContinuousMeasurement => parse_continuous(text),
        },
    }
}

fn normalize_number(value: f64, scheme: ScoringScheme) -> Severity {
    if !value.is_finite() {
        return Severity::Missing;
    }
    match scheme {
        ScoringScheme::GradedWithModifiers | ScoringScheme::ContinuousMeasurement => {
            Severity::Value(value)
        }
        ScoringScheme::BinaryNormalAbnormal => Severity::Missing,
    }
}

fn parse_graded(text: &str) -> Severity {
    let Some(captures) = GRADED_SCORE.captures(text.trim()) else {
        return Severity::Missing;
    };
    let Ok(base) = captures[1].parse::<f64>() else {
        return Severity::Missing;
    };
    let modifier = captures.get(2).map_or(0.0, |run| {
        let count = run.as_str().len() as f64;
        if run.as_str().starts_with('+') {
            count
        } else {
            -count
        }
    });
    Severity::Value(base + modifier)
}

fn parse_binary(text: &str) -> Severity {
    let token = text.trim();
    if token.eq_ignore_ascii_case("normal") {
        Severity::Value(0.0)
    } else if token.eq_ignore_ascii_case("abnormal") {
        Severity::Value(1.0)
    } else {
        Severity::Missing
    }
}

fn parse_continuous(text: &str) -> Severity {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Severity::Value(value),
        _ => Severity::Missing,
    }
}
