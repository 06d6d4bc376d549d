use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::episode::{self, Thresholds};
use crate::models::{
    AggregatePoint, Episode, Group, Project, ScoringScheme, TimePoint, WeightChange, Worksheet,
};
use crate::modes::AnalysisMode;

/// Before/after change per observation of a body weight worksheet. Other
/// modes have no before/after axis and yield nothing.
pub fn weight_changes(worksheet: &Worksheet) -> Vec<WeightChange> {
    if !worksheet.mode().uses_before_after() {
        return Vec::new();
    }

    let points = aggregate::aggregate_worksheet(worksheet);
    aggregate::observations(&points)
        .into_iter()
        .map(|observation| {
            let series = aggregate::series(&points, observation);
            let at = |wanted: TimePoint| {
                series
                    .iter()
                    .find(|(time, _)| *time == wanted)
                    .and_then(|(_, value)| *value)
            };
            let before = at(TimePoint::Before);
            let after = at(TimePoint::After);
            let delta = before.zip(after).map(|(before, after)| after - before);
            let percent_change = before
                .zip(delta)
                .filter(|(before, _)| *before != 0.0)
                .map(|(before, delta)| delta / before * 100.0);

            WeightChange {
                observation: observation.to_string(),
                before,
                after,
                delta,
                percent_change,
            }
        })
        .collect()
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}"))
}

fn fmt_aggregate(mode: AnalysisMode, point: &AggregatePoint) -> String {
    match (mode.scheme(), point.value) {
        (_, None) => "n/a".to_string(),
        (ScoringScheme::BinaryNormalAbnormal, Some(value)) => format!(
            "{value:.0}% ({}/{})",
            point.abnormal_count, point.contributing
        ),
        (_, Some(value)) => format!("{value:.2}"),
    }
}

pub fn write_aggregates(output: &mut String, mode: AnalysisMode, points: &[AggregatePoint]) {
    if points.is_empty() {
        let _ = writeln!(output, "No scores recorded.");
        return;
    }

    let _ = writeln!(output, "| Observation | Time | Aggregate | Animals scored |");
    let _ = writeln!(output, "|---|---|---|---|");
    for point in points {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            point.observation,
            point.time,
            fmt_aggregate(mode, point),
            point.contributing
        );
    }
}

pub fn write_episodes(output: &mut String, episodes: &[Episode]) {
    if episodes.is_empty() {
        let _ = writeln!(output, "No abnormal episodes.");
        return;
    }

    let _ = writeln!(output, "| Observation | Onset | Offset | Duration | Peak |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for episode in episodes {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            episode.observation, episode.onset, episode.offset, episode.duration, episode.peak
        );
    }
}

pub fn write_weight_changes(output: &mut String, changes: &[WeightChange]) {
    if changes.is_empty() {
        let _ = writeln!(output, "No weights recorded.");
        return;
    }

    let _ = writeln!(output, "| Observation | Before | After | Change | Change % |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for change in changes {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            change.observation,
            fmt_value(change.before),
            fmt_value(change.after),
            fmt_value(change.delta),
            fmt_value(change.percent_change)
        );
    }
}

fn write_group(output: &mut String, group: &Group, thresholds: &Thresholds) {
    let _ = writeln!(output, "## Group: {}", group.name);

    if group.worksheets.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No worksheets recorded for this group.");
        let _ = writeln!(output);
        return;
    }

    for (mode, worksheet) in &group.worksheets {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {mode}");
        let _ = writeln!(output);
        write_aggregates(output, *mode, &aggregate::aggregate_worksheet(worksheet));
        let _ = writeln!(output);

        if mode.uses_before_after() {
            let _ = writeln!(output, "#### Weight change");
            let _ = writeln!(output);
            write_weight_changes(output, &weight_changes(worksheet));
        } else {
            let _ = writeln!(output, "#### Abnormal episodes");
            let _ = writeln!(output);
            let episodes = episode::extract_group_episodes(&group.name, worksheet, thresholds);
            write_episodes(output, &episodes);
        }
    }
    let _ = writeln!(output);
}

pub fn build_report(
    project: &Project,
    thresholds: &Thresholds,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# FOB Report: {}", project.name);
    let _ = writeln!(
        output,
        "Project {} ({} animals per group), generated {}",
        project.id,
        project.animal_count,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);

    if project.groups.is_empty() {
        let _ = writeln!(output, "No groups defined for this project.");
        return output;
    }

    for group in &project.groups {
        write_group(&mut output, group, thresholds);
    }

    output
}
