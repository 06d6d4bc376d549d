use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{FobError, Result};
use crate::models::{Group, Project, RawValue, TimePoint, Worksheet, WorksheetRow};
use crate::modes::AnalysisMode;

const TIME_COLUMN: &str = "time";
const OBSERVATION_COLUMN: &str = "observation";

/// Reads a worksheet in the `time,observation,<animal...>` layout. Every
/// column after the first two is one animal, in order. When `animal_count`
/// is `None` the number of animal columns is used.
pub fn read_worksheet<R: io::Read>(
    mode: AnalysisMode,
    reader: R,
    animal_count: Option<usize>,
) -> Result<Worksheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let header_ok = headers.len() >= 2
        && headers[0].eq_ignore_ascii_case(TIME_COLUMN)
        && headers[1].eq_ignore_ascii_case(OBSERVATION_COLUMN);
    if !header_ok {
        return Err(FobError::Worksheet(format!(
            "expected header starting with '{TIME_COLUMN},{OBSERVATION_COLUMN}', found '{}'",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let animal_columns = headers.len() - 2;
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if record.len() < 2 {
            return Err(FobError::Worksheet(format!(
                "row {} has {} columns, expected at least 2",
                index + 2,
                record.len()
            )));
        }

        rows.push(WorksheetRow {
            time: TimePoint::parse(mode, &record[0])?,
            observation: record[1].to_string(),
            values: record.iter().skip(2).map(RawValue::from_cell).collect(),
        });
    }

    let animal_count = animal_count.unwrap_or(animal_columns);
    if animal_count > animal_columns {
        tracing::warn!(
            mode = %mode,
            animal_count,
            animal_columns,
            "worksheet has fewer animal columns than the cohort size"
        );
    }
    tracing::debug!(mode = %mode, rows = rows.len(), animal_count, "worksheet read");

    Worksheet::new(mode, mode.scheme(), animal_count, rows)
}

pub fn load_worksheet(
    mode: AnalysisMode,
    path: &Path,
    animal_count: Option<usize>,
) -> Result<Worksheet> {
    let file = std::fs::File::open(path)?;
    read_worksheet(mode, file, animal_count)
}

/// Writes a blank worksheet for `mode`: one row per time-point and
/// observation. Body weight always uses `before`/`after` and ignores `times`.
pub fn write_template<W: io::Write>(
    writer: W,
    mode: AnalysisMode,
    animal_count: usize,
    times: &[f64],
) -> Result<usize> {
    let time_points: Vec<TimePoint> = if mode.uses_before_after() {
        vec![TimePoint::Before, TimePoint::After]
    } else {
        let mut points = Vec::with_capacity(times.len());
        for time in times {
            if !time.is_finite() || *time < 0.0 {
                return Err(FobError::InvalidTimePoint {
                    mode,
                    value: time.to_string(),
                });
            }
            points.push(TimePoint::Minutes(*time));
        }
        points.sort();
        points.dedup();
        points
    };

    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec![TIME_COLUMN.to_string(), OBSERVATION_COLUMN.to_string()];
    header.extend((1..=animal_count).map(|animal| format!("animal_{animal}")));
    writer.write_record(&header)?;

    let mut written = 0usize;
    for time in &time_points {
        for observation in mode.observations() {
            let mut record = vec![time.to_string(), observation.to_string()];
            record.extend(std::iter::repeat(String::new()).take(animal_count));
            writer.write_record(&record)?;
            written += 1;
        }
    }
    writer.flush()?;

    Ok(written)
}

#[derive(Deserialize)]
struct ProjectManifest {
    id: Option<Uuid>,
    name: String,
    animal_count: usize,
    groups: Vec<GroupManifest>,
}

#[derive(Deserialize)]
struct GroupManifest {
    name: String,
    #[serde(default)]
    worksheets: BTreeMap<AnalysisMode, PathBuf>,
}

/// Loads a project manifest and every worksheet it references. Worksheet
/// paths are resolved relative to the manifest's directory.
pub fn load_project(manifest_path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(manifest_path)?;
    let manifest: ProjectManifest = serde_json::from_str(&content)?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut groups = Vec::with_capacity(manifest.groups.len());
    for group in manifest.groups {
        let mut worksheets = BTreeMap::new();
        for (mode, relative) in group.worksheets {
            let path = base.join(&relative);
            let worksheet = load_worksheet(mode, &path, Some(manifest.animal_count))
                .map_err(|err| {
                    FobError::Worksheet(format!(
                        "group '{}', {}: {} ({err})",
                        group.name,
                        mode,
                        path.display()
                    ))
                })?;
            worksheets.insert(mode, worksheet);
        }
        groups.push(Group {
            name: group.name,
            worksheets,
        });
    }

    let project = Project {
        id: manifest.id.unwrap_or_else(Uuid::new_v4),
        name: manifest.name,
        animal_count: manifest.animal_count,
        groups,
    };
    tracing::info!(
        project = %project.name,
        id = %project.id,
        groups = project.groups.len(),
        "project loaded"
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoringScheme;

    #[test]
    fn reads_rows_and_blank_cells() {
        let csv = "time,observation,animal_1,animal_2,animal_3\n\
                   0,Grooming,4,4+,\n\
                   15,grooming,8--,,junk\n";
        let sheet = read_worksheet(AnalysisMode::GeneralBehavior, csv.as_bytes(), None).unwrap();

        assert_eq!(sheet.scheme(), ScoringScheme::GradedWithModifiers);
        assert_eq!(sheet.animal_count(), 3);
        assert_eq!(sheet.rows().len(), 2);
        assert_eq!(sheet.rows()[0].observation, "grooming");
        assert_eq!(sheet.rows()[0].values[2], RawValue::Missing);
        assert_eq!(sheet.rows()[1].time, TimePoint::Minutes(15.0));
        assert_eq!(
            sheet.rows()[1].values[2],
            RawValue::Text("junk".to_string())
        );
    }

    #[test]
    fn rejects_bad_header() {
        let csv = "minute,observation,a1\n0,grooming,4\n";
        let err = read_worksheet(AnalysisMode::GeneralBehavior, csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, FobError::Worksheet(_)));
    }

    #[test]
    fn rejects_unknown_observation() {
        let csv = "time,observation,a1\n0,tremor,4\n";
        let err = read_worksheet(AnalysisMode::GeneralBehavior, csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, FobError::UnknownObservation { .. }));
    }

    #[test]
    fn rejects_time_on_wrong_axis() {
        let csv = "time,observation,a1\n15,weight,250\n";
        let err = read_worksheet(AnalysisMode::BodyWeight, csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, FobError::InvalidTimePoint { .. }));
    }

    #[test]
    fn rejects_repeated_time_and_observation() {
        let csv = "time,observation,a1\n\
                   0,temperature,37.0\n\
                   15,temperature,39.0\n\
                   15,temperature,37.0\n\
                   30,temperature,37.0\n";
        let err = read_worksheet(AnalysisMode::BodyTemperature, csv.as_bytes(), None).unwrap_err();
        match err {
            FobError::DuplicateCell { observation, time } => {
                assert_eq!(observation, "temperature");
                assert_eq!(time, "15");
            }
            other => panic!("expected duplicate cell error, got {other}"),
        }
    }

    #[test]
    fn numeric_cells_read_as_numbers() {
        let csv = "time,observation,a1,a2\n0,tremor,1,Abnormal\n";
        let sheet =
            read_worksheet(AnalysisMode::ConvulsiveExcitability, csv.as_bytes(), None).unwrap();
        assert_eq!(sheet.rows()[0].values[0], RawValue::Number(1.0));

        let points = crate::aggregate::aggregate_worksheet(&sheet);
        assert_eq!(points[0].contributing, 1);
        assert_eq!(points[0].value, Some(100.0));
    }

    #[test]
    fn template_reads_back_as_all_missing() {
        let mut buffer = Vec::new();
        let written = write_template(
            &mut buffer,
            AnalysisMode::ReflexCapabilities,
            4,
            &[30.0, 0.0, 30.0],
        )
        .unwrap();
        assert_eq!(written, 2 * AnalysisMode::ReflexCapabilities.observations().len());

        let sheet =
            read_worksheet(AnalysisMode::ReflexCapabilities, buffer.as_slice(), None).unwrap();
        assert_eq!(sheet.animal_count(), 4);
        assert_eq!(sheet.rows().len(), written);
        assert!(sheet
            .rows()
            .iter()
            .all(|row| row.values.iter().all(|value| *value == RawValue::Missing)));
    }

    #[test]
    fn template_rejects_negative_minutes() {
        let err = write_template(Vec::new(), AnalysisMode::GeneralBehavior, 1, &[-15.0]).unwrap_err();
        assert!(matches!(err, FobError::InvalidTimePoint { .. }));
    }

    #[test]
    fn weight_template_uses_before_after() {
        let mut buffer = Vec::new();
        write_template(&mut buffer, AnalysisMode::BodyWeight, 2, &[0.0, 15.0]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "time,observation,animal_1,animal_2\nbefore,weight,,\nafter,weight,,\n"
        );
    }

    #[test]
    fn loads_project_manifest_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("vehicle_temp.csv"),
            "time,observation,a1,a2\n0,temperature,37.0,37.4\n30,temperature,38.6,39.0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("project.json"),
            r#"{
                "name": "Cohort A",
                "animal_count": 2,
                "groups": [
                    {"name": "Vehicle", "worksheets": {"body_temperature": "vehicle_temp.csv"}},
                    {"name": "Empty"}
                ]
            }"#,
        )
        .unwrap();

        let project = load_project(&dir.path().join("project.json")).unwrap();
        assert_eq!(project.name, "Cohort A");
        assert_eq!(project.groups.len(), 2);
        let sheet = &project.groups[0].worksheets[&AnalysisMode::BodyTemperature];
        assert_eq!(sheet.animal_count(), 2);
        assert_eq!(sheet.rows().len(), 2);
        assert!(project.groups[1].worksheets.is_empty());
    }

    #[test]
    fn missing_worksheet_names_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("project.json");
        std::fs::write(
            &manifest,
            r#"{"name": "P", "animal_count": 1,
                "groups": [{"name": "Low", "worksheets": {"general_behavior": "nope.csv"}}]}"#,
        )
        .unwrap();

        let err = load_project(&manifest).unwrap_err();
        assert!(err.to_string().contains("group 'Low'"));
    }
}
