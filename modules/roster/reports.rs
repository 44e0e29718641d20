use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use campus_core::{Institution, RawPlace};
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::{loader::RosterRow, settings::OutputSettings};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Files written by [`ReportWriter::write_all`] and their row counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Institutions-with-campuses JSON; always written.
    pub universities: PathBuf,
    /// Institutions in the JSON.
    pub with_campuses: usize,
    /// No-campuses CSV, when any.
    pub no_campuses: Option<PathBuf>,
    /// Rows in the no-campuses CSV.
    pub without_campuses: usize,
    /// Rejected-places CSV, when any.
    pub rejected: Option<PathBuf>,
    /// Rows in the rejected CSV.
    pub rejected_count: usize,
    /// No-details CSV, when any.
    pub no_details: Option<PathBuf>,
    /// Rows in the no-details CSV.
    pub no_details_count: usize,
}

/// Writes the run reports into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    settings: OutputSettings,
}

impl ReportWriter {
    /// Writer for `settings.dir`.
    #[must_use]
    pub const fn new(settings: OutputSettings) -> Self {
        Self { settings }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    /// Writes every report. The JSON is always produced; a CSV is skipped
    /// when it would have no rows.
    ///
    /// # Errors
    ///
    /// Directory creation, file creation or serialization failures.
    pub fn write_all(
        &self,
        institutions: &[Institution],
        rejected: &[RawPlace],
        without_details: &[RosterRow],
    ) -> Result<ReportSummary> {
        fs::create_dir_all(self.dir())
            .with_context(|| format!("creating output dir {}", self.dir().display()))?;
        let (with, without): (Vec<_>, Vec<_>) = institutions
            .iter()
            .partition(|inst| !inst.campuses.is_empty());

        let mut summary = ReportSummary {
            universities: self.dir().join(&self.settings.universities_file),
            with_campuses: with.len(),
            without_campuses: without.len(),
            rejected_count: rejected.len(),
            no_details_count: without_details.len(),
            ..ReportSummary::default()
        };
        write_json(&summary.universities, &with)?;
        if !without.is_empty() {
            let path = self.dir().join(&self.settings.no_campuses_file);
            write_no_campuses(&path, &without)?;
            summary.no_campuses = Some(path);
        }
        if !rejected.is_empty() {
            let path = self.dir().join(&self.settings.rejected_file);
            write_rejected(&path, rejected)?;
            summary.rejected = Some(path);
        }
        if !without_details.is_empty() {
            let path = self.dir().join(&self.settings.no_details_file);
            write_rows(&path, without_details)?;
            summary.no_details = Some(path);
        }
        Ok(summary)
    }
}

/// Pretty JSON with four-space indentation; non-ASCII text is kept as is.
///
/// # Errors
///
/// File creation or serialization failures.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .with_context(|| format!("serializing {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))
}

fn bom_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut buffered = BufWriter::new(file);
    buffered
        .write_all(UTF8_BOM)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(csv::Writer::from_writer(buffered))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_no_campuses(path: &Path, institutions: &[&Institution]) -> Result<()> {
    let extra: IndexSet<&str> = institutions
        .iter()
        .flat_map(|inst| inst.supplementary.keys().map(String::as_str))
        .collect();
    let mut writer = bom_writer(path)?;
    let mut header = vec!["id", "name", "affiliation", "type"];
    header.extend(extra.iter().copied());
    writer.write_record(&header)?;
    for inst in institutions {
        let mut row = vec![
            inst.id.clone(),
            inst.name.clone(),
            inst.affiliation.clone().unwrap_or_default(),
            inst.kind.clone().unwrap_or_default(),
        ];
        row.extend(extra.iter().map(|key| cell(inst.supplementary.get(*key))));
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))
}

fn write_rejected(path: &Path, places: &[RawPlace]) -> Result<()> {
    let objects = places
        .iter()
        .map(|place| match serde_json::to_value(place) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(serde_json::Map::new()),
            Err(err) => Err(err),
        })
        .collect::<Result<Vec<_>, _>>()
        .context("serializing rejected places")?;
    let header: BTreeSet<&str> = objects
        .iter()
        .flat_map(|map| map.keys().map(String::as_str))
        .collect();
    let mut writer = bom_writer(path)?;
    writer.write_record(&header)?;
    for map in &objects {
        writer.write_record(header.iter().map(|key| cell(map.get(*key))))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))
}

fn write_rows(path: &Path, rows: &[RosterRow]) -> Result<()> {
    let mut writer = bom_writer(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::Campus;
    use serde_json::json;
    use tempfile::tempdir;

    fn writer(dir: &Path) -> ReportWriter {
        ReportWriter::new(OutputSettings {
            dir: dir.to_path_buf(),
            ..OutputSettings::default()
        })
    }

    fn institutions() -> Vec<Institution> {
        let place = RawPlace {
            id: Some("p1".into()),
            title: Some("北京大学(昌平校区)".into()),
            ..RawPlace::default()
        };
        let mut pku = Institution::new("1", "北京大学");
        pku.supplementary.insert("is985".into(), json!(true));
        pku.campuses.push(Campus::from_place("p1", "昌平校区", &place));
        let mut empty = Institution::new("2", "无名学院").with_profile(Some("教育部".into()), None);
        empty.supplementary.insert("is985".into(), Value::Null);
        vec![pku, empty]
    }

    #[test]
    fn writes_json_and_csvs_with_bom() {
        let dir = tempdir().unwrap();
        let rejected = vec![RawPlace {
            id: Some("r1".into()),
            title: Some("北京大学第三医院".into()),
            extra: [("category".to_string(), json!("医疗"))].into_iter().collect(),
            ..RawPlace::default()
        }];
        let missing = vec![RosterRow {
            id: "2".into(),
            name: "无名学院".into(),
            affiliation: Some("教育部".into()),
            kind: None,
        }];
        let summary = writer(dir.path())
            .write_all(&institutions(), &rejected, &missing)
            .unwrap();
        assert_eq!(summary.with_campuses, 1);
        assert_eq!(summary.without_campuses, 1);

        let json_text = fs::read_to_string(&summary.universities).unwrap();
        assert!(json_text.contains("\n    {"));
        assert!(json_text.contains("昌平校区"));
        let parsed: Value = serde_json::from_str(&json_text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);

        let no_campuses = fs::read(summary.no_campuses.unwrap()).unwrap();
        assert!(no_campuses.starts_with(UTF8_BOM));
        let text = String::from_utf8(no_campuses[3..].to_vec()).unwrap();
        assert_eq!(text, "id,name,affiliation,type,is985\n2,无名学院,教育部,,\n");

        let rejected_text = fs::read_to_string(summary.rejected.unwrap()).unwrap();
        let mut lines = rejected_text.trim_start_matches('\u{feff}').lines();
        assert_eq!(lines.next(), Some("category,id,title"));
        assert_eq!(lines.next(), Some("医疗,r1,北京大学第三医院"));

        let details = fs::read_to_string(summary.no_details.unwrap()).unwrap();
        assert!(details.starts_with("\u{feff}id,name,affiliation,type\n"));
    }

    #[test]
    fn empty_reports_are_skipped() {
        let dir = tempdir().unwrap();
        let summary = writer(dir.path()).write_all(&[], &[], &[]).unwrap();
        assert!(summary.no_campuses.is_none());
        assert!(summary.rejected.is_none());
        assert!(summary.no_details.is_none());
        assert_eq!(fs::read_to_string(&summary.universities).unwrap(), "[]\n");
        assert!(!dir.path().join("rejected_pois.csv").exists());
    }
}
