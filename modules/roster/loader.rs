use std::{fs, path::Path};

use campus_core::Institution;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::{
    error::RosterError,
    settings::{InputSettings, RosterField},
};

/// One roster entry after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRow {
    /// Identifier, integral ids without a trailing `.0`.
    pub id: String,
    /// Cleaned name.
    pub name: String,
    /// Supervising authority.
    pub affiliation: Option<String>,
    /// Education level.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl RosterRow {
    /// Institution record with no campuses and no supplementary data.
    #[must_use]
    pub fn to_institution(&self) -> Institution {
        Institution::new(self.id.clone(), self.name.clone())
            .with_profile(self.affiliation.clone(), self.kind.clone())
    }
}

/// Loaded roster.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Rows in file order.
    pub rows: Vec<RosterRow>,
    /// 1-based line of the detected header.
    pub header_line: usize,
    /// Rows dropped for a missing id or name.
    pub skipped: usize,
}

/// Strips a leading `民办` and every `市` not preceded by `城` or `都`.
#[must_use]
pub fn clean_name(raw: &str) -> String {
    let name = raw.trim();
    let name = name.strip_prefix("民办").unwrap_or(name);
    let mut cleaned = String::with_capacity(name.len());
    let mut previous = None;
    for ch in name.chars() {
        if ch != '市' || matches!(previous, Some('城' | '都')) {
            cleaned.push(ch);
        }
        previous = Some(ch);
    }
    cleaned
}

/// Renders spreadsheet-style numeric ids (`10001.0`) as integers; other
/// values pass through trimmed.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(integral) = raw.strip_suffix(".0") {
        if !integral.is_empty() && integral.chars().all(|ch| ch.is_ascii_digit()) {
            return integral.to_string();
        }
    }
    raw.to_string()
}

/// Reads the roster CSV at `path`.
///
/// The header is the first row with a cell containing
/// `settings.header_marker`; rows above it are ignored. Rows lacking an id
/// or whose cleaned name is empty are skipped and counted.
///
/// # Errors
///
/// I/O and CSV failures, a missing header row, or a mapped column absent
/// from the header.
pub fn load_roster(path: &Path, settings: &InputSettings) -> Result<Roster, RosterError> {
    let text = fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| RosterError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let header_idx = records
        .iter()
        .position(|record| {
            record
                .iter()
                .any(|cell| cell.contains(settings.header_marker.as_str()))
        })
        .ok_or_else(|| RosterError::HeaderNotFound {
            path: path.to_path_buf(),
            marker: settings.header_marker.clone(),
        })?;
    let columns = ColumnIndex::resolve(&records[header_idx], settings, path)?;

    let mut roster = Roster {
        header_line: header_idx + 1,
        ..Roster::default()
    };
    for record in &records[header_idx + 1..] {
        match columns.row(record) {
            Some(row) => roster.rows.push(row),
            None => roster.skipped += 1,
        }
    }
    Ok(roster)
}

#[derive(Debug, Default)]
struct ColumnIndex {
    id: Option<usize>,
    name: Option<usize>,
    affiliation: Option<usize>,
    kind: Option<usize>,
}

impl ColumnIndex {
    fn resolve(header: &StringRecord, settings: &InputSettings, path: &Path) -> Result<Self, RosterError> {
        let mut index = Self::default();
        for (source, field) in &settings.columns {
            let position = header
                .iter()
                .position(|cell| cell.trim() == source.as_str())
                .ok_or_else(|| RosterError::MissingColumn {
                    path: path.to_path_buf(),
                    column: source.clone(),
                })?;
            let slot = match field {
                RosterField::Id => &mut index.id,
                RosterField::Name => &mut index.name,
                RosterField::Affiliation => &mut index.affiliation,
                RosterField::Type => &mut index.kind,
            };
            *slot = Some(position);
        }
        for (slot, label) in [(index.id, "id"), (index.name, "name")] {
            if slot.is_none() {
                return Err(RosterError::MissingColumn {
                    path: path.to_path_buf(),
                    column: label.to_string(),
                });
            }
        }
        Ok(index)
    }

    fn row(&self, record: &StringRecord) -> Option<RosterRow> {
        let cell = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        let id = cell(self.id).map(|id| normalize_id(&id))?;
        let name = cell(self.name).map(|name| clean_name(&name))?;
        if name.is_empty() {
            return None;
        }
        Some(RosterRow {
            id,
            name,
            affiliation: cell(self.affiliation),
            kind: cell(self.kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ROSTER: &str = "\u{feff}全国普通高等学校名单,,,,\n\
序号,学校名称,学校标识码,主管部门,所在地,办学层次\n\
1,北京大学,4111010001.0,教育部,北京市,本科\n\
2,民办上海市建桥学院,4131012587,上海市教委,上海市,本科\n\
3,,4111010002,教育部,北京市,本科\n\
4,京都市立学院,,教育部,北京市,本科\n\
5,城市学院,4111099999,北京市,北京市,\n";

    #[test]
    fn names_lose_private_prefix_and_city_suffix() {
        assert_eq!(clean_name("民办上海市建桥学院"), "上海建桥学院");
        assert_eq!(clean_name("北京城市学院"), "北京城市学院");
        assert_eq!(clean_name("杭州市第一学院"), "杭州第一学院");
        assert_eq!(clean_name("成都市大学"), "成都市大学");
        assert_eq!(clean_name("首都市场学院"), "首都市场学院");
        assert_eq!(clean_name(" 民办 "), "");
    }

    #[test]
    fn ids_drop_float_suffix() {
        assert_eq!(normalize_id("10001.0"), "10001");
        assert_eq!(normalize_id(" 4111010001 "), "4111010001");
        assert_eq!(normalize_id("A1.0"), "A1.0");
        assert_eq!(normalize_id(".0"), ".0");
    }

    #[test]
    fn loads_rows_below_detected_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        fs::write(&path, ROSTER).unwrap();
        let roster = load_roster(&path, &InputSettings::default()).unwrap();
        assert_eq!(roster.header_line, 2);
        assert_eq!(roster.skipped, 2);
        assert_eq!(roster.rows.len(), 3);
        assert_eq!(
            roster.rows[0],
            RosterRow {
                id: "4111010001".into(),
                name: "北京大学".into(),
                affiliation: Some("教育部".into()),
                kind: Some("本科".into()),
            }
        );
        assert_eq!(roster.rows[1].name, "上海建桥学院");
        assert_eq!(roster.rows[2].kind, None);
        let institution = roster.rows[0].to_institution();
        assert_eq!(institution.kind.as_deref(), Some("本科"));
    }

    #[test]
    fn missing_header_and_columns_are_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(matches!(
            load_roster(&path, &InputSettings::default()),
            Err(RosterError::HeaderNotFound { .. })
        ));
        fs::write(&path, "学校名称,学校标识码\n北京大学,1\n").unwrap();
        match load_roster(&path, &InputSettings::default()) {
            Err(RosterError::MissingColumn { column, .. }) => assert_eq!(column, "主管部门"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
