use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

/// Roster column a source header maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterField {
    /// Institution identifier.
    Id,
    /// Institution name.
    Name,
    /// Supervising authority.
    Affiliation,
    /// Education level.
    Type,
}

/// `[input]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct InputSettings {
    /// Roster CSV.
    #[serde(default = "default_roster")]
    pub roster: PathBuf,
    /// Supplementary JSON; merging is skipped when unset.
    #[serde(default = "default_supplementary")]
    pub supplementary: Option<PathBuf>,
    /// Text identifying the header row.
    #[serde(default = "default_header_marker")]
    pub header_marker: String,
    /// Source header to roster field.
    #[serde(default = "default_columns")]
    pub columns: IndexMap<String, RosterField>,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            supplementary: default_supplementary(),
            header_marker: default_header_marker(),
            columns: default_columns(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// Directory receiving every report and the run log.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Institutions with campuses.
    #[serde(default = "default_universities_file")]
    pub universities_file: String,
    /// Institutions without campuses.
    #[serde(default = "default_no_campuses_file")]
    pub no_campuses_file: String,
    /// Rejected places.
    #[serde(default = "default_rejected_file")]
    pub rejected_file: String,
    /// Institutions lacking supplementary details.
    #[serde(default = "default_no_details_file")]
    pub no_details_file: String,
    /// Run log file name prefix.
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            universities_file: default_universities_file(),
            no_campuses_file: default_no_campuses_file(),
            rejected_file: default_rejected_file(),
            no_details_file: default_no_details_file(),
            log_prefix: default_log_prefix(),
        }
    }
}

fn default_roster() -> PathBuf {
    PathBuf::from("univ_moe.csv")
}

#[allow(clippy::unnecessary_wraps)]
fn default_supplementary() -> Option<PathBuf> {
    Some(PathBuf::from("univ_supp.json"))
}

fn default_header_marker() -> String {
    "学校名称".into()
}

fn default_columns() -> IndexMap<String, RosterField> {
    [
        ("学校标识码", RosterField::Id),
        ("学校名称", RosterField::Name),
        ("主管部门", RosterField::Affiliation),
        ("办学层次", RosterField::Type),
    ]
    .into_iter()
    .map(|(header, field)| (header.to_string(), field))
    .collect()
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_universities_file() -> String {
    "universities.json".into()
}

fn default_no_campuses_file() -> String {
    "universities_with_no_campuses.csv".into()
}

fn default_rejected_file() -> String {
    "rejected_pois.csv".into()
}

fn default_no_details_file() -> String {
    "universities_without_details.csv".into()
}

fn default_log_prefix() -> String {
    "run_log".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_override_replaces_the_mapping() {
        let input: InputSettings = toml::from_str(
            "roster = \"list.csv\"\n[columns]\n\"代码\" = \"id\"\n\"名称\" = \"name\"\n",
        )
        .unwrap();
        assert_eq!(input.roster, PathBuf::from("list.csv"));
        assert_eq!(input.columns.len(), 2);
        assert_eq!(input.columns["名称"], RosterField::Name);
        assert_eq!(input.header_marker, "学校名称");
    }

    #[test]
    fn output_defaults_match_report_names() {
        let output = OutputSettings::default();
        assert_eq!(output.universities_file, "universities.json");
        assert_eq!(output.log_prefix, "run_log");
    }
}
