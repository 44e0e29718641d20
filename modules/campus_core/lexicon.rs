use serde::{Deserialize, Serialize};

/// Selects one of the bundled lexicons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LexiconKind {
    /// Mainland Chinese place titles (production vocabulary).
    #[default]
    ZhCn,
    /// English titles, used for fixtures and documentation examples.
    En,
}

/// Word lists the parser consults. Order matters for `strippable_qualifiers`:
/// the first list entry that ends a name is the one considered for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampusLexicon {
    /// Endings that make a string a campus qualifier.
    pub valid_suffixes: Vec<String>,
    /// Substrings that disqualify a string ("affiliated", "hospital").
    pub exclusion_markers: Vec<String>,
    /// Trailing directional-area and phase words, tried in order.
    pub strippable_qualifiers: Vec<String>,
    /// Remainders that mean "this is the main campus".
    pub main_campus_markers: Vec<String>,
    /// Word collapsed to `canonical_suffix` when preceded by other text.
    pub main_campus_word: String,
    /// Suffix appended to location-derived names.
    pub canonical_suffix: String,
    /// Characters removed outright during normalization.
    pub decorative_marks: Vec<char>,
}

impl CampusLexicon {
    /// Returns the lexicon for `kind`.
    #[must_use]
    pub fn for_kind(kind: LexiconKind) -> Self {
        match kind {
            LexiconKind::ZhCn => Self::zh_cn(),
            LexiconKind::En => Self::en(),
        }
    }

    /// Mainland Chinese vocabulary.
    #[must_use]
    pub fn zh_cn() -> Self {
        let mut qualifiers = words(&["西区", "东区", "北区", "南区", "中区"]);
        qualifiers.extend(words(&[
            "一期", "二期", "三期", "四期", "五期", "六期", "七期", "八期", "九期", "十期",
        ]));
        Self {
            valid_suffixes: words(&["校区", "园区", "院区", "校园", "学校", "分校", "院"]),
            exclusion_markers: words(&["附属", "医院"]),
            strippable_qualifiers: qualifiers,
            main_campus_markers: words(&["主校区", "校本部"]),
            main_campus_word: "主校区".into(),
            canonical_suffix: "校区".into(),
            decorative_marks: vec!['-', '&'],
        }
    }

    /// English vocabulary.
    #[must_use]
    pub fn en() -> Self {
        let mut qualifiers = words(&[
            "West Area",
            "East Area",
            "North Area",
            "South Area",
            "Central Area",
        ]);
        qualifiers.extend((1..=10).map(|phase| format!("Phase {phase}")));
        Self {
            valid_suffixes: words(&["Campus", "Park", "School", "Branch", "College"]),
            exclusion_markers: words(&["Affiliated", "Hospital"]),
            strippable_qualifiers: qualifiers,
            main_campus_markers: words(&["Main Campus", "Headquarters Campus"]),
            main_campus_word: "Main Campus".into(),
            canonical_suffix: " Campus".into(),
            decorative_marks: vec!['-', '&'],
        }
    }
}

impl Default for CampusLexicon {
    fn default() -> Self {
        Self::zh_cn()
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zh_qualifiers_keep_direction_before_phase() {
        let lexicon = CampusLexicon::zh_cn();
        assert_eq!(lexicon.strippable_qualifiers.len(), 15);
        assert_eq!(lexicon.strippable_qualifiers[0], "西区");
        assert_eq!(lexicon.strippable_qualifiers[14], "十期");
    }

    #[test]
    fn kind_parses_from_config_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            lexicon: LexiconKind,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"lexicon":"zh-cn"}"#).unwrap();
        assert_eq!(parsed.lexicon, LexiconKind::ZhCn);
        assert_eq!(CampusLexicon::for_kind(LexiconKind::En).canonical_suffix, " Campus");
    }
}
