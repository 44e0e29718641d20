use regex::Regex;

use crate::lexicon::CampusLexicon;

/// Normalizes candidate campus names.
///
/// Steps: trim, drop decorative marks, trim, strip one trailing qualifier,
/// collapse `<X>主校区<Y>` into `<X>校区<Y>`, trim. The output is a fixed
/// point: normalizing it again returns it unchanged.
#[derive(Debug, Clone)]
pub struct NamePostProcessor {
    decorative_marks: Vec<char>,
    qualifiers: Vec<String>,
    main_campus: Regex,
    main_campus_replacement: String,
}

impl NamePostProcessor {
    /// Builds a post-processor from the lexicon.
    #[must_use]
    pub fn new(lexicon: &CampusLexicon) -> Self {
        let pattern = format!("(.+){}", regex::escape(&lexicon.main_campus_word));
        let main_campus = Regex::new(&pattern).expect("escaped literal pattern compiles");
        Self {
            decorative_marks: lexicon.decorative_marks.clone(),
            qualifiers: lexicon.strippable_qualifiers.clone(),
            main_campus,
            main_campus_replacement: format!("${{1}}{}", lexicon.canonical_suffix.trim()),
        }
    }

    /// Normalizes `raw`. Returns `None` when nothing is left.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|ch| !self.decorative_marks.contains(ch))
            .collect();
        let stripped = self.strip_qualifier(cleaned.trim());
        let collapsed = self.collapse_main_campus(stripped);
        let result = collapsed.trim();
        (!result.is_empty()).then(|| result.to_string())
    }

    /// Returns true when `text` ends with a strippable qualifier.
    #[must_use]
    pub fn ends_with_qualifier(&self, text: &str) -> bool {
        self.qualifiers.iter().any(|q| text.ends_with(q.as_str()))
    }

    /// Removes the first listed qualifier ending `text`, unless what is left
    /// would itself end with a qualifier; stacked qualifiers stay intact.
    fn strip_qualifier<'a>(&self, text: &'a str) -> &'a str {
        let Some(rest) = self
            .qualifiers
            .iter()
            .find_map(|q| text.strip_suffix(q.as_str()))
        else {
            return text;
        };
        if self.ends_with_qualifier(rest.trim_end()) {
            text
        } else {
            rest
        }
    }

    fn collapse_main_campus(&self, text: &str) -> String {
        let mut current = text.to_string();
        while self.main_campus.is_match(&current) {
            current = self
                .main_campus
                .replacen(&current, 1, self.main_campus_replacement.as_str())
                .into_owned();
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zh() -> NamePostProcessor {
        NamePostProcessor::new(&CampusLexicon::zh_cn())
    }

    #[test]
    fn strips_marks_and_a_single_qualifier() {
        let post = zh();
        assert_eq!(post.normalize(" 南湖-校区 ").as_deref(), Some("南湖校区"));
        assert_eq!(post.normalize("仙林校区东区").as_deref(), Some("仙林校区"));
        assert_eq!(post.normalize("紫金港二期").as_deref(), Some("紫金港"));
        assert_eq!(post.normalize("东区"), None);
        assert_eq!(post.normalize("  & - "), None);
    }

    #[test]
    fn stacked_qualifiers_are_left_alone() {
        let post = zh();
        assert_eq!(post.normalize("新校区东区一期").as_deref(), Some("新校区东区一期"));
    }

    #[test]
    fn collapses_main_campus_wording() {
        let post = zh();
        assert_eq!(post.normalize("长安主校区").as_deref(), Some("长安校区"));
        assert_eq!(post.normalize("本部主校区北门").as_deref(), Some("本部校区北门"));
        assert_eq!(post.normalize("主校区").as_deref(), Some("主校区"));
        assert_eq!(post.normalize("长安主校区西区").as_deref(), Some("长安校区"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let post = zh();
        let samples = [
            "南湖校区",
            " 南湖-校区 ",
            "东区",
            "仙林校区 东区",
            "东区东区",
            "东区 - 一期",
            "A主主校区",
            "A主校区主校区",
            "主校区东区",
            "紫金港 -",
            "九期十期",
            "中区&",
            "",
            "  ",
        ];
        for sample in samples {
            let once = post.normalize(sample);
            let twice = once.as_deref().and_then(|name| post.normalize(name));
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn english_lexicon_collapses_main_campus() {
        let post = NamePostProcessor::new(&CampusLexicon::en());
        assert_eq!(post.normalize("North Main Campus").as_deref(), Some("North Campus"));
        assert_eq!(post.normalize("Lakeside Phase 2").as_deref(), Some("Lakeside"));
    }
}
