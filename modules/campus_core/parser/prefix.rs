use crate::lexicon::CampusLexicon;

/// Result of matching a title against an institution name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatch<'a> {
    /// Title does not start with the name.
    Rejected,
    /// Title is the name itself, or the remainder marks the main campus.
    NoCampus,
    /// Trimmed text following the name.
    Remainder(&'a str),
}

/// Folds full-width parentheses onto their ASCII forms.
#[must_use]
pub const fn fold_bracket(ch: char) -> char {
    match ch {
        '（' => '(',
        '）' => ')',
        other => other,
    }
}

/// Matches `name` as a prefix of `title`, treating `(`/`（` and `)`/`）` as
/// the same character.
#[must_use]
pub fn match_prefix<'a>(title: &'a str, name: &str, lexicon: &CampusLexicon) -> PrefixMatch<'a> {
    let mut title_chars = title.char_indices();
    let mut consumed = 0;
    for expected in name.chars() {
        match title_chars.next() {
            Some((idx, actual)) if fold_bracket(actual) == fold_bracket(expected) => {
                consumed = idx + actual.len_utf8();
            }
            _ => return PrefixMatch::Rejected,
        }
    }
    if consumed == title.len() {
        return PrefixMatch::NoCampus;
    }
    let remainder = title[consumed..].trim();
    if remainder.is_empty()
        || lexicon
            .main_campus_markers
            .iter()
            .any(|marker| marker == remainder)
    {
        return PrefixMatch::NoCampus;
    }
    PrefixMatch::Remainder(remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_match_across_widths() {
        let lexicon = CampusLexicon::zh_cn();
        assert_eq!(
            match_prefix("中国石油大学(北京)克拉玛依校区", "中国石油大学（北京）", &lexicon),
            PrefixMatch::Remainder("克拉玛依校区")
        );
        assert_eq!(
            match_prefix("中国石油大学（北京）", "中国石油大学(北京)", &lexicon),
            PrefixMatch::NoCampus
        );
    }

    #[test]
    fn mismatch_and_short_titles_reject() {
        let lexicon = CampusLexicon::zh_cn();
        assert_eq!(
            match_prefix("北京大学", "北京师范大学", &lexicon),
            PrefixMatch::Rejected
        );
        assert_eq!(match_prefix("北京", "北京大学", &lexicon), PrefixMatch::Rejected);
    }

    #[test]
    fn whitespace_and_markers_mean_main_campus() {
        let lexicon = CampusLexicon::zh_cn();
        assert_eq!(match_prefix("复旦大学  ", "复旦大学", &lexicon), PrefixMatch::NoCampus);
        assert_eq!(
            match_prefix("复旦大学 主校区", "复旦大学", &lexicon),
            PrefixMatch::NoCampus
        );
        assert_eq!(
            match_prefix("复旦大学江湾校区", "复旦大学", &lexicon),
            PrefixMatch::Remainder("江湾校区")
        );
    }
}
