use crate::{lexicon::CampusLexicon, model::RawPlace};

use super::{
    postprocess::NamePostProcessor,
    prefix::fold_bracket,
    rules::{AnchorContext, AnchorRule},
    validator::NameValidator,
    CampusName,
};

/// One piece of a title remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Content with the surrounding brackets removed.
    pub content: &'a str,
    /// Whether the piece was a parenthesized group.
    pub bracketed: bool,
}

/// Splits `text` into plain runs and single-level bracket groups. Half- and
/// full-width brackets delimit groups interchangeably; an opening bracket
/// with no closing partner (or with nothing inside) stays plain text.
#[must_use]
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;
    while let Some(open) = text[cursor..].find(|ch| fold_bracket(ch) == '(') {
        let open = cursor + open;
        let inner_start = open + text[open..].chars().next().map_or(1, char::len_utf8);
        let close = text[inner_start..]
            .find(|ch| fold_bracket(ch) == ')')
            .map(|offset| inner_start + offset);
        match close {
            Some(close) if close > inner_start => {
                push_plain(&mut segments, &text[plain_start..open]);
                segments.push(Segment {
                    content: &text[inner_start..close],
                    bracketed: true,
                });
                cursor = close + text[close..].chars().next().map_or(1, char::len_utf8);
                plain_start = cursor;
            }
            _ => cursor = inner_start,
        }
    }
    push_plain(&mut segments, &text[plain_start..]);
    segments
}

fn push_plain<'a>(segments: &mut Vec<Segment<'a>>, content: &'a str) {
    if !content.is_empty() {
        segments.push(Segment {
            content,
            bracketed: false,
        });
    }
}

/// Finds the anchor segment in a remainder and builds the campus name.
#[derive(Debug, Clone)]
pub struct CampusNameExtractor {
    post: NamePostProcessor,
    validator: NameValidator,
    canonical_suffix: String,
}

impl CampusNameExtractor {
    /// Builds the extractor and its collaborators from the lexicon.
    #[must_use]
    pub fn new(lexicon: &CampusLexicon) -> Self {
        Self {
            post: NamePostProcessor::new(lexicon),
            validator: NameValidator::new(lexicon),
            canonical_suffix: lexicon.canonical_suffix.clone(),
        }
    }

    /// The post-processor in use.
    #[must_use]
    pub const fn post_processor(&self) -> &NamePostProcessor {
        &self.post
    }

    /// The validator in use.
    #[must_use]
    pub const fn validator(&self) -> &NameValidator {
        &self.validator
    }

    /// Scans `segments` from the back and returns the index of the first
    /// anchor with the rule that matched.
    #[must_use]
    pub fn find_anchor(
        &self,
        segments: &[Segment<'_>],
        place: &RawPlace,
    ) -> Option<(usize, AnchorRule)> {
        segments.iter().enumerate().rev().find_map(|(idx, segment)| {
            let normalized = self.post.normalize(segment.content);
            let ctx = AnchorContext {
                raw: segment.content,
                normalized: normalized.as_deref(),
                place,
                validator: &self.validator,
            };
            AnchorRule::find(&ctx).map(|rule| (idx, rule))
        })
    }

    /// Extracts the campus name from a prefix remainder.
    #[must_use]
    pub fn extract(&self, remainder: &str, place: &RawPlace) -> CampusName {
        let segments = split_segments(remainder);
        let Some((anchor, rule)) = self.find_anchor(&segments, place) else {
            return CampusName::Rejected;
        };
        let mut candidate: String = segments[..=anchor]
            .iter()
            .map(|segment| segment.content)
            .collect();
        let normalized = self.post.normalize(&candidate);
        if rule.completes_with_suffix() {
            if let Some(name) = normalized.as_deref() {
                if !self.validator.is_valid_campus_name(name) {
                    candidate.push_str(&self.canonical_suffix);
                    return CampusName::from_normalized(self.post.normalize(&candidate));
                }
            }
        }
        CampusName::from_normalized(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(content: &str, bracketed: bool) -> Segment<'_> {
        Segment { content, bracketed }
    }

    #[test]
    fn splits_mixed_width_groups() {
        assert_eq!(
            split_segments("深圳(研究生院)（南山）园"),
            vec![
                seg("深圳", false),
                seg("研究生院", true),
                seg("南山", true),
                seg("园", false),
            ]
        );
    }

    #[test]
    fn unmatched_and_empty_brackets_stay_plain() {
        assert_eq!(split_segments("()东区"), vec![seg("()东区", false)]);
        assert_eq!(split_segments("东区(北"), vec![seg("东区(北", false)]);
        assert_eq!(split_segments(""), Vec::<Segment<'_>>::new());
    }

    #[test]
    fn candidate_runs_up_to_the_last_anchor() {
        let extractor = CampusNameExtractor::new(&CampusLexicon::zh_cn());
        let place = RawPlace::default();
        assert_eq!(
            extractor.extract("深圳(研究生院)正门", &place),
            CampusName::Accepted("深圳研究生院".into())
        );
        assert_eq!(extractor.extract("食堂", &place), CampusName::Rejected);
    }

    #[test]
    fn location_anchor_gets_suffix_only_when_needed() {
        let extractor = CampusNameExtractor::new(&CampusLexicon::zh_cn());
        let place = RawPlace {
            city: Some("威海市".into()),
            ..RawPlace::default()
        };
        assert_eq!(
            extractor.extract("(威海)", &place),
            CampusName::Accepted("威海校区".into())
        );
        let segments = split_segments("(威海)");
        assert_eq!(
            extractor.find_anchor(&segments, &place),
            Some((0, AnchorRule::LocationDisambiguator))
        );
    }

    #[test]
    fn erased_segment_anchors_to_no_campus() {
        let extractor = CampusNameExtractor::new(&CampusLexicon::zh_cn());
        let place = RawPlace::default();
        assert_eq!(extractor.extract("(东区)", &place), CampusName::NoCampus);
        assert_eq!(
            extractor.extract("南湖校区(二期)", &place),
            CampusName::Accepted("南湖校区".into())
        );
    }
}
