use crate::model::RawPlace;

use super::validator::NameValidator;

/// What a rule sees for one segment.
#[derive(Debug, Clone, Copy)]
pub struct AnchorContext<'a> {
    /// De-parenthesized segment content, untouched.
    pub raw: &'a str,
    /// Post-processed content; `None` when normalization erased it.
    pub normalized: Option<&'a str>,
    /// Place the title belongs to.
    pub place: &'a RawPlace,
    /// Validator built from the active lexicon.
    pub validator: &'a NameValidator,
}

/// Anchor rules, tried in [`ANCHOR_RULES`] order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRule {
    /// The segment is a valid campus qualifier on its own.
    CampusQualifier,
    /// The segment names part of the place's own province/city/district.
    LocationDisambiguator,
    /// The segment held only marks or a directional/phase qualifier.
    ErasedQualifier,
}

/// Evaluation order.
pub const ANCHOR_RULES: [AnchorRule; 3] = [
    AnchorRule::CampusQualifier,
    AnchorRule::LocationDisambiguator,
    AnchorRule::ErasedQualifier,
];

impl AnchorRule {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CampusQualifier => "campus-qualifier",
            Self::LocationDisambiguator => "location-disambiguator",
            Self::ErasedQualifier => "erased-qualifier",
        }
    }

    /// Predicate for this rule.
    #[must_use]
    pub fn matches(self, ctx: &AnchorContext<'_>) -> bool {
        match self {
            Self::CampusQualifier => ctx
                .normalized
                .is_some_and(|name| ctx.validator.is_valid_campus_name(name)),
            Self::LocationDisambiguator => ctx
                .normalized
                .is_some_and(|name| ctx.validator.is_location_substring(name, ctx.place)),
            Self::ErasedQualifier => ctx.normalized.is_none() && !ctx.raw.trim().is_empty(),
        }
    }

    /// True when the candidate built from this anchor may need the
    /// canonical suffix appended.
    #[must_use]
    pub const fn completes_with_suffix(self) -> bool {
        matches!(self, Self::LocationDisambiguator)
    }

    /// First rule matching `ctx`.
    #[must_use]
    pub fn find(ctx: &AnchorContext<'_>) -> Option<Self> {
        ANCHOR_RULES.into_iter().find(|rule| rule.matches(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::CampusLexicon;

    fn ctx<'a>(
        raw: &'a str,
        normalized: Option<&'a str>,
        place: &'a RawPlace,
        validator: &'a NameValidator,
    ) -> AnchorContext<'a> {
        AnchorContext {
            raw,
            normalized,
            place,
            validator,
        }
    }

    #[test]
    fn each_rule_in_isolation() {
        let validator = NameValidator::new(&CampusLexicon::zh_cn());
        let place = RawPlace {
            district: Some("昌平区".into()),
            ..RawPlace::default()
        };
        let qualifier = ctx("昌平校区", Some("昌平校区"), &place, &validator);
        assert!(AnchorRule::CampusQualifier.matches(&qualifier));
        assert!(!AnchorRule::ErasedQualifier.matches(&qualifier));

        let location = ctx("昌平", Some("昌平"), &place, &validator);
        assert!(!AnchorRule::CampusQualifier.matches(&location));
        assert!(AnchorRule::LocationDisambiguator.matches(&location));

        let erased = ctx("东区", None, &place, &validator);
        assert!(AnchorRule::ErasedQualifier.matches(&erased));
        assert!(!AnchorRule::LocationDisambiguator.matches(&erased));

        let blank = ctx("  ", None, &place, &validator);
        assert_eq!(AnchorRule::find(&blank), None);
    }

    #[test]
    fn qualifier_wins_over_location() {
        let validator = NameValidator::new(&CampusLexicon::zh_cn());
        let place = RawPlace {
            city: Some("珠海校区".into()),
            ..RawPlace::default()
        };
        let both = ctx("珠海校区", Some("珠海校区"), &place, &validator);
        assert_eq!(AnchorRule::find(&both), Some(AnchorRule::CampusQualifier));
        assert!(!AnchorRule::CampusQualifier.completes_with_suffix());
        assert_eq!(AnchorRule::LocationDisambiguator.label(), "location-disambiguator");
    }
}
