//! Place-title parsing.
//!
//! A title is first matched against the institution name, then the
//! remainder is scanned from the back for an anchor segment. Everything up to
//! and including the anchor becomes the campus name.

/// Bracket-insensitive institution prefix matching.
pub mod prefix;
/// Trim/strip/collapse normalization.
pub mod postprocess;
/// Campus-qualifier and location checks.
pub mod validator;
/// Ordered anchor rules.
pub mod rules;
/// Segment splitting and anchor scan.
pub mod extractor;

pub use extractor::{split_segments, CampusNameExtractor, Segment};
pub use postprocess::NamePostProcessor;
pub use prefix::{match_prefix, PrefixMatch};
pub use rules::{AnchorContext, AnchorRule, ANCHOR_RULES};
pub use validator::NameValidator;

use crate::{lexicon::CampusLexicon, model::RawPlace};

/// Outcome of parsing one place title for one institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampusName {
    /// The place is a named campus.
    Accepted(String),
    /// The place is the institution itself (main campus); nothing to attach.
    NoCampus,
    /// The title does not describe a campus of this institution.
    Rejected,
}

impl CampusName {
    /// Returns the accepted name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Accepted(name) => Some(name),
            Self::NoCampus | Self::Rejected => None,
        }
    }

    /// Maps an optional normalized name to `Accepted` or `NoCampus`.
    #[must_use]
    pub fn from_normalized(name: Option<String>) -> Self {
        name.map_or(Self::NoCampus, Self::Accepted)
    }
}

/// Parser bundling a lexicon with the components built from it.
#[derive(Debug, Clone)]
pub struct CampusParser {
    lexicon: CampusLexicon,
    extractor: CampusNameExtractor,
}

impl CampusParser {
    /// Creates a parser for the given lexicon.
    #[must_use]
    pub fn new(lexicon: CampusLexicon) -> Self {
        let extractor = CampusNameExtractor::new(&lexicon);
        Self { lexicon, extractor }
    }

    /// Returns the lexicon in use.
    #[must_use]
    pub const fn lexicon(&self) -> &CampusLexicon {
        &self.lexicon
    }

    /// Parses `place.title` against `institution_name`.
    ///
    /// A place without a title is `Rejected`.
    #[must_use]
    pub fn parse(&self, place: &RawPlace, institution_name: &str) -> CampusName {
        let Some(title) = place.title_text() else {
            return CampusName::Rejected;
        };
        match match_prefix(title, institution_name, &self.lexicon) {
            PrefixMatch::Rejected => CampusName::Rejected,
            PrefixMatch::NoCampus => CampusName::NoCampus,
            PrefixMatch::Remainder(remainder) => self.extractor.extract(remainder, place),
        }
    }
}

impl Default for CampusParser {
    fn default() -> Self {
        Self::new(CampusLexicon::default())
    }
}
