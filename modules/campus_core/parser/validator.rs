use crate::{lexicon::CampusLexicon, model::RawPlace};

/// Classifies normalized candidates.
#[derive(Debug, Clone)]
pub struct NameValidator {
    valid_suffixes: Vec<String>,
    exclusion_markers: Vec<String>,
}

impl NameValidator {
    /// Builds a validator from the lexicon word lists.
    #[must_use]
    pub fn new(lexicon: &CampusLexicon) -> Self {
        Self {
            valid_suffixes: lexicon.valid_suffixes.clone(),
            exclusion_markers: lexicon.exclusion_markers.clone(),
        }
    }

    /// True when `name` is non-empty, carries no exclusion marker and ends
    /// with a whitelisted suffix.
    #[must_use]
    pub fn is_valid_campus_name(&self, name: &str) -> bool {
        if name.is_empty() || self.is_excluded(name) {
            return false;
        }
        self.valid_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// True when `name` contains an exclusion marker.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusion_markers
            .iter()
            .any(|marker| name.contains(marker.as_str()))
    }

    /// True when `text` is non-empty and appears inside the place's
    /// province, city or district.
    #[must_use]
    pub fn is_location_substring(&self, text: &str, place: &RawPlace) -> bool {
        !text.is_empty() && place.regions().any(|region| region.contains(text))
    }
}
