use std::cmp::Ordering;
use std::fmt;

/// `len(institution name) / len(place title)`, both counted in chars.
///
/// Comparison cross-multiplies the lengths, so `1/2 == 2/4` and no float
/// rounding is involved.
#[derive(Debug, Clone, Copy)]
pub struct SpecificityRatio {
    name_len: usize,
    title_len: usize,
}

impl SpecificityRatio {
    /// Ratio from raw lengths.
    #[must_use]
    pub const fn new(name_len: usize, title_len: usize) -> Self {
        Self {
            name_len,
            title_len,
        }
    }

    /// Ratio for an institution name against a place title.
    #[must_use]
    pub fn of(name: &str, title: &str) -> Self {
        Self::new(name.chars().count(), title.chars().count())
    }

    /// Numerator.
    #[must_use]
    pub const fn name_len(self) -> usize {
        self.name_len
    }

    /// Denominator.
    #[must_use]
    pub const fn title_len(self) -> usize {
        self.title_len
    }

    /// Lossy value for logs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        if self.title_len == 0 {
            return 0.0;
        }
        self.name_len as f64 / self.title_len as f64
    }
}

impl Ord for SpecificityRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.name_len as u128 * other.title_len as u128;
        let rhs = other.name_len as u128 * self.title_len as u128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for SpecificityRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SpecificityRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SpecificityRatio {}

impl fmt::Display for SpecificityRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name_len, self.title_len)
    }
}
