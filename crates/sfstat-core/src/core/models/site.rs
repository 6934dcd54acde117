use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Number of binding sites in the selectivity filter, ordered S0 (extracellular) to S5.
pub const SITE_COUNT: usize = 6;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("'{0}' is not a valid site label (expected 'K', 'W' or '0')")]
pub struct InvalidSiteLabel(pub char);

/// Occupant of one binding site in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SiteLabel {
    /// A potassium ion (`K`).
    Ion,
    /// Unoccupied (`0`).
    Empty,
    /// A water molecule (`W`).
    Water,
}

impl SiteLabel {
    /// All labels in the canonical reporting order `[K, 0, W]`.
    pub const ALL: [SiteLabel; 3] = [SiteLabel::Ion, SiteLabel::Empty, SiteLabel::Water];

    pub fn from_char(c: char) -> Result<Self, InvalidSiteLabel> {
        match c {
            'K' => Ok(SiteLabel::Ion),
            '0' => Ok(SiteLabel::Empty),
            'W' => Ok(SiteLabel::Water),
            other => Err(InvalidSiteLabel(other)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            SiteLabel::Ion => 'K',
            SiteLabel::Empty => '0',
            SiteLabel::Water => 'W',
        }
    }
}

impl fmt::Display for SiteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
