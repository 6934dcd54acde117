use super::site::{SITE_COUNT, SiteLabel};
use serde::Serialize;
use std::ops::Range;

/// One trajectory snapshot: a timestamp plus one occupancy label per site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// Simulation time of this snapshot, in the unit the log reports (ps).
    pub time: f64,
    /// Labels for S0..S5, in site order.
    pub sites: [SiteLabel; SITE_COUNT],
}

impl Frame {
    /// Concatenates the labels of a contiguous site range into a pattern string,
    /// e.g. `1..5` over `WK0KKW` gives `"K0KK"`.
    pub fn pattern(&self, sites: Range<usize>) -> String {
        self.sites[sites].iter().map(SiteLabel::as_char).collect()
    }
}

/// The per-frame occupancy record of one run, in chronological frame order.
///
/// Constructed once by the parser and never mutated; every derived statistic
/// reads from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateTable {
    frames: Vec<Frame>,
}

impl StateTable {
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The labels of one site across all frames, in frame order.
    pub fn site_column(&self, site: usize) -> Vec<SiteLabel> {
        self.frames.iter().map(|f| f.sites[site]).collect()
    }

    /// All six per-site label columns, index-aligned with the frames.
    pub fn site_columns(&self) -> [Vec<SiteLabel>; SITE_COUNT] {
        std::array::from_fn(|site| self.site_column(site))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f64, code: &str) -> Frame {
        let mut sites = [SiteLabel::Empty; SITE_COUNT];
        for (slot, c) in sites.iter_mut().zip(code.chars()) {
            *slot = SiteLabel::from_char(c).unwrap();
        }
        Frame { time, sites }
    }

    #[test]
    fn pattern_extracts_inner_and_full_spans() {
        let f = frame(0.0, "WK0KKW");
        assert_eq!(f.pattern(1..5), "K0KK");
        assert_eq!(f.pattern(0..6), "WK0KKW");
    }

    #[test]
    fn site_columns_are_frame_aligned() {
        let table = StateTable::from_frames(vec![frame(0.0, "WK0KKW"), frame(20.0, "WKK0KW")]);
        let columns = table.site_columns();
        assert_eq!(columns.len(), SITE_COUNT);
        assert_eq!(columns[2], vec![SiteLabel::Empty, SiteLabel::Ion]);
        assert_eq!(columns[3], vec![SiteLabel::Ion, SiteLabel::Empty]);
        assert_eq!(table.site_column(0), vec![SiteLabel::Water, SiteLabel::Water]);
    }

    #[test]
    fn len_matches_frame_count() {
        let table = StateTable::from_frames(vec![frame(0.0, "WK0KKW")]);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert!(StateTable::default().is_empty());
    }
}
