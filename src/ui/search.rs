use compact_str::CompactString;

use crate::model::group::group_of;
use crate::model::Instrument;
use crate::ui::navigation::View;

/// Which leaves are emphasized while a search is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight {
    /// Lower-cased, trimmed search term; `None` when no search is active
    needle: Option<String>,
}

impl Highlight {
    pub fn none() -> Self {
        Self::default()
    }

    /// Highlight for `term`. Blank terms produce no highlight.
    pub fn for_term(term: &str) -> Self {
        let needle = normalize(term);
        Self {
            needle: (!needle.is_empty()).then_some(needle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.needle.is_some()
    }

    /// The normalized term, or "" when inactive.
    pub fn term(&self) -> &str {
        self.needle.as_deref().unwrap_or("")
    }

    /// Whether a leaf should be drawn at full strength.
    /// Everything matches while no search is active.
    pub fn is_matched(&self, instrument: &Instrument) -> bool {
        match &self.needle {
            Some(needle) => matches(instrument, needle),
            None => true,
        }
    }
}

/// Navigation consequence of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResolution {
    /// Blank term: drop any highlight, keep the current view
    Clear,
    /// Nothing matched: leave state (and previous highlight) untouched
    NoMatch,
    Matched {
        /// Group to zoom into, only when searching from the overview
        drill_into: Option<CompactString>,
        highlight: Highlight,
    },
}

pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Case-insensitive substring match on ticker or display name.
/// `needle` must already be normalized.
pub fn matches(instrument: &Instrument, needle: &str) -> bool {
    instrument.id.to_lowercase().contains(needle)
        || instrument.display_name.to_lowercase().contains(needle)
}

/// Index of the first instrument (in dataset order) matching `term`.
pub fn first_match(dataset: &[Instrument], term: &str) -> Option<usize> {
    let needle = normalize(term);
    if needle.is_empty() {
        return None;
    }
    dataset.iter().position(|i| matches(i, &needle))
}

/// Resolve a search against the current dataset and view.
///
/// From the overview the first match decides which group to open. In a
/// detail view the group is kept and only the highlight changes.
pub fn resolve(term: &str, dataset: &[Instrument], dimension: &str, view: &View) -> SearchResolution {
    let highlight = Highlight::for_term(term);
    if !highlight.is_active() {
        return SearchResolution::Clear;
    }

    let Some(index) = first_match(dataset, term) else {
        return SearchResolution::NoMatch;
    };

    let drill_into = match view {
        View::Overview => group_of(dataset, index, dimension),
        View::Detail(_) => None,
    };

    SearchResolution::Matched {
        drill_into,
        highlight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DIM_ISSUER;

    fn dataset() -> Vec<Instrument> {
        vec![
            Instrument::new("SPY", "SPDR S&P 500", Some(500.0), 0.4, 5e11, 0.0)
                .with_dimension(DIM_ISSUER, "BrandX"),
            Instrument::new("XYZ", "Xylophone Fund", Some(20.0), -1.2, 1e8, 0.0)
                .with_dimension(DIM_ISSUER, "BrandY"),
            Instrument::new("QQQ", "Nasdaq 100", Some(400.0), 1.1, 3e11, 0.0)
                .with_dimension(DIM_ISSUER, "BrandY"),
        ]
    }

    #[test]
    fn matches_ticker_or_name_case_insensitively() {
        let data = dataset();
        assert!(matches(&data[0], "spy"));
        assert!(matches(&data[0], "s&p"));
        assert!(!matches(&data[0], "nasdaq"));
        assert_eq!(first_match(&data, "  NASDAQ "), Some(2));
    }

    #[test]
    fn blank_term_clears() {
        assert_eq!(resolve("   ", &dataset(), DIM_ISSUER, &View::Overview), SearchResolution::Clear);
    }

    #[test]
    fn unknown_term_is_no_match() {
        assert_eq!(
            resolve("zzz", &dataset(), DIM_ISSUER, &View::Overview),
            SearchResolution::NoMatch
        );
    }

    #[test]
    fn overview_search_drills_into_first_match_group() {
        let resolution = resolve("xyz", &dataset(), DIM_ISSUER, &View::Overview);
        match resolution {
            SearchResolution::Matched { drill_into, highlight } => {
                assert_eq!(drill_into.as_deref(), Some("BrandY"));
                assert_eq!(highlight.term(), "xyz");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn first_match_wins_across_groups() {
        // "s" matches SPY (BrandX) before anything in BrandY.
        let resolution = resolve("s", &dataset(), DIM_ISSUER, &View::Overview);
        assert!(matches!(
            resolution,
            SearchResolution::Matched { drill_into: Some(ref key), .. } if key == "BrandX"
        ));
    }

    #[test]
    fn detail_search_keeps_group() {
        let view = View::Detail(CompactString::new("BrandX"));
        let resolution = resolve("qqq", &dataset(), DIM_ISSUER, &view);
        assert!(matches!(resolution, SearchResolution::Matched { drill_into: None, .. }));
    }

    #[test]
    fn inactive_highlight_matches_everything() {
        let data = dataset();
        assert!(Highlight::none().is_matched(&data[1]));
        let hl = Highlight::for_term("SPY");
        assert!(hl.is_matched(&data[0]));
        assert!(!hl.is_matched(&data[1]));
    }
}
