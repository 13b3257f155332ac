use std::collections::BTreeMap;

use compact_str::CompactString;

/// Smallest weight any instrument can have. A zero-weight leaf would get
/// zero area and break the area-proportional layout.
pub const MIN_WEIGHT: f64 = 1.0;

/// Dimension name for the fund issuer (brand).
pub const DIM_ISSUER: &str = "issuer";
/// Dimension name for the investment category (strategy).
pub const DIM_CATEGORY: &str = "category";

/// A single tradable instrument as shown on the heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    /// Ticker symbol, unique within a dataset
    pub id: CompactString,
    /// Human-readable fund name
    pub display_name: String,
    /// Grouping dimensions: dimension name → value (e.g. "category" → "Equity")
    pub dimensions: BTreeMap<CompactString, CompactString>,
    /// Last price, `None` when no quote was available
    pub price: Option<f64>,
    /// Signed percentage change since previous close
    pub change_percent: f64,
    /// Assets under management (0 when unknown)
    pub aum: f64,
    /// Traded volume (0 when unknown)
    pub volume: f64,
    /// Layout weight, see [`leaf_weight`]. Always >= [`MIN_WEIGHT`].
    pub weight: f64,
}

impl Instrument {
    pub fn new(
        id: &str,
        display_name: &str,
        price: Option<f64>,
        change_percent: f64,
        aum: f64,
        volume: f64,
    ) -> Self {
        Self {
            id: CompactString::new(id),
            display_name: display_name.to_string(),
            dimensions: BTreeMap::new(),
            price,
            change_percent: if change_percent.is_finite() { change_percent } else { 0.0 },
            aum,
            volume,
            weight: leaf_weight(aum, volume, price),
        }
    }

    /// Builder-style helper to attach a grouping dimension.
    pub fn with_dimension(mut self, dimension: &str, value: &str) -> Self {
        self.dimensions
            .insert(CompactString::new(dimension), CompactString::new(value));
        self
    }

    /// Value of the given dimension, if the instrument carries it.
    pub fn dimension(&self, dimension: &str) -> Option<&str> {
        self.dimensions.get(dimension).map(|v| v.as_str())
    }

    /// Whether the instrument has enough data to be drawn at all:
    /// a known price or a positive AUM.
    pub fn is_displayable(&self) -> bool {
        self.price.is_some() || self.aum > 0.0
    }
}

/// Layout weight for a leaf: prefer AUM, fall back to a liquidity proxy
/// (volume × price), and floor at [`MIN_WEIGHT`].
pub fn leaf_weight(aum: f64, volume: f64, price: Option<f64>) -> f64 {
    let aum = if aum.is_finite() { aum } else { 0.0 };
    let price = price.filter(|p| p.is_finite()).unwrap_or(1.0).max(1.0);
    let liquidity = if volume.is_finite() { volume * price } else { 0.0 };
    aum.max(liquidity).max(MIN_WEIGHT)
}

/// Keep only instruments that can be drawn (see [`Instrument::is_displayable`]).
pub fn displayable(dataset: Vec<Instrument>) -> Vec<Instrument> {
    dataset.into_iter().filter(Instrument::is_displayable).collect()
}
