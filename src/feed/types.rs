use serde::Deserialize;

use crate::model::{Instrument, DIM_CATEGORY, DIM_ISSUER};

/// One quote as published in a snapshot file.
///
/// Numeric fields may be `null` or missing; `brand` and `strategy` become the
/// `issuer` and `category` dimensions.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub aum: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Absolute change; carried on the wire but not displayed
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub changes_percentage: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl QuoteRecord {
    pub fn into_instrument(self) -> Instrument {
        let name = self.name.as_deref().unwrap_or(&self.ticker);
        let mut instrument = Instrument::new(
            &self.ticker,
            name,
            self.price,
            self.changes_percentage.unwrap_or(0.0),
            self.aum.unwrap_or(0.0),
            self.volume.unwrap_or(0.0),
        );
        for (dimension, value) in [(DIM_ISSUER, &self.brand), (DIM_CATEGORY, &self.strategy)] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                instrument = instrument.with_dimension(dimension, value);
            }
        }
        instrument
    }
}

/// Parse a JSON array of quote records into instruments.
pub fn parse_snapshot(json: &str) -> serde_json::Result<Vec<Instrument>> {
    let records: Vec<QuoteRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(QuoteRecord::into_instrument).collect())
}
