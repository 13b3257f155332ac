use crate::model::Instrument;

/// Information to display in the tooltip when hovering over a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipInfo {
    pub ticker: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub aum: String,
    pub volume: String,
    /// (dimension, value) pairs, e.g. ("issuer", "Vanguard")
    pub dimensions: Vec<(String, String)>,
    pub positive: bool,
}

impl TooltipInfo {
    /// Label/value rows in display order.
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Price".to_string(), self.price.clone()),
            ("Change".to_string(), self.change.clone()),
            ("AUM".to_string(), self.aum.clone()),
            ("Volume".to_string(), self.volume.clone()),
        ];
        rows.extend(self.dimensions.iter().map(|(k, v)| (capitalize(k), v.clone())));
        rows
    }
}

/// Build tooltip info for an instrument.
pub fn build_tooltip(instrument: &Instrument) -> TooltipInfo {
    TooltipInfo {
        ticker: instrument.id.to_string(),
        name: instrument.display_name.clone(),
        price: format_price(instrument.price),
        change: format_change(instrument.change_percent),
        aum: format_aum(instrument.aum),
        volume: format_volume(instrument.volume),
        dimensions: instrument
            .dimensions
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        positive: instrument.change_percent >= 0.0,
    }
}

/// Signed percentage with two decimals, e.g. "+1.25%".
pub fn format_change(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.2}%")
}

/// Assets under management in compact dollars, e.g. "$1.2B", "$340M".
/// Halves round up: 12,500 shows as "$13K".
pub fn format_aum(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        "N/A".to_string()
    } else if value >= 1e9 {
        format!("${:.1}B", (value / 1e8).round() / 10.0)
    } else if value >= 1e6 {
        format!("${:.0}M", (value / 1e6).round())
    } else if value >= 1e3 {
        format!("${:.0}K", (value / 1e3).round())
    } else {
        format!("${:.0}", value.round())
    }
}

pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(p) if p.is_finite() => format!("${p:.2}"),
        _ => "N/A".to_string(),
    }
}

/// Volume with thousands separators, e.g. "1,234,567".
pub fn format_volume(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "N/A".to_string();
    }
    let digits = format!("{:.0}", value);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DIM_ISSUER;

    #[test]
    fn formats_change_with_sign() {
        assert_eq!(format_change(1.234), "+1.23%");
        assert_eq!(format_change(0.0), "+0.00%");
        assert_eq!(format_change(-0.5), "-0.50%");
        assert_eq!(format_change(f64::NAN), "N/A");
    }

    #[test]
    fn formats_aum_in_compact_units() {
        assert_eq!(format_aum(1.25e9), "$1.3B");
        assert_eq!(format_aum(1.24e9), "$1.2B");
        assert_eq!(format_aum(3.4e8), "$340M");
        assert_eq!(format_aum(12_500.0), "$13K");
        assert_eq!(format_aum(2_500_000.0), "$3M");
        assert_eq!(format_aum(999.0), "$999");
        assert_eq!(format_aum(0.5), "$1");
        assert_eq!(format_aum(0.0), "N/A");
    }

    #[test]
    fn formats_price_and_volume() {
        assert_eq!(format_price(Some(12.5)), "$12.50");
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_volume(1_234_567.0), "1,234,567");
        assert_eq!(format_volume(999.0), "999");
        assert_eq!(format_volume(0.0), "N/A");
    }

    #[test]
    fn tooltip_lists_dimensions() {
        let inst = Instrument::new("VTI", "Total Market", Some(250.0), -0.3, 3e11, 0.0)
            .with_dimension(DIM_ISSUER, "Vanguard");
        let info = build_tooltip(&inst);
        assert_eq!(info.ticker, "VTI");
        assert!(!info.positive);
        assert!(info.rows().contains(&("Issuer".to_string(), "Vanguard".to_string())));
    }
}
