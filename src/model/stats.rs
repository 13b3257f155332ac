use super::instrument::Instrument;

/// Summary numbers for the stats bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryStats {
    /// Instruments with a known price
    pub total: usize,
    /// Unweighted mean change of priced instruments
    pub average_change: f64,
    pub gainers: usize,
    pub losers: usize,
}

/// Compute summary stats over the priced instruments of a dataset.
pub fn compute_stats(dataset: &[Instrument]) -> SummaryStats {
    let mut stats = SummaryStats::default();
    let mut change_sum = 0.0;

    for instrument in dataset.iter().filter(|i| i.price.is_some()) {
        stats.total += 1;
        change_sum += instrument.change_percent;
        if instrument.change_percent > 0.0 {
            stats.gainers += 1;
        } else if instrument.change_percent < 0.0 {
            stats.losers += 1;
        }
    }

    if stats.total > 0 {
        stats.average_change = change_sum / stats.total as f64;
    }
    stats
}
