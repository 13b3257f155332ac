use compact_str::CompactString;

use super::instrument::Instrument;

/// Group key used for instruments that do not carry the active dimension.
pub const UNCLASSIFIED: &str = "Unclassified";

/// A set of instruments sharing one value of the active grouping dimension.
/// Members are indices into the dataset the group was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: CompactString,
    pub members: Vec<usize>,
    /// Sum of member weights
    pub total_weight: f64,
    /// Weight-averaged `change_percent` of the members
    pub weighted_average_change: f64,
}

/// Group `dataset` by `dimension`.
/// After this, groups are ordered by total weight (descending); ties keep
/// first-seen order. Members keep dataset order.
pub fn group_by(dataset: &[Instrument], dimension: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();

    for (index, instrument) in dataset.iter().enumerate() {
        let key = instrument.dimension(dimension).unwrap_or(UNCLASSIFIED);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.members.push(index),
            None => groups.push(Group {
                key: CompactString::new(key),
                members: vec![index],
                total_weight: 0.0,
                weighted_average_change: 0.0,
            }),
        }
    }

    for group in &mut groups {
        let mut total = 0.0;
        let mut weighted_change = 0.0;
        for &index in &group.members {
            let instrument = &dataset[index];
            total += instrument.weight;
            weighted_change += instrument.weight * instrument.change_percent;
        }
        group.total_weight = total;
        group.weighted_average_change = if total > 0.0 { weighted_change / total } else { 0.0 };
    }

    // Stable sort keeps first-seen order among equal totals.
    groups.sort_by(|a, b| b.total_weight.total_cmp(&a.total_weight));
    groups
}

/// Find a group by key.
pub fn find_group<'a>(groups: &'a [Group], key: &str) -> Option<&'a Group> {
    groups.iter().find(|g| g.key == key)
}

/// Key of the group containing the instrument at `index`.
pub fn group_of(dataset: &[Instrument], index: usize, dimension: &str) -> Option<CompactString> {
    dataset
        .get(index)
        .map(|i| CompactString::new(i.dimension(dimension).unwrap_or(UNCLASSIFIED)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instrument::{DIM_CATEGORY, DIM_ISSUER};

    fn etf(id: &str, issuer: &str, category: &str, aum: f64, change: f64) -> Instrument {
        Instrument::new(id, id, Some(10.0), change, aum, 0.0)
            .with_dimension(DIM_ISSUER, issuer)
            .with_dimension(DIM_CATEGORY, category)
    }

    #[test]
    fn groups_are_sorted_by_total_weight() {
        let data = vec![
            etf("A", "Small", "Equity", 10.0, 1.0),
            etf("B", "Big", "Equity", 500.0, 1.0),
            etf("C", "Small", "Bond", 20.0, 1.0),
        ];
        let groups = group_by(&data, DIM_ISSUER);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Big", "Small"]);
        assert_eq!(groups[1].members, vec![0, 2]);
        assert_eq!(groups[1].total_weight, 30.0);
    }

    #[test]
    fn weighted_average_change_uses_weights() {
        let data = vec![
            etf("A", "X", "Equity", 300.0, 2.0),
            etf("B", "X", "Equity", 100.0, -2.0),
        ];
        let groups = group_by(&data, DIM_ISSUER);
        assert!((groups[0].weighted_average_change - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_dimension_goes_to_unclassified() {
        let data = vec![Instrument::new("A", "A", Some(1.0), 0.0, 5.0, 0.0)];
        let groups = group_by(&data, DIM_CATEGORY);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, UNCLASSIFIED);
        assert_eq!(group_of(&data, 0, DIM_CATEGORY).as_deref(), Some(UNCLASSIFIED));
    }

    #[test]
    fn equal_totals_keep_first_seen_order() {
        let data = vec![
            etf("A", "First", "Equity", 50.0, 0.0),
            etf("B", "Second", "Equity", 50.0, 0.0),
        ];
        let groups = group_by(&data, DIM_ISSUER);
        assert_eq!(groups[0].key, "First");
        assert!(find_group(&groups, "Second").is_some());
        assert!(find_group(&groups, "Third").is_none());
    }
}
