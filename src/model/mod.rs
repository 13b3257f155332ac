pub mod group;
pub mod instrument;
pub mod stats;

pub use group::{group_by, Group};
pub use instrument::{Instrument, DIM_CATEGORY, DIM_ISSUER};
pub use stats::{compute_stats, SummaryStats};
