use std::fmt;

use serde::{Deserialize, Serialize};

/// A reportable metric. Config files spell these in snake_case
/// (`pr_created`, `avg_merge_time`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PrCreated,
    ReviewsApproved,
    ReviewsChangesRequested,
    ReviewsCommented,
    Comments,
    AvgPrSize,
    AvgMergeTime,
}

impl Metric {
    /// All metrics, in report column order.
    pub const ALL: [Metric; 7] = [
        Metric::PrCreated,
        Metric::ReviewsApproved,
        Metric::ReviewsChangesRequested,
        Metric::ReviewsCommented,
        Metric::Comments,
        Metric::AvgPrSize,
        Metric::AvgMergeTime,
    ];

    pub fn column_title(&self) -> &'static str {
        match self {
            Metric::PrCreated => "PRs Created",
            Metric::ReviewsApproved => "Reviews: Approved",
            Metric::ReviewsChangesRequested => "Reviews: Changes Req.",
            Metric::ReviewsCommented => "Reviews: Commented",
            Metric::Comments => "Total Comments",
            Metric::AvgPrSize => "Avg PR Size (loc)",
            Metric::AvgMergeTime => "Avg Merge Time (h)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_title())
    }
}
