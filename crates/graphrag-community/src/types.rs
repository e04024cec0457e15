//! Result types for community analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Statistics from a community detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityStats {
    pub community_count: usize,
    /// Map from community size to how many communities have that size.
    pub community_distribution: BTreeMap<usize, usize>,
    pub node_count: usize,
    pub relationship_count: usize,
    pub largest_community_size: usize,
    pub smallest_community_size: usize,
}

/// Outcome of a report generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStats {
    pub communities: usize,
    pub reports_generated: usize,
    pub fallbacks: usize,
}
