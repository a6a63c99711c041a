//! News digest input model.
//!
//! The upstream aggregator emits keyword statistics as JSON; this module is
//! the typed view the script generator consumes.

use serde::{Deserialize, Serialize};

/// Aggregated news statistics for one bulletin run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsDigest {
    #[serde(default)]
    pub stats: Vec<KeywordStat>,
}

impl NewsDigest {
    /// Total number of titles across all keyword groups.
    pub fn total_titles(&self) -> u64 {
        self.stats.iter().map(|stat| stat.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// One keyword group with the titles that matched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordStat {
    pub word: String,
    pub count: u64,
    #[serde(default)]
    pub titles: Vec<TitleEntry>,
}

/// A single matched headline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
    #[serde(default)]
    pub source: String,
    /// Chart positions the headline held, best first.
    #[serde(default)]
    pub ranks: Vec<u32>,
}

impl TitleEntry {
    /// Best (first) rank, zero when unranked.
    pub fn top_rank(&self) -> u32 {
        self.ranks.first().copied().unwrap_or(0)
    }
}
