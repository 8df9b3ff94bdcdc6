//! Result rendering
//!
//! Maps a [`CategorizedResultSet`] onto the category regions of the page.
//! Every pass clears both sub-regions of every category before appending, so
//! the regions always show exactly one cycle's results.

use crate::page::{Icon, ListItem, Outcome, RenderTarget};
use crate::types::{AssessmentResult, CategorizedResultSet, Category};
use serde::{Deserialize, Serialize};

/// Lowest score shown as passing
pub const PASS_THRESHOLD: i32 = 9;

/// Engine checks whose results are never shown
// singleH1 misfires on full-page previews that carry the site header
pub const DENYLIST: &[&str] = &["singleH1"];

/// Outcome of a result, or `None` when it is not shown at all
#[must_use]
pub fn classify(result: &AssessmentResult) -> Option<Outcome> {
    if result.score == 0 || DENYLIST.contains(&result.identifier.as_str()) {
        return None;
    }
    Some(outcome_for_score(result.score))
}

/// Passing iff the score reaches [`PASS_THRESHOLD`]
#[inline]
#[must_use]
pub fn outcome_for_score(score: i32) -> Outcome {
    if score >= PASS_THRESHOLD {
        Outcome::Success
    } else {
        Outcome::Errors
    }
}

/// Element ids of the category regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionIds {
    pub readability: String,
    pub discoverability: String,
}

impl RegionIds {
    #[must_use]
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Readability => &self.readability,
            Category::Discoverability => &self.discoverability,
        }
    }
}

impl Default for RegionIds {
    fn default() -> Self {
        Self {
            readability: "yoast_results_readability".to_string(),
            discoverability: "yoast_results_seo".to_string(),
        }
    }
}

/// Counts of one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub passing: usize,
    pub failing: usize,
    pub skipped: usize,
}

/// Writes result sets into the category regions
#[derive(Debug, Clone, Default)]
pub struct ResultRenderer {
    regions: RegionIds,
}

impl ResultRenderer {
    #[inline]
    #[must_use]
    pub fn new(regions: RegionIds) -> Self {
        Self { regions }
    }

    #[inline]
    #[must_use]
    pub fn regions(&self) -> &RegionIds {
        &self.regions
    }

    /// Replace the rendered results with `results`
    ///
    /// Idempotent: the same input always leaves the same region content.
    pub fn sync(&self, target: &dyn RenderTarget, results: &CategorizedResultSet) -> RenderStats {
        for category in Category::ALL {
            let region = self.regions.get(category);
            target.clear(region, Outcome::Success);
            target.clear(region, Outcome::Errors);
        }

        let mut stats = RenderStats::default();
        for category in Category::ALL {
            let region = self.regions.get(category);
            if !target.has_region(region) {
                tracing::debug!(%category, region, "result region missing, skipping");
                stats.skipped += results.results(category).len();
                continue;
            }

            for result in results.results(category) {
                let Some(outcome) = classify(result) else {
                    stats.skipped += 1;
                    continue;
                };

                let icon = match outcome {
                    Outcome::Success => {
                        stats.passing += 1;
                        Icon::Tick
                    }
                    Outcome::Errors => {
                        stats.failing += 1;
                        Icon::Cross
                    }
                };
                target.append(region, outcome, ListItem::new(icon, result.text.clone()));
            }
        }

        tracing::debug!(
            passing = stats.passing,
            failing = stats.failing,
            skipped = stats.skipped,
            "results rendered"
        );
        stats
    }
}
