//! Worker wire protocol
//!
//! One JSON object per line in each direction.
//!
//! Request:  `{"id":1,"type":"initialize","payload":{...}}`
//! Reply:    `{"id":1,"ok":true,"result":...}` or `{"id":1,"ok":false,"error":"..."}`
//!
//! The analysis result follows the engine's native shape: readability results
//! under `readability.results`, discoverability results per focus keyword
//! under `seo.<keyword>.results`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use wy_core::{AssessmentResult, CategorizedResultSet, Category};

/// Request kinds understood by a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Initialize,
    Analyze,
}

/// One request line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub payload: Value,
}

/// One reply line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireResults {
    #[serde(default)]
    results: Vec<WireAssessment>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireAssessment {
    #[serde(rename = "_identifier", alias = "identifier")]
    identifier: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireAnalysis {
    #[serde(default)]
    readability: WireResults,
    #[serde(default)]
    seo: BTreeMap<String, WireResults>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisPayload {
    Wrapped { result: WireAnalysis },
    Bare(WireAnalysis),
}

impl From<WireAssessment> for AssessmentResult {
    fn from(wire: WireAssessment) -> Self {
        // Truncated toward zero, but a positive score never drops to the
        // not-applicable zero
        let floor = if wire.score > 0.0 { 1.0 } else { 0.0 };
        let score = wire.score.trunc().max(floor) as i32;
        AssessmentResult::new(wire.identifier, score, wire.text)
    }
}

/// Decode an `analyze` reply into a result set
///
/// Discoverability results come from the empty-keyword entry, or from the
/// first keyword entry when there is none.
pub fn decode_analysis(result: Value) -> Result<CategorizedResultSet, serde_json::Error> {
    let analysis = match serde_json::from_value::<AnalysisPayload>(result)? {
        AnalysisPayload::Wrapped { result } | AnalysisPayload::Bare(result) => result,
    };

    let WireAnalysis { readability, mut seo } = analysis;
    let discoverability = match seo.remove("") {
        Some(entry) => entry,
        None => seo.into_values().next().unwrap_or_default(),
    };

    Ok(CategorizedResultSet::new()
        .with(
            Category::Readability,
            readability.results.into_iter().map(Into::into).collect(),
        )
        .with(
            Category::Discoverability,
            discoverability.results.into_iter().map(Into::into).collect(),
        ))
}
