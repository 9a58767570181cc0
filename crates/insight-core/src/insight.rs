use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring;

/// The scored opinion of a single agent.
///
/// Scores are clamped to [-100, 100] and confidences to [0, 1] at
/// construction, whatever the raw values were. An `Insight` is immutable
/// once built; agents create a fresh one on every analysis call.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    agent_name: String,
    score: f64,
    confidence: f64,
    reasoning: String,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        agent_name: impl Into<String>,
        score: f64,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            score: scoring::clamp_score(score),
            confidence: scoring::clamp_unit(confidence),
            reasoning: reasoning.into(),
            metadata: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach opaque diagnostic metadata (indicator values, sub-scores).
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Flatten into the transportable record form.
    pub fn to_record(&self) -> InsightRecord {
        InsightRecord {
            agent_name: self.agent_name.clone(),
            score: self.score,
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
            metadata: self.metadata.clone(),
            timestamp: self.timestamp.to_rfc3339(),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: score {:.2}, confidence {:.2}",
            self.agent_name, self.score, self.confidence
        )
    }
}

/// Flat, serializable form of an [`Insight`] with an ISO-8601 timestamp,
/// suitable for transport or storage by downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRecord {
    pub agent_name: String,
    pub score: f64,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub timestamp: String,
}

impl From<InsightRecord> for Insight {
    fn from(record: InsightRecord) -> Self {
        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Self {
            agent_name: record.agent_name,
            score: scoring::clamp_score(record.score),
            confidence: scoring::clamp_unit(record.confidence),
            reasoning: record.reasoning,
            metadata: record.metadata,
            timestamp,
        }
    }
}

/// Final verdict derived from the combined score and the confidence gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    InsufficientConfidence,
    InsufficientData,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::StrongSell => "Strong Sell",
            Recommendation::InsufficientConfidence => "Insufficient Confidence",
            Recommendation::InsufficientData => "Insufficient Data",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The combined output of one orchestration run.
///
/// `insights` keeps agent registration order for display; the combined
/// numbers are order-independent. `total_agents` counts the insights
/// that survived the fan-out, not the configured agents.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedAnalysis {
    pub symbol: String,
    pub insights: Vec<Insight>,
    pub combined_score: f64,
    pub combined_confidence: f64,
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub total_agents: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_clamped_on_construction() {
        let insight = Insight::new("Test", 500.0, 0.5, "raw score above range");
        assert_eq!(insight.score(), 100.0);

        let insight = Insight::new("Test", -500.0, 0.5, "raw score below range");
        assert_eq!(insight.score(), -100.0);
    }

    #[test]
    fn test_confidence_clamped_on_construction() {
        let insight = Insight::new("Test", 0.0, -1.0, "raw confidence below range");
        assert_eq!(insight.confidence(), 0.0);

        let insight = Insight::new("Test", 0.0, 3.0, "raw confidence above range");
        assert_eq!(insight.confidence(), 1.0);
    }

    #[test]
    fn test_in_range_values_untouched() {
        let insight = Insight::new("Test", 42.5, 0.75, "ok");
        assert_eq!(insight.score(), 42.5);
        assert_eq!(insight.confidence(), 0.75);
    }

    #[test]
    fn test_record_round_trip() {
        let insight = Insight::new("Technical Analyst", -31.25, 0.62, "bearish drift")
            .with_metadata(json!({"rsi": 71.4}));
        let record = insight.to_record();

        assert_eq!(record.agent_name, "Technical Analyst");
        assert!(record.timestamp.contains('T'));

        let restored = Insight::from(record);
        assert_eq!(restored.score(), insight.score());
        assert_eq!(restored.confidence(), insight.confidence());
        assert_eq!(restored.reasoning(), insight.reasoning());
        assert_eq!(restored.timestamp(), insight.timestamp());
        assert_eq!(restored.metadata(), insight.metadata());
    }

    #[test]
    fn test_record_serializes_to_json() {
        let insight = Insight::new("Risk Analyst", 10.0, 0.8, "stable profile");
        let text = serde_json::to_string(&insight.to_record()).unwrap();
        let parsed: InsightRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.score, 10.0);
        assert_eq!(parsed.confidence, 0.8);
        assert_eq!(parsed.reasoning, "stable profile");
    }

    #[test]
    fn test_recommendation_serde_names() {
        let text = serde_json::to_string(&Recommendation::StrongBuy).unwrap();
        assert_eq!(text, "\"STRONG_BUY\"");
        let text = serde_json::to_string(&Recommendation::InsufficientData).unwrap();
        assert_eq!(text, "\"INSUFFICIENT_DATA\"");
    }
}
