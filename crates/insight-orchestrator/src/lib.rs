use std::cmp::Ordering;
use std::time::Duration;

use futures_util::future::join_all;
use fundamental_agent::FundamentalAgent;
use insight_core::{Agent, AgentError, CombinedAnalysis, Insight, MarketData, Recommendation};
use macro_agent::MacroAgent;
use risk_agent::RiskAgent;
use sector_agent::SectorAgent;
use sentiment_agent::SentimentAgent;
use serde::Serialize;
use technical_agent::TechnicalAgent;

const CONFIDENCE_GATE: f64 = 0.3;

/// Coordinates a set of agents: fans a symbol and data bundle out to
/// every enabled agent, isolates per-agent failures, and combines the
/// surviving insights into one [`CombinedAnalysis`].
///
/// Agent order affects display order only; the combination itself is
/// commutative.
pub struct InsightOrchestrator {
    agents: Vec<Box<dyn Agent>>,
    timeout: Option<Duration>,
}

/// One row of [`InsightOrchestrator::agent_summary`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub weight: f64,
    pub enabled: bool,
}

impl InsightOrchestrator {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            timeout: None,
        }
    }

    /// The standard six-perspective setup at equal weight.
    pub fn with_default_agents() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.add_agent(Box::new(TechnicalAgent::new()));
        orchestrator.add_agent(Box::new(FundamentalAgent::new()));
        orchestrator.add_agent(Box::new(SentimentAgent::new()));
        orchestrator.add_agent(Box::new(MacroAgent::new()));
        orchestrator.add_agent(Box::new(RiskAgent::new()));
        orchestrator.add_agent(Box::new(SectorAgent::new()));
        orchestrator
    }

    /// Gate the whole fan-out: any agent still running after `gate` is
    /// treated as failed and excluded, exactly like an agent error.
    pub fn with_timeout(mut self, gate: Duration) -> Self {
        self.timeout = Some(gate);
        self
    }

    pub fn add_agent(&mut self, agent: Box<dyn Agent>) {
        self.agents.push(agent);
    }

    pub fn remove_agent(&mut self, name: &str) {
        self.agents.retain(|agent| agent.name() != name);
    }

    /// Set one agent's weight (clamped to [0, 1]); false if no agent by
    /// that name is registered.
    pub fn set_agent_weight(&mut self, name: &str, weight: f64) -> bool {
        match self.agents.iter_mut().find(|a| a.name() == name) {
            Some(agent) => {
                agent.set_weight(weight);
                true
            }
            None => false,
        }
    }

    pub fn enable_agent(&mut self, name: &str) -> bool {
        match self.agents.iter_mut().find(|a| a.name() == name) {
            Some(agent) => {
                agent.enable();
                true
            }
            None => false,
        }
    }

    pub fn disable_agent(&mut self, name: &str) -> bool {
        match self.agents.iter_mut().find(|a| a.name() == name) {
            Some(agent) => {
                agent.disable();
                true
            }
            None => false,
        }
    }

    pub fn agent_summary(&self) -> Vec<AgentSummary> {
        self.agents
            .iter()
            .map(|agent| AgentSummary {
                name: agent.name().to_string(),
                weight: agent.weight(),
                enabled: agent.enabled(),
            })
            .collect()
    }

    /// Run every enabled agent against the bundle and combine the
    /// survivors. Never fails: agent errors and timeouts are logged and
    /// excluded, and total failure degrades to an INSUFFICIENT_DATA
    /// verdict.
    pub async fn analyze(&self, symbol: &str, data: &MarketData) -> CombinedAnalysis {
        tracing::info!(
            symbol,
            agents = self.agents.len(),
            "running multi-perspective analysis"
        );

        // Weight and enabled flags are read once up front so a
        // configuration change from another context cannot skew a run
        // halfway through.
        let mut snapshot: Vec<(String, f64)> = Vec::new();
        let mut runs = Vec::new();
        for agent in self.agents.iter().filter(|a| a.enabled()) {
            snapshot.push((agent.name().to_string(), agent.weight()));
            runs.push(self.run_gated(agent.as_ref(), symbol, data));
        }

        let outcomes = join_all(runs).await;

        let mut insights: Vec<Insight> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for ((name, weight), outcome) in snapshot.into_iter().zip(outcomes) {
            match outcome {
                Ok(insight) => {
                    tracing::debug!(agent = %name, score = insight.score(), "agent insight collected");
                    insights.push(insight);
                    weights.push(weight);
                }
                Err(error) => {
                    tracing::warn!(agent = %name, %error, "agent excluded from combination");
                }
            }
        }

        self.combine(symbol, insights, &weights)
    }

    async fn run_gated(
        &self,
        agent: &dyn Agent,
        symbol: &str,
        data: &MarketData,
    ) -> Result<Insight, AgentError> {
        match self.timeout {
            Some(gate) => match tokio::time::timeout(gate, agent.analyze(symbol, data)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AgentError::Timeout(gate)),
            },
            None => agent.analyze(symbol, data).await,
        }
    }

    fn combine(&self, symbol: &str, insights: Vec<Insight>, weights: &[f64]) -> CombinedAnalysis {
        if insights.is_empty() {
            return CombinedAnalysis {
                symbol: symbol.to_string(),
                insights,
                combined_score: 0.0,
                combined_confidence: 0.0,
                recommendation: Recommendation::InsufficientData,
                reasoning: "No agent produced an insight.".to_string(),
                total_agents: 0,
            };
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for (insight, weight) in insights.iter().zip(weights) {
            let effective = weight * insight.confidence();
            weighted_sum += insight.score() * effective;
            total_weight += effective;
        }
        let combined_score = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };

        // The score is weighted by weight x confidence but the combined
        // confidence is a plain mean over the survivors.
        let combined_confidence =
            insights.iter().map(Insight::confidence).sum::<f64>() / insights.len() as f64;

        let recommendation = recommendation_for(combined_score, combined_confidence);
        let reasoning = build_reasoning(&insights, combined_score);

        CombinedAnalysis {
            symbol: symbol.to_string(),
            total_agents: insights.len(),
            insights,
            combined_score,
            combined_confidence,
            recommendation,
            reasoning,
        }
    }
}

impl Default for InsightOrchestrator {
    fn default() -> Self {
        Self::with_default_agents()
    }
}

/// Map a combined score to the final verdict. Low confidence trumps any
/// score.
fn recommendation_for(score: f64, confidence: f64) -> Recommendation {
    if confidence < CONFIDENCE_GATE {
        return Recommendation::InsufficientConfidence;
    }
    if score >= 60.0 {
        Recommendation::StrongBuy
    } else if score >= 30.0 {
        Recommendation::Buy
    } else if score >= -30.0 {
        Recommendation::Hold
    } else if score >= -60.0 {
        Recommendation::Sell
    } else {
        Recommendation::StrongSell
    }
}

fn build_reasoning(insights: &[Insight], combined_score: f64) -> String {
    let mut parts = vec![format!("Combined score: {combined_score:.2}/100")];

    if insights.iter().all(|i| i.score() > 30.0) {
        parts.push("Bullish consensus across agents.".to_string());
    } else if insights.iter().all(|i| i.score() < -30.0) {
        parts.push("Bearish consensus across agents.".to_string());
    } else {
        parts.push("Agents diverge on direction.".to_string());
    }

    let mut ranked: Vec<&Insight> = insights.iter().collect();
    ranked.sort_by(|a, b| {
        b.score()
            .abs()
            .partial_cmp(&a.score().abs())
            .unwrap_or(Ordering::Equal)
    });

    parts.push("\nKey insights:".to_string());
    for insight in ranked.into_iter().take(3) {
        parts.push(format!("- {}: {}", insight.agent_name(), insight.reasoning()));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use insight_core::AgentProfile;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .try_init();
    }

    /// Fixed-output agent for combination tests.
    struct StubAgent {
        profile: AgentProfile,
        score: f64,
        confidence: f64,
    }

    impl StubAgent {
        fn boxed(name: &str, weight: f64, score: f64, confidence: f64) -> Box<dyn Agent> {
            Box::new(Self {
                profile: AgentProfile::new(name, weight),
                score,
                confidence,
            })
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        fn profile_mut(&mut self) -> &mut AgentProfile {
            &mut self.profile
        }

        async fn analyze(&self, _symbol: &str, _data: &MarketData) -> Result<Insight, AgentError> {
            Ok(Insight::new(
                self.name(),
                self.score,
                self.confidence,
                format!("stub view at {:.0}", self.score),
            ))
        }
    }

    struct FailingAgent {
        profile: AgentProfile,
    }

    impl FailingAgent {
        fn boxed(name: &str) -> Box<dyn Agent> {
            Box::new(Self {
                profile: AgentProfile::new(name, 1.0),
            })
        }
    }

    #[async_trait]
    impl Agent for FailingAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        fn profile_mut(&mut self) -> &mut AgentProfile {
            &mut self.profile
        }

        async fn analyze(&self, _symbol: &str, _data: &MarketData) -> Result<Insight, AgentError> {
            Err(AgentError::Calculation("synthetic agent fault".to_string()))
        }
    }

    struct SlowAgent {
        profile: AgentProfile,
    }

    impl SlowAgent {
        fn boxed(name: &str) -> Box<dyn Agent> {
            Box::new(Self {
                profile: AgentProfile::new(name, 1.0),
            })
        }
    }

    #[async_trait]
    impl Agent for SlowAgent {
        fn profile(&self) -> &AgentProfile {
            &self.profile
        }

        fn profile_mut(&mut self) -> &mut AgentProfile {
            &mut self.profile
        }

        async fn analyze(&self, _symbol: &str, _data: &MarketData) -> Result<Insight, AgentError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Insight::new(self.name(), 99.0, 1.0, "too late"))
        }
    }

    #[tokio::test]
    async fn test_single_agent_passes_score_through() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Solo", 1.0, 42.0, 1.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.combined_score, 42.0);
        assert_eq!(result.combined_confidence, 1.0);
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.total_agents, 1);
    }

    #[tokio::test]
    async fn test_opposing_scores_cancel_out() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Bull", 1.0, 60.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("Bear", 1.0, -60.0, 1.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.combined_score, 0.0);
        assert_eq!(result.recommendation, Recommendation::Hold);
    }

    #[tokio::test]
    async fn test_zero_weights_do_not_divide_by_zero() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("A", 0.0, 80.0, 0.0));
        orchestrator.add_agent(StubAgent::boxed("B", 0.0, -40.0, 0.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.combined_score, 0.0);
        assert_eq!(result.combined_confidence, 0.0);
        // the confidence gate applies even at a neutral score
        assert_eq!(
            result.recommendation,
            Recommendation::InsufficientConfidence
        );
        assert_eq!(result.total_agents, 2);
    }

    #[tokio::test]
    async fn test_confidence_gate_dominates_score() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Confident-ish", 1.0, 95.0, 0.2));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.combined_score, 95.0);
        assert!((result.combined_confidence - 0.2).abs() < 1e-9);
        assert_eq!(
            result.recommendation,
            Recommendation::InsufficientConfidence
        );
    }

    #[test]
    fn test_recommendation_boundaries() {
        assert_eq!(recommendation_for(60.0, 0.5), Recommendation::StrongBuy);
        assert_eq!(recommendation_for(59.99, 0.5), Recommendation::Buy);
        assert_eq!(recommendation_for(30.0, 0.5), Recommendation::Buy);
        assert_eq!(recommendation_for(29.99, 0.5), Recommendation::Hold);
        assert_eq!(recommendation_for(-30.0, 0.5), Recommendation::Hold);
        assert_eq!(recommendation_for(-30.01, 0.5), Recommendation::Sell);
        assert_eq!(recommendation_for(-60.0, 0.5), Recommendation::Sell);
        assert_eq!(recommendation_for(-60.01, 0.5), Recommendation::StrongSell);
    }

    #[test]
    fn test_recommendation_gate_boundary() {
        assert_eq!(
            recommendation_for(95.0, 0.29),
            Recommendation::InsufficientConfidence
        );
        assert_eq!(recommendation_for(95.0, 0.3), Recommendation::StrongBuy);
    }

    #[tokio::test]
    async fn test_failing_agent_is_isolated() {
        init_tracing();
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("A", 1.0, 40.0, 1.0));
        orchestrator.add_agent(FailingAgent::boxed("Broken"));
        orchestrator.add_agent(StubAgent::boxed("B", 1.0, 20.0, 1.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.total_agents, 2);
        assert_eq!(result.insights.len(), 2);
        assert_eq!(result.combined_score, 30.0);
        assert_eq!(result.recommendation, Recommendation::Buy);
    }

    #[tokio::test]
    async fn test_no_agents_means_insufficient_data() {
        let orchestrator = InsightOrchestrator::new();
        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.combined_score, 0.0);
        assert_eq!(result.combined_confidence, 0.0);
        assert_eq!(result.recommendation, Recommendation::InsufficientData);
        assert_eq!(result.reasoning, "No agent produced an insight.");
        assert_eq!(result.total_agents, 0);
    }

    #[tokio::test]
    async fn test_all_agents_failing_means_insufficient_data() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(FailingAgent::boxed("Broken-1"));
        orchestrator.add_agent(FailingAgent::boxed("Broken-2"));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.recommendation, Recommendation::InsufficientData);
        assert_eq!(result.total_agents, 0);
    }

    #[tokio::test]
    async fn test_disabled_agent_is_skipped() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("On", 1.0, 50.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("Off", 1.0, -90.0, 1.0));
        assert!(orchestrator.disable_agent("Off"));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.total_agents, 1);
        assert_eq!(result.combined_score, 50.0);
    }

    #[tokio::test]
    async fn test_weight_shifts_combination() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Heavy", 1.0, 80.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("Light", 1.0, -80.0, 1.0));
        assert!(orchestrator.set_agent_weight("Light", 0.25));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        // (80*1 - 80*0.25) / 1.25 = 48
        assert!((result.combined_score - 48.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_timeout_excludes_slow_agent() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Fast", 1.0, 10.0, 1.0));
        orchestrator.add_agent(SlowAgent::boxed("Slow"));
        let orchestrator = orchestrator.with_timeout(Duration::from_millis(50));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert_eq!(result.total_agents, 1);
        assert_eq!(result.combined_score, 10.0);
    }

    #[tokio::test]
    async fn test_reasoning_reports_consensus_and_top_insights() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("A", 1.0, 70.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("B", 1.0, 45.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("C", 1.0, 35.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("D", 1.0, 40.0, 1.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert!(result.reasoning.contains("Bullish consensus across agents."));
        // top three by absolute score: A, B, D
        assert!(result.reasoning.contains("- A:"));
        assert!(result.reasoning.contains("- B:"));
        assert!(result.reasoning.contains("- D:"));
        assert!(!result.reasoning.contains("- C:"));
    }

    #[tokio::test]
    async fn test_divergent_agents_reported() {
        let mut orchestrator = InsightOrchestrator::new();
        orchestrator.add_agent(StubAgent::boxed("Bull", 1.0, 80.0, 1.0));
        orchestrator.add_agent(StubAgent::boxed("Bear", 1.0, -80.0, 1.0));

        let result = orchestrator.analyze("TEST", &MarketData::default()).await;
        assert!(result.reasoning.contains("Agents diverge on direction."));
    }

    #[tokio::test]
    async fn test_agent_summary_reflects_configuration() {
        let mut orchestrator = InsightOrchestrator::with_default_agents();
        assert!(orchestrator.set_agent_weight("Macro Analyst", 0.5));
        assert!(orchestrator.disable_agent("Sector Analyst"));
        assert!(!orchestrator.set_agent_weight("Nonexistent", 0.5));

        let summary = orchestrator.agent_summary();
        assert_eq!(summary.len(), 6);
        let macro_row = summary.iter().find(|s| s.name == "Macro Analyst").unwrap();
        assert_eq!(macro_row.weight, 0.5);
        let sector_row = summary.iter().find(|s| s.name == "Sector Analyst").unwrap();
        assert!(!sector_row.enabled);
    }

    #[tokio::test]
    async fn test_remove_agent() {
        let mut orchestrator = InsightOrchestrator::with_default_agents();
        orchestrator.remove_agent("Risk Analyst");
        assert_eq!(orchestrator.agent_summary().len(), 5);
    }

    #[tokio::test]
    async fn test_default_agents_on_empty_bundle_degrade_gracefully() {
        init_tracing();
        let orchestrator = InsightOrchestrator::with_default_agents();
        let result = orchestrator.analyze("TEST", &MarketData::default()).await;

        // every agent survives with a low- or zero-confidence insight
        assert_eq!(result.total_agents, 6);
        assert_eq!(result.combined_score, 0.0);
        assert!(result.combined_confidence < CONFIDENCE_GATE);
        assert_eq!(
            result.recommendation,
            Recommendation::InsufficientConfidence
        );
    }
}
