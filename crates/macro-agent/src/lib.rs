use async_trait::async_trait;
use insight_core::scoring::{band_below, clamp_score, mean};
use insight_core::{
    Agent, AgentError, AgentProfile, GdpGrowth, GrowthTrend, Inflation, Insight, InterestRates,
    MarketData, MarketRegime, PolicyExpectation, RateTrend, RegimeKind, Unemployment,
    YieldCurveShape,
};
use serde_json::json;

const RATE_LEVEL_TIERS: &[(f64, f64)] = &[(2.0, 40.0), (4.0, 20.0), (6.0, -10.0)];
const INFLATION_DEVIATION_TIERS: &[(f64, f64)] = &[(0.5, 40.0), (1.0, 20.0), (2.0, -10.0)];
const UNEMPLOYMENT_TIERS: &[(f64, f64)] = &[(4.0, 40.0), (5.0, 20.0), (7.0, 0.0)];
const VIX_TIERS: &[(f64, f64)] = &[(15.0, 30.0), (20.0, 10.0), (30.0, -20.0)];

/// Top-down perspective: rates, inflation, growth, employment, and the
/// prevailing market regime, each banded independently.
pub struct MacroAgent {
    profile: AgentProfile,
}

impl MacroAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Macro Analyst", weight),
        }
    }

    /// Cheap money scores well; the trend and the next-meeting
    /// expectation tilt the level score.
    fn analyze_interest_rates(rates: &InterestRates) -> f64 {
        let mut score = band_below(rates.current_rate, RATE_LEVEL_TIERS, -40.0);

        match rates.trend {
            Some(RateTrend::Falling) => score += 30.0,
            Some(RateTrend::Rising) => score -= 30.0,
            Some(RateTrend::Stable) => score += 10.0,
            None => {}
        }

        match rates.next_meeting_expectation {
            Some(PolicyExpectation::Cut) => score += 20.0,
            Some(PolicyExpectation::Hike) => score -= 20.0,
            Some(PolicyExpectation::Hold) | None => {}
        }

        clamp_score(score)
    }

    /// Scores distance from target; the trend reading flips sign
    /// depending on which side of the target inflation sits.
    fn analyze_inflation(inflation: &Inflation) -> f64 {
        let deviation = (inflation.current_rate - inflation.target_rate).abs();
        let mut score = band_below(deviation, INFLATION_DEVIATION_TIERS, -40.0);

        if inflation.current_rate > inflation.target_rate {
            match inflation.trend {
                Some(RateTrend::Falling) => score += 30.0,
                Some(RateTrend::Rising) => score -= 40.0,
                _ => {}
            }
        } else {
            match inflation.trend {
                Some(RateTrend::Rising) => score += 20.0,
                Some(RateTrend::Falling) => score -= 20.0,
                _ => {}
            }
        }

        if inflation.current_rate > 5.0 {
            score -= 30.0;
        }

        clamp_score(score)
    }

    fn analyze_gdp(gdp: &GdpGrowth) -> f64 {
        let mut score = if gdp.growth_rate > 4.0 {
            50.0
        } else if gdp.growth_rate > 2.0 {
            30.0
        } else if gdp.growth_rate > 0.0 {
            10.0
        } else if gdp.growth_rate > -1.0 {
            -30.0
        } else {
            -60.0
        };

        match gdp.trend {
            Some(GrowthTrend::Accelerating) => score += 20.0,
            Some(GrowthTrend::Decelerating) => score -= 20.0,
            Some(GrowthTrend::Stable) | None => {}
        }

        clamp_score(score)
    }

    fn analyze_employment(employment: &Unemployment) -> f64 {
        let mut score = band_below(employment.unemployment_rate, UNEMPLOYMENT_TIERS, -40.0);

        match employment.trend {
            Some(RateTrend::Falling) => score += 20.0,
            Some(RateTrend::Rising) => score -= 30.0,
            _ => {}
        }

        clamp_score(score)
    }

    fn analyze_market_regime(regime: &MarketRegime) -> f64 {
        let mut score = 0.0;

        match regime.kind {
            Some(RegimeKind::RiskOn) => score += 50.0,
            Some(RegimeKind::RiskOff) => score -= 50.0,
            Some(RegimeKind::Neutral) | None => {}
        }

        if let Some(vix) = regime.vix {
            score += band_below(vix, VIX_TIERS, -40.0);
        }

        match regime.yield_curve {
            Some(YieldCurveShape::Normal) => score += 20.0,
            Some(YieldCurveShape::Flat) => score -= 10.0,
            Some(YieldCurveShape::Inverted) => score -= 50.0,
            None => {}
        }

        clamp_score(score)
    }

    fn build_reasoning(scores: &[(&str, f64)], macro_data: &insight_core::MacroData) -> String {
        let mut parts = Vec::new();
        let has = |key: &str| scores.iter().any(|(k, _)| *k == key);

        if has("rates") {
            if let Some(rates) = macro_data.interest_rates.as_ref() {
                let trend = match rates.trend {
                    Some(RateTrend::Rising) => " (rising)",
                    Some(RateTrend::Falling) => " (falling)",
                    Some(RateTrend::Stable) => " (stable)",
                    None => "",
                };
                parts.push(format!("Interest rates at {:.2}%{}", rates.current_rate, trend));
            }
        }
        if has("inflation") {
            if let Some(inflation) = macro_data.inflation.as_ref() {
                parts.push(format!("Inflation at {:.1}%", inflation.current_rate));
            }
        }
        if has("gdp") {
            if let Some(gdp) = macro_data.gdp_growth.as_ref() {
                parts.push(format!("GDP growing at {:.1}%", gdp.growth_rate));
            }
        }
        if has("regime") {
            if let Some(regime) = macro_data.market_regime.as_ref() {
                match regime.kind {
                    Some(RegimeKind::RiskOn) => parts.push("Risk-on regime".to_string()),
                    Some(RegimeKind::RiskOff) => parts.push("Risk-off regime".to_string()),
                    Some(RegimeKind::Neutral) => parts.push("Neutral regime".to_string()),
                    None => {}
                }
                if let Some(vix) = regime.vix {
                    parts.push(format!("VIX at {vix:.1}"));
                }
            }
        }

        if parts.is_empty() {
            "Mixed macro environment".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Default for MacroAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for MacroAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        let Some(macro_data) = data.macro_data.as_ref() else {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.2,
                "No macroeconomic data available for detailed analysis.",
            ));
        };

        let mut scores: Vec<(&str, f64)> = Vec::new();
        if let Some(rates) = macro_data.interest_rates.as_ref() {
            scores.push(("rates", Self::analyze_interest_rates(rates)));
        }
        if let Some(inflation) = macro_data.inflation.as_ref() {
            scores.push(("inflation", Self::analyze_inflation(inflation)));
        }
        if let Some(gdp) = macro_data.gdp_growth.as_ref() {
            scores.push(("gdp", Self::analyze_gdp(gdp)));
        }
        if let Some(employment) = macro_data.unemployment.as_ref() {
            scores.push(("employment", Self::analyze_employment(employment)));
        }
        if let Some(regime) = macro_data.market_regime.as_ref() {
            scores.push(("regime", Self::analyze_market_regime(regime)));
        }

        if scores.is_empty() {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.2,
                "No macroeconomic data available for detailed analysis.",
            ));
        }

        let values: Vec<f64> = scores.iter().map(|(_, v)| *v).collect();
        let final_score = mean(&values);
        let confidence = (0.4 + 0.1 * scores.len() as f64).min(0.8);
        let reasoning = Self::build_reasoning(&scores, macro_data);

        let metadata = json!({
            "macro_scores": scores
                .iter()
                .map(|(name, score)| ((*name).to_string(), json!(score)))
                .collect::<serde_json::Map<_, _>>(),
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::MacroData;

    #[test]
    fn test_easy_money_scores_well() {
        let rates = InterestRates {
            current_rate: 1.5,
            trend: Some(RateTrend::Falling),
            next_meeting_expectation: Some(PolicyExpectation::Cut),
        };
        // 40 + 30 + 20
        assert_eq!(MacroAgent::analyze_interest_rates(&rates), 90.0);
    }

    #[test]
    fn test_tight_money_scores_poorly() {
        let rates = InterestRates {
            current_rate: 6.5,
            trend: Some(RateTrend::Rising),
            next_meeting_expectation: Some(PolicyExpectation::Hike),
        };
        assert_eq!(MacroAgent::analyze_interest_rates(&rates), -90.0);
    }

    #[test]
    fn test_inflation_near_target_is_favorable() {
        let inflation = Inflation {
            current_rate: 2.2,
            target_rate: 2.0,
            trend: Some(RateTrend::Falling),
        };
        // deviation 0.2 -> 40, above target and falling -> +30
        assert_eq!(MacroAgent::analyze_inflation(&inflation), 70.0);
    }

    #[test]
    fn test_runaway_inflation_penalized() {
        let inflation = Inflation {
            current_rate: 8.0,
            target_rate: 2.0,
            trend: Some(RateTrend::Rising),
        };
        // deviation 6 -> -40, rising above target -> -40, >5% -> -30
        assert_eq!(MacroAgent::analyze_inflation(&inflation), -100.0);
    }

    #[test]
    fn test_deflation_risk_penalized() {
        let inflation = Inflation {
            current_rate: 0.5,
            target_rate: 2.0,
            trend: Some(RateTrend::Falling),
        };
        // deviation 1.5 -> -10, falling below target -> -20
        assert_eq!(MacroAgent::analyze_inflation(&inflation), -30.0);
    }

    #[test]
    fn test_gdp_bands() {
        let strong = GdpGrowth {
            growth_rate: 4.5,
            trend: Some(GrowthTrend::Accelerating),
        };
        assert_eq!(MacroAgent::analyze_gdp(&strong), 70.0);

        let recession = GdpGrowth {
            growth_rate: -2.0,
            trend: Some(GrowthTrend::Decelerating),
        };
        assert_eq!(MacroAgent::analyze_gdp(&recession), -80.0);
    }

    #[test]
    fn test_employment_bands() {
        let tight = Unemployment {
            unemployment_rate: 3.6,
            trend: Some(RateTrend::Falling),
        };
        assert_eq!(MacroAgent::analyze_employment(&tight), 60.0);

        let weak = Unemployment {
            unemployment_rate: 8.0,
            trend: Some(RateTrend::Rising),
        };
        assert_eq!(MacroAgent::analyze_employment(&weak), -70.0);
    }

    #[test]
    fn test_market_regime_composite() {
        let regime = MarketRegime {
            kind: Some(RegimeKind::RiskOn),
            vix: Some(13.0),
            yield_curve: Some(YieldCurveShape::Normal),
        };
        // 50 + 30 + 20
        assert_eq!(MacroAgent::analyze_market_regime(&regime), 100.0);

        let fearful = MarketRegime {
            kind: Some(RegimeKind::RiskOff),
            vix: Some(35.0),
            yield_curve: Some(YieldCurveShape::Inverted),
        };
        assert_eq!(MacroAgent::analyze_market_regime(&fearful), -100.0);
    }

    #[tokio::test]
    async fn test_no_macro_data_is_fixed_low_confidence_neutral() {
        let agent = MacroAgent::new();
        let insight = agent.analyze("AAPL", &MarketData::default()).await.unwrap();
        assert_eq!(insight.score(), 0.0);
        assert_eq!(insight.confidence(), 0.2);
    }

    #[tokio::test]
    async fn test_confidence_grows_with_coverage() {
        let two_sections = MarketData {
            macro_data: Some(MacroData {
                interest_rates: Some(InterestRates {
                    current_rate: 3.0,
                    trend: None,
                    next_meeting_expectation: None,
                }),
                gdp_growth: Some(GdpGrowth {
                    growth_rate: 2.5,
                    trend: None,
                }),
                ..MacroData::default()
            }),
            ..MarketData::default()
        };
        let agent = MacroAgent::new();
        let insight = agent.analyze("AAPL", &two_sections).await.unwrap();
        assert!((insight.confidence() - 0.6).abs() < 1e-9);
        // rates 20 and gdp 30 average out
        assert!((insight.score() - 25.0).abs() < 1e-9);
    }
}
