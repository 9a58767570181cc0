use async_trait::async_trait;
use insight_core::scoring::{band_above, band_below, clamp_score, mean};
use insight_core::{
    Agent, AgentError, AgentProfile, CompetitiveAdvantage, Fundamentals, Insight, MarketData,
    MarketPosition, PeerPerformance, RegulatoryEnvironment, SectorAverages, SectorData,
    SectorMomentum, SectorOutlook, SectorTrends,
};
use serde_json::json;

const MARKET_SHARE_TIERS: &[(f64, f64)] = &[(20.0, 60.0), (10.0, 40.0), (5.0, 20.0)];
const OUTPERFORMANCE_TIERS: &[(f64, f64)] =
    &[(10.0, 60.0), (5.0, 35.0), (-5.0, 10.0), (-10.0, -30.0)];
const PERCENTILE_TIERS: &[(f64, f64)] = &[(80.0, 50.0), (60.0, 25.0), (40.0, 0.0)];

/// Sectors that currently enjoy a structural tailwind or headwind,
/// used only by the static fallback when no peer data exists.
const FAVORABLE_SECTORS: &[&str] = &["Technology", "Healthcare", "Consumer Discretionary"];
const CHALLENGED_SECTORS: &[&str] = &["Energy", "Utilities"];

enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Relative perspective: how the company stacks up against its sector
/// averages, peers, and the sector's own trajectory.
pub struct SectorAgent {
    profile: AgentProfile,
}

impl SectorAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Sector Analyst", weight),
        }
    }

    /// Direction-aware ratio banding of company metrics against sector
    /// means. Zero when no metric pair is present.
    fn compare_fundamentals(company: Option<&Fundamentals>, sector: &SectorAverages) -> f64 {
        let Some(company) = company else { return 0.0 };

        let comparisons: [(Option<f64>, Option<f64>, Direction); 6] = [
            (company.trailing_pe, sector.trailing_pe, Direction::LowerIsBetter),
            (company.price_to_book, sector.price_to_book, Direction::LowerIsBetter),
            (company.return_on_equity, sector.return_on_equity, Direction::HigherIsBetter),
            (company.profit_margin, sector.profit_margin, Direction::HigherIsBetter),
            (company.revenue_growth, sector.revenue_growth, Direction::HigherIsBetter),
            (company.debt_to_equity, sector.debt_to_equity, Direction::LowerIsBetter),
        ];

        let mut score = 0.0;
        let mut count = 0u32;
        for (company_value, sector_value, direction) in comparisons {
            let (Some(company_value), Some(sector_value)) = (company_value, sector_value) else {
                continue;
            };
            if sector_value == 0.0 {
                continue;
            }
            let ratio = company_value / sector_value;
            score += match direction {
                Direction::HigherIsBetter => {
                    band_above(ratio, &[(1.3, 60.0), (1.1, 30.0), (0.9, 0.0)], -40.0)
                }
                Direction::LowerIsBetter => {
                    band_below(ratio, &[(0.7, 60.0), (0.9, 30.0), (1.1, 0.0)], -40.0)
                }
            };
            count += 1;
        }

        if count > 0 {
            score / f64::from(count)
        } else {
            0.0
        }
    }

    fn evaluate_market_position(position: &MarketPosition) -> f64 {
        let mut score = 0.0;

        if let Some(share) = position.market_share {
            score += band_above(share, MARKET_SHARE_TIERS, 0.0);
        }

        if let Some(rank) = position.rank {
            score += if rank == 1 {
                50.0
            } else if rank <= 3 {
                30.0
            } else if rank <= 10 {
                10.0
            } else {
                -10.0
            };
        }

        match position.competitive_advantage {
            Some(CompetitiveAdvantage::Strong) => score += 40.0,
            Some(CompetitiveAdvantage::Moderate) => score += 15.0,
            Some(CompetitiveAdvantage::Weak) => score -= 20.0,
            None => {}
        }

        clamp_score(score)
    }

    fn compare_peer_performance(peers: &PeerPerformance) -> f64 {
        let mut score = 0.0;

        if let (Some(company), Some(peer_avg)) = (peers.ytd_performance, peers.peer_avg_ytd) {
            let outperformance = company - peer_avg;
            score += band_above(outperformance, OUTPERFORMANCE_TIERS, -60.0);
        }

        if let Some(percentile) = peers.percentile {
            score += band_above(percentile, PERCENTILE_TIERS, -30.0);
        }

        clamp_score(score)
    }

    fn evaluate_sector_trends(trends: &SectorTrends) -> f64 {
        let mut score = 0.0;

        match trends.sector_momentum {
            Some(SectorMomentum::Strong) => score += 50.0,
            Some(SectorMomentum::Moderate) => score += 20.0,
            Some(SectorMomentum::Weak) => score -= 10.0,
            Some(SectorMomentum::Negative) => score -= 50.0,
            None => {}
        }

        match trends.outlook {
            Some(SectorOutlook::Bullish) => score += 40.0,
            Some(SectorOutlook::Bearish) => score -= 40.0,
            Some(SectorOutlook::Neutral) | None => {}
        }

        match trends.regulatory_environment {
            Some(RegulatoryEnvironment::Favorable) => score += 30.0,
            Some(RegulatoryEnvironment::Unfavorable) => score -= 30.0,
            Some(RegulatoryEnvironment::Neutral) | None => {}
        }

        clamp_score(score)
    }

    fn build_reasoning(
        scores: &[(&str, f64)],
        sector_data: &SectorData,
    ) -> String {
        let mut parts = Vec::new();
        let lookup = |key: &str| scores.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        if let Some(sector) = sector_data.sector.as_deref() {
            parts.push(format!("Sector: {sector}"));
        }
        if let Some(industry) = sector_data.industry.as_deref() {
            parts.push(format!("Industry: {industry}"));
        }

        if let Some(comparison) = lookup("fundamental_comparison") {
            if comparison > 30.0 {
                parts.push("Metrics above sector average".to_string());
            } else if comparison < -30.0 {
                parts.push("Metrics below sector average".to_string());
            }
        }
        if let Some(position_score) = lookup("market_position") {
            if position_score > 30.0 {
                if let Some(rank) = sector_data
                    .market_position
                    .as_ref()
                    .and_then(|p| p.rank)
                {
                    parts.push(format!("Well positioned in sector (rank #{rank})"));
                }
            }
        }
        if lookup("peer_performance").is_some() {
            if let Some(percentile) = sector_data
                .peer_performance
                .as_ref()
                .and_then(|p| p.percentile)
            {
                parts.push(format!("Performance at the {percentile:.0}th percentile vs peers"));
            }
        }
        if lookup("sector_trends").is_some() {
            if let Some(outlook) = sector_data.sector_trends.as_ref().and_then(|t| t.outlook) {
                let label = match outlook {
                    SectorOutlook::Bullish => "Bullish",
                    SectorOutlook::Neutral => "Neutral",
                    SectorOutlook::Bearish => "Bearish",
                };
                parts.push(format!("Sector outlook: {label}"));
            }
        }

        if parts.is_empty() {
            "Limited sector view".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// Static classification when no structured sector or peer data is
    /// available, at reduced confidence.
    fn static_classification(&self, fundamentals: Option<&Fundamentals>) -> Insight {
        let sector = fundamentals
            .and_then(|f| f.sector.as_deref())
            .unwrap_or("Unknown");
        let industry = fundamentals
            .and_then(|f| f.industry.as_deref())
            .unwrap_or("Unknown");

        let mut reasoning = format!("Sector: {sector}, Industry: {industry}");
        let score = if FAVORABLE_SECTORS.contains(&sector) {
            reasoning.push_str(" (sector with a positive outlook)");
            20.0
        } else if CHALLENGED_SECTORS.contains(&sector) {
            reasoning.push_str(" (sector facing headwinds)");
            -20.0
        } else {
            0.0
        };

        Insight::new(self.name(), score, 0.3, reasoning)
    }
}

impl Default for SectorAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for SectorAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        let sector_data = data.sector_data.as_ref();
        let fundamentals = data.fundamentals.as_ref();

        if sector_data.is_none() && fundamentals.is_none() {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.1,
                "No sector data available.",
            ));
        }

        let mut scores: Vec<(&str, f64)> = Vec::new();
        if let Some(sd) = sector_data {
            if let Some(averages) = sd.sector_averages.as_ref() {
                scores.push((
                    "fundamental_comparison",
                    Self::compare_fundamentals(fundamentals, averages),
                ));
            }
            if let Some(position) = sd.market_position.as_ref() {
                scores.push(("market_position", Self::evaluate_market_position(position)));
            }
            if let Some(peers) = sd.peer_performance.as_ref() {
                scores.push(("peer_performance", Self::compare_peer_performance(peers)));
            }
            if let Some(trends) = sd.sector_trends.as_ref() {
                scores.push(("sector_trends", Self::evaluate_sector_trends(trends)));
            }
        }

        if scores.is_empty() {
            return Ok(self.static_classification(fundamentals));
        }

        let values: Vec<f64> = scores.iter().map(|(_, v)| *v).collect();
        let final_score = mean(&values);
        let confidence = (0.4 + 0.12 * scores.len() as f64).min(0.85);
        // scores is non-empty only when sector_data is present
        let reasoning = sector_data
            .map(|sd| Self::build_reasoning(&scores, sd))
            .unwrap_or_else(|| "Limited sector view".to_string());

        let metadata = json!({
            "sector": sector_data.and_then(|sd| sd.sector.clone()),
            "sector_scores": scores
                .iter()
                .map(|(name, score)| ((*name).to_string(), json!(score)))
                .collect::<serde_json::Map<_, _>>(),
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}
