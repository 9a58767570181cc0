use async_trait::async_trait;
use insight_core::scoring::{band_above, band_below, clamp_score, mean};
use insight_core::{Agent, AgentError, AgentProfile, Fundamentals, Insight, MarketData};
use serde_json::json;

const PE_TIERS: &[(f64, f64)] = &[(15.0, 60.0), (25.0, 20.0), (35.0, -20.0)];
const PB_TIERS: &[(f64, f64)] = &[(1.0, 50.0), (3.0, 10.0), (5.0, -20.0)];
const PEG_TIERS: &[(f64, f64)] = &[(1.0, 50.0), (2.0, 20.0)];
const ROE_TIERS: &[(f64, f64)] = &[(20.0, 60.0), (15.0, 30.0), (10.0, 10.0)];
const ROA_TIERS: &[(f64, f64)] = &[(10.0, 40.0), (5.0, 20.0)];
const NET_MARGIN_TIERS: &[(f64, f64)] = &[(20.0, 50.0), (10.0, 25.0), (5.0, 10.0)];
const OP_MARGIN_TIERS: &[(f64, f64)] = &[(15.0, 40.0), (10.0, 20.0)];
const REVENUE_GROWTH_TIERS: &[(f64, f64)] = &[(20.0, 70.0), (10.0, 40.0), (5.0, 20.0), (0.0, 5.0)];
const EARNINGS_GROWTH_TIERS: &[(f64, f64)] = &[(25.0, 70.0), (15.0, 40.0), (5.0, 20.0)];
const QUARTERLY_GROWTH_TIERS: &[(f64, f64)] = &[(15.0, 50.0), (5.0, 25.0)];
const DEBT_EQUITY_TIERS: &[(f64, f64)] = &[(0.3, 60.0), (0.7, 30.0), (1.5, 0.0)];
const CURRENT_RATIO_TIERS: &[(f64, f64)] = &[(2.0, 50.0), (1.5, 30.0), (1.0, 10.0)];
const QUICK_RATIO_TIERS: &[(f64, f64)] = &[(1.5, 40.0), (1.0, 20.0)];
const YIELD_TIERS: &[(f64, f64)] = &[(4.0, 50.0), (2.0, 30.0), (1.0, 15.0)];

/// Balance-sheet perspective: valuation, profitability, growth,
/// financial health, and dividend policy, averaged over whichever
/// sub-evaluators have enough input.
pub struct FundamentalAgent {
    profile: AgentProfile,
}

impl FundamentalAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Fundamental Analyst", weight),
        }
    }

    fn evaluate_valuation(f: &Fundamentals) -> Option<f64> {
        let mut score = 0.0;
        let mut count = 0u32;

        if let Some(pe) = f.trailing_pe.or(f.forward_pe) {
            if pe > 0.0 {
                score += band_below(pe, PE_TIERS, -60.0);
                count += 1;
            }
        }
        if let Some(pb) = f.price_to_book {
            if pb > 0.0 {
                score += band_below(pb, PB_TIERS, -50.0);
                count += 1;
            }
        }
        if let Some(peg) = f.peg_ratio {
            if peg > 0.0 {
                score += band_below(peg, PEG_TIERS, -30.0);
                count += 1;
            }
        }

        (count > 0).then(|| score / f64::from(count))
    }

    fn evaluate_profitability(f: &Fundamentals) -> Option<f64> {
        let mut score = 0.0;
        let mut count = 0u32;

        if let Some(roe) = f.return_on_equity.filter(|v| *v != 0.0) {
            score += band_above(roe * 100.0, ROE_TIERS, -20.0);
            count += 1;
        }
        if let Some(roa) = f.return_on_assets.filter(|v| *v != 0.0) {
            score += band_above(roa * 100.0, ROA_TIERS, -10.0);
            count += 1;
        }
        if let Some(margin) = f.profit_margin.filter(|v| *v != 0.0) {
            score += band_above(margin * 100.0, NET_MARGIN_TIERS, -20.0);
            count += 1;
        }
        if let Some(margin) = f.operating_margin.filter(|v| *v != 0.0) {
            score += band_above(margin * 100.0, OP_MARGIN_TIERS, -10.0);
            count += 1;
        }

        (count > 0).then(|| score / f64::from(count))
    }

    fn evaluate_growth(f: &Fundamentals) -> Option<f64> {
        let mut score = 0.0;
        let mut count = 0u32;

        if let Some(growth) = f.revenue_growth.filter(|v| *v != 0.0) {
            score += band_above(growth * 100.0, REVENUE_GROWTH_TIERS, -50.0);
            count += 1;
        }
        if let Some(growth) = f.earnings_growth.filter(|v| *v != 0.0) {
            score += band_above(growth * 100.0, EARNINGS_GROWTH_TIERS, -30.0);
            count += 1;
        }
        if let Some(growth) = f.quarterly_revenue_growth.filter(|v| *v != 0.0) {
            score += band_above(growth * 100.0, QUARTERLY_GROWTH_TIERS, -20.0);
            count += 1;
        }

        (count > 0).then(|| score / f64::from(count))
    }

    fn evaluate_financial_health(f: &Fundamentals) -> Option<f64> {
        let mut score = 0.0;
        let mut count = 0u32;

        if let Some(de) = f.debt_to_equity {
            score += band_below(de, DEBT_EQUITY_TIERS, -50.0);
            count += 1;
        }
        if let Some(cr) = f.current_ratio.filter(|v| *v != 0.0) {
            score += band_above(cr, CURRENT_RATIO_TIERS, -40.0);
            count += 1;
        }
        if let Some(qr) = f.quick_ratio.filter(|v| *v != 0.0) {
            score += band_above(qr, QUICK_RATIO_TIERS, -20.0);
            count += 1;
        }

        (count > 0).then(|| score / f64::from(count))
    }

    /// A non-payer scores neutral zero; a payer is rated on yield with a
    /// payout-ratio sustainability adjustment.
    fn evaluate_dividends(f: &Fundamentals) -> Option<f64> {
        let Some(dividend_yield) = f.dividend_yield.filter(|v| *v != 0.0) else {
            return Some(0.0);
        };

        let mut score = band_above(dividend_yield * 100.0, YIELD_TIERS, 5.0);

        if let Some(payout) = f.payout_ratio.filter(|v| *v != 0.0) {
            score += if payout > 0.3 && payout < 0.6 {
                30.0 // sustainable
            } else if payout < 0.3 {
                10.0 // conservative
            } else if payout < 0.8 {
                0.0
            } else {
                -30.0 // unsustainable
            };
        }

        Some(clamp_score(score))
    }

    fn build_reasoning(scores: &[(&str, f64)], f: &Fundamentals) -> String {
        let mut parts = Vec::new();
        let lookup = |key: &str| scores.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

        if let Some(valuation) = lookup("valuation") {
            if let Some(pe) = f.trailing_pe {
                if valuation > 30.0 {
                    parts.push(format!("Attractive valuation (P/E {pe:.1})"));
                } else if valuation < -30.0 {
                    parts.push(format!("Stretched valuation (P/E {pe:.1})"));
                }
            }
        }
        if let Some(profitability) = lookup("profitability") {
            if let Some(roe) = f.return_on_equity {
                if profitability > 20.0 {
                    parts.push(format!("High profitability (ROE {:.1}%)", roe * 100.0));
                }
            }
        }
        if let Some(growth) = lookup("growth") {
            if let Some(rev) = f.revenue_growth {
                if growth > 30.0 {
                    parts.push(format!("Strong revenue growth ({:.1}%)", rev * 100.0));
                } else if growth < -20.0 {
                    parts.push("Weak or negative growth".to_string());
                }
            }
        }
        if let Some(health) = lookup("financial_health") {
            if health > 30.0 {
                parts.push("Healthy balance sheet".to_string());
            } else if health < -20.0 {
                parts.push("Leverage concerns".to_string());
            }
        }
        if let Some(dividends) = lookup("dividends") {
            if dividends > 20.0 {
                if let Some(dividend_yield) = f.dividend_yield {
                    parts.push(format!("Good dividend yield ({:.2}%)", dividend_yield * 100.0));
                }
            }
        }

        if parts.is_empty() {
            "Mixed fundamental picture".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Default for FundamentalAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for FundamentalAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        let Some(fundamentals) = data.fundamentals.as_ref() else {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.0,
                "No fundamental data available.",
            ));
        };

        let candidates = [
            ("valuation", Self::evaluate_valuation(fundamentals)),
            ("profitability", Self::evaluate_profitability(fundamentals)),
            ("growth", Self::evaluate_growth(fundamentals)),
            ("financial_health", Self::evaluate_financial_health(fundamentals)),
            ("dividends", Self::evaluate_dividends(fundamentals)),
        ];

        let valid: Vec<(&str, f64)> = candidates
            .iter()
            .filter_map(|(name, score)| score.map(|s| (*name, s)))
            .collect();

        if valid.is_empty() {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.2,
                "Insufficient fundamental metrics.",
            ));
        }

        let values: Vec<f64> = valid.iter().map(|(_, v)| *v).collect();
        let final_score = mean(&values);
        let confidence = (0.3 + 0.15 * valid.len() as f64).min(0.9);
        let reasoning = Self::build_reasoning(&valid, fundamentals);

        let metadata = json!({
            "sub_scores": valid
                .iter()
                .map(|(name, score)| ((*name).to_string(), json!(score)))
                .collect::<serde_json::Map<_, _>>(),
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}
