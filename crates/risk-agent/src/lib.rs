use async_trait::async_trait;
use insight_core::scoring::{band_above, band_below, mean, quantile};
use insight_core::{Agent, AgentError, AgentProfile, Insight, MarketData};
use serde_json::json;
use statrs::statistics::Statistics;

const MIN_OBSERVATIONS: usize = 30;
const TRADING_DAYS: f64 = 252.0;
const RISK_FREE_RATE: f64 = 0.02;

const VOLATILITY_TIERS: &[(f64, f64)] = &[(0.15, 60.0), (0.25, 30.0), (0.35, 0.0), (0.50, -40.0)];
const SHARPE_TIERS: &[(f64, f64)] = &[(2.0, 80.0), (1.0, 50.0), (0.5, 20.0), (0.0, -10.0)];
const DRAWDOWN_TIERS: &[(f64, f64)] = &[(10.0, 70.0), (20.0, 40.0), (30.0, 10.0), (50.0, -30.0)];
const VAR_TIERS: &[(f64, f64)] = &[(2.0, 60.0), (3.0, 30.0), (5.0, 0.0), (7.0, -30.0)];
const BETA_TIERS: &[(f64, f64)] = &[(0.7, 40.0), (1.2, 20.0), (1.5, -10.0)];

/// Downside perspective: volatility, risk-adjusted return, drawdown,
/// tail risk, and market sensitivity, banded into an overall risk score
/// where positive means an acceptable profile.
pub struct RiskAgent {
    profile: AgentProfile,
}

#[derive(Debug, Clone)]
struct RiskMetrics {
    volatility: f64,
    annual_return: f64,
    sharpe_ratio: f64,
    sortino_ratio: f64,
    /// Peak-to-trough decline as a negative fraction.
    max_drawdown: f64,
    /// 5% quantile of daily returns, negative in a normal tape.
    var_95: f64,
    cvar_95: f64,
    beta: Option<f64>,
    downside_deviation: f64,
    ulcer_index: f64,
}

impl RiskAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Risk Analyst", weight),
        }
    }

    fn daily_returns(closes: &[f64]) -> Vec<f64> {
        closes
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    fn compute_metrics(closes: &[f64], market_returns: Option<&[f64]>) -> RiskMetrics {
        let returns = Self::daily_returns(closes);

        let volatility = returns.as_slice().std_dev() * TRADING_DAYS.sqrt();

        let total_return = closes[closes.len() - 1] / closes[0] - 1.0;
        let years = closes.len() as f64 / TRADING_DAYS;
        let annual_return = (1.0 + total_return).powf(1.0 / years) - 1.0;

        let excess_return = annual_return - RISK_FREE_RATE;
        let sharpe_ratio = if volatility > 0.0 {
            excess_return / volatility
        } else {
            0.0
        };

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_deviation = if downside.len() >= 2 {
            downside.as_slice().std_dev() * TRADING_DAYS.sqrt()
        } else {
            0.0
        };
        let sortino_ratio = if downside_deviation > 0.0 {
            excess_return / downside_deviation
        } else {
            0.0
        };

        // Cumulative return path and its drawdown series
        let mut cumulative = 1.0;
        let mut running_max = 1.0;
        let mut max_drawdown = 0.0_f64;
        let mut squared_drawdown_sum = 0.0;
        for r in &returns {
            cumulative *= 1.0 + r;
            if cumulative > running_max {
                running_max = cumulative;
            }
            let drawdown = (cumulative - running_max) / running_max;
            max_drawdown = max_drawdown.min(drawdown);
            squared_drawdown_sum += drawdown * drawdown;
        }
        let ulcer_index = if returns.is_empty() {
            0.0
        } else {
            (squared_drawdown_sum / returns.len() as f64).sqrt()
        };

        let var_95 = quantile(&returns, 0.05);
        let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var_95).collect();
        let cvar_95 = if tail.is_empty() { var_95 } else { mean(&tail) };

        let beta = market_returns.and_then(|bench| Self::beta(&returns, bench));

        RiskMetrics {
            volatility,
            annual_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            var_95,
            cvar_95,
            beta,
            downside_deviation,
            ulcer_index,
        }
    }

    /// Covariance over benchmark variance, on the tail-aligned overlap
    /// of the two series.
    fn beta(returns: &[f64], benchmark: &[f64]) -> Option<f64> {
        let n = returns.len().min(benchmark.len());
        if n < 2 {
            return None;
        }
        let asset = &returns[returns.len() - n..];
        let bench = &benchmark[benchmark.len() - n..];

        let asset_mean = mean(asset);
        let bench_mean = mean(bench);

        let mut covariance = 0.0;
        let mut bench_variance = 0.0;
        for i in 0..n {
            let asset_diff = asset[i] - asset_mean;
            let bench_diff = bench[i] - bench_mean;
            covariance += asset_diff * bench_diff;
            bench_variance += bench_diff * bench_diff;
        }

        if bench_variance == 0.0 {
            return Some(1.0);
        }
        Some(covariance / bench_variance)
    }

    fn evaluate_volatility(volatility: f64) -> f64 {
        band_below(volatility, VOLATILITY_TIERS, -70.0)
    }

    fn evaluate_sharpe(sharpe: f64) -> f64 {
        band_above(sharpe, SHARPE_TIERS, -60.0)
    }

    fn evaluate_drawdown(max_drawdown: f64) -> f64 {
        band_below(max_drawdown.abs() * 100.0, DRAWDOWN_TIERS, -70.0)
    }

    fn evaluate_var(var_95: f64) -> f64 {
        band_below(var_95.abs() * 100.0, VAR_TIERS, -60.0)
    }

    fn evaluate_beta(beta: f64) -> f64 {
        if beta < 0.0 {
            // negative market correlation, unusual enough to distrust
            return -50.0;
        }
        band_below(beta, BETA_TIERS, -40.0)
    }

    fn build_reasoning(scores: &[f64], metrics: &RiskMetrics) -> String {
        let mut parts = Vec::new();

        let avg = mean(scores);
        let risk_level = if avg > 30.0 {
            "Favorable risk profile"
        } else if avg > 0.0 {
            "Moderate risk"
        } else if avg > -30.0 {
            "Elevated risk"
        } else {
            "Very high risk"
        };
        parts.push(risk_level.to_string());

        parts.push(format!(
            "Annualized volatility {:.1}%",
            metrics.volatility * 100.0
        ));

        let sharpe_quality = if metrics.sharpe_ratio > 2.0 {
            "excellent"
        } else if metrics.sharpe_ratio > 1.0 {
            "good"
        } else {
            "weak"
        };
        parts.push(format!(
            "Sharpe ratio {:.2} ({} risk-adjusted return)",
            metrics.sharpe_ratio, sharpe_quality
        ));

        parts.push(format!(
            "Max drawdown {:.1}%",
            metrics.max_drawdown.abs() * 100.0
        ));
        parts.push(format!(
            "VaR(95%) {:.1}% one-day loss potential",
            metrics.var_95.abs() * 100.0
        ));

        if let Some(beta) = metrics.beta {
            let character = if beta < 0.8 {
                "defensive"
            } else if beta > 1.2 {
                "aggressive"
            } else {
                "market-like"
            };
            parts.push(format!("Beta {beta:.2} ({character})"));
        }

        parts.join("; ")
    }
}

impl Default for RiskAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for RiskAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        if data.price_history.len() < MIN_OBSERVATIONS {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.0,
                "Insufficient price history for risk analysis (need at least 30 observations).",
            ));
        }

        let closes: Vec<f64> = data.price_history.iter().map(|b| b.close).collect();
        let metrics = Self::compute_metrics(&closes, data.market_returns.as_deref());

        let mut scores = vec![
            Self::evaluate_volatility(metrics.volatility),
            Self::evaluate_sharpe(metrics.sharpe_ratio),
            Self::evaluate_drawdown(metrics.max_drawdown),
            Self::evaluate_var(metrics.var_95),
        ];
        if let Some(beta) = metrics.beta {
            scores.push(Self::evaluate_beta(beta));
        }

        let final_score = mean(&scores);
        let confidence = (0.5 + 0.08 * scores.len() as f64).min(0.85);
        let reasoning = Self::build_reasoning(&scores, &metrics);

        let metadata = json!({
            "risk_metrics": {
                "volatility": metrics.volatility,
                "annual_return": metrics.annual_return,
                "sharpe_ratio": metrics.sharpe_ratio,
                "sortino_ratio": metrics.sortino_ratio,
                "max_drawdown": metrics.max_drawdown,
                "var_95": metrics.var_95,
                "cvar_95": metrics.cvar_95,
                "beta": metrics.beta,
                "downside_deviation": metrics.downside_deviation,
                "ulcer_index": metrics.ulcer_index,
            },
            "band_scores": scores,
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}
