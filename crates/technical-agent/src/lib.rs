use async_trait::async_trait;
use insight_core::scoring::{self, clamp_score};
use insight_core::{Agent, AgentError, AgentProfile, Insight, MarketData};
use serde_json::json;

pub mod indicators;

use indicators::{bollinger, macd, rsi, sma, Bollinger, Macd};

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_WIDTH: f64 = 2.0;
const VOLUME_AVG_PERIOD: usize = 20;
const VOLUME_SPIKE_RATIO: f64 = 1.5;

/// Price-action perspective: RSI reversal, MACD crossover, moving-average
/// cross, Bollinger position, and volume confirmation, averaged into one
/// score.
pub struct TechnicalAgent {
    profile: AgentProfile,
}

struct IndicatorSet {
    rsi: Option<f64>,
    macd: Option<Macd>,
    sma_50: Option<f64>,
    sma_200: Option<f64>,
    bollinger: Option<Bollinger>,
    volume_ratio: Option<f64>,
    price_change_5: Option<f64>,
}

impl TechnicalAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Technical Analyst", weight),
        }
    }

    fn compute_indicators(closes: &[f64], volumes: &[f64]) -> IndicatorSet {
        let volume_ratio = match (volumes.last(), sma(volumes, VOLUME_AVG_PERIOD)) {
            (Some(current), Some(avg)) if avg > 0.0 => Some(current / avg),
            _ => None,
        };
        let price_change_5 = if closes.len() >= 5 {
            let base = closes[closes.len() - 5];
            if base != 0.0 {
                Some((closes[closes.len() - 1] - base) / base)
            } else {
                None
            }
        } else {
            None
        };

        IndicatorSet {
            rsi: rsi(closes, RSI_PERIOD),
            macd: macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
            sma_50: sma(closes, 50),
            sma_200: sma(closes, 200),
            bollinger: bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_WIDTH),
            volume_ratio,
            price_change_5,
        }
    }

    /// Oversold below 30 scores positive, overbought above 70 negative,
    /// linear drift toward neutral in between.
    fn evaluate_rsi(value: Option<f64>) -> f64 {
        match value {
            None => 0.0,
            Some(r) if r < 30.0 => ((30.0 - r) * 3.0).min(100.0),
            Some(r) if r > 70.0 => ((70.0 - r) * 3.0).max(-100.0),
            Some(r) => (50.0 - r) * 0.5,
        }
    }

    fn evaluate_macd(value: Option<Macd>) -> f64 {
        let Some(m) = value else { return 0.0 };
        if m.histogram > 0.0 && m.macd > m.signal {
            (m.histogram.abs() * 50.0).min(100.0)
        } else if m.histogram < 0.0 && m.macd < m.signal {
            (-m.histogram.abs() * 50.0).max(-100.0)
        } else {
            0.0
        }
    }

    /// Golden/death cross of the 50 vs 200 averages plus a price
    /// deviation term against the 50-period average.
    fn evaluate_moving_averages(
        sma_50: Option<f64>,
        sma_200: Option<f64>,
        price: Option<f64>,
    ) -> f64 {
        let (Some(s50), Some(s200), Some(price)) = (sma_50, sma_200, price) else {
            return 0.0;
        };
        let mut score = if s50 > s200 { 50.0 } else { -50.0 };
        if s50 != 0.0 {
            let deviation = (price - s50) / s50 * 100.0;
            score += (deviation * 2.0).clamp(-50.0, 50.0);
        }
        clamp_score(score)
    }

    fn evaluate_bollinger(price: Option<f64>, bands: Option<Bollinger>) -> f64 {
        let (Some(price), Some(bb)) = (price, bands) else {
            return 0.0;
        };
        let width = bb.upper - bb.lower;
        if width <= 0.0 {
            return 0.0;
        }
        let position = (price - bb.lower) / width;
        if position < 0.2 {
            60.0
        } else if position > 0.8 {
            -60.0
        } else {
            (0.5 - position) * 40.0
        }
    }

    /// Above-average volume confirms the short-term price direction.
    fn evaluate_volume(volume_ratio: Option<f64>, price_change_5: Option<f64>) -> f64 {
        let (Some(ratio), Some(change)) = (volume_ratio, price_change_5) else {
            return 0.0;
        };
        if ratio > VOLUME_SPIKE_RATIO && change > 0.0 {
            40.0
        } else if ratio > VOLUME_SPIKE_RATIO && change < 0.0 {
            -40.0
        } else {
            0.0
        }
    }

    /// 0.9 when all five sub-scores agree in direction beyond +/-20,
    /// otherwise inversely tied to their dispersion, floored at 0.3.
    fn consensus_confidence(sub_scores: &[f64]) -> f64 {
        let all_bullish = sub_scores.iter().all(|s| *s > 20.0);
        let all_bearish = sub_scores.iter().all(|s| *s < -20.0);
        if all_bullish || all_bearish {
            return 0.9;
        }
        (1.0 - scoring::population_std_dev(sub_scores) / 100.0).max(0.3)
    }

    fn build_reasoning(ind: &IndicatorSet, macd_score: f64) -> String {
        let mut parts = Vec::new();

        if let Some(r) = ind.rsi {
            if r < 30.0 {
                parts.push(format!("RSI at {r:.1} (oversold, potential entry)"));
            } else if r > 70.0 {
                parts.push(format!("RSI at {r:.1} (overbought, caution)"));
            } else {
                parts.push(format!("RSI at {r:.1} (neutral)"));
            }
        }

        if macd_score > 30.0 {
            parts.push("MACD shows bullish momentum".to_string());
        } else if macd_score < -30.0 {
            parts.push("MACD shows bearish momentum".to_string());
        }

        if let (Some(s50), Some(s200)) = (ind.sma_50, ind.sma_200) {
            if s50 > s200 {
                parts.push("Golden cross (SMA 50 above SMA 200), uptrend in place".to_string());
            } else {
                parts.push("Death cross (SMA 50 below SMA 200), downtrend in place".to_string());
            }
        }

        if parts.is_empty() {
            "Technical picture inconclusive".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Default for TechnicalAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for TechnicalAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        if data.price_history.is_empty() {
            return Ok(Insight::new(
                self.name(),
                0.0,
                0.0,
                "No price history available for technical analysis.",
            ));
        }

        let closes: Vec<f64> = data.price_history.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = data.price_history.iter().map(|b| b.volume).collect();
        let last_price = closes.last().copied();

        let ind = Self::compute_indicators(&closes, &volumes);

        let rsi_score = Self::evaluate_rsi(ind.rsi);
        let macd_score = Self::evaluate_macd(ind.macd);
        let ma_score = Self::evaluate_moving_averages(ind.sma_50, ind.sma_200, last_price);
        let bb_score = Self::evaluate_bollinger(last_price, ind.bollinger);
        let volume_score = Self::evaluate_volume(ind.volume_ratio, ind.price_change_5);

        let sub_scores = [rsi_score, macd_score, ma_score, bb_score, volume_score];
        let final_score = scoring::mean(&sub_scores);
        let confidence = Self::consensus_confidence(&sub_scores);
        let reasoning = Self::build_reasoning(&ind, macd_score);

        let metadata = json!({
            "indicators": {
                "rsi": ind.rsi,
                "macd": ind.macd.map(|m| m.macd),
                "macd_signal": ind.macd.map(|m| m.signal),
                "macd_histogram": ind.macd.map(|m| m.histogram),
                "sma_50": ind.sma_50,
                "sma_200": ind.sma_200,
                "bb_upper": ind.bollinger.map(|b| b.upper),
                "bb_middle": ind.bollinger.map(|b| b.middle),
                "bb_lower": ind.bollinger.map(|b| b.lower),
                "volume_ratio": ind.volume_ratio,
            },
            "sub_scores": {
                "rsi": rsi_score,
                "macd": macd_score,
                "moving_averages": ma_score,
                "bollinger": bb_score,
                "volume": volume_score,
            },
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}
