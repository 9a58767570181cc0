use async_trait::async_trait;
use chrono::{Duration, Utc};
use insight_core::scoring::{clamp_score, mean};
use insight_core::{
    Agent, AgentError, AgentProfile, AnalystRatings, Insight, InsiderTrade, MarketData, NewsItem,
    SocialMediaStats, TradeSide,
};
use serde_json::json;

const RECENCY_DECAY: f64 = 0.1;
const UNDATED_NEWS_WEIGHT: f64 = 0.5;
const INSIDER_WINDOW_DAYS: i64 = 90;
const MOMENTUM_LOOKBACK: usize = 20;

/// Crowd perspective: news flow, social media buzz, analyst ratings,
/// and insider activity, falling back to price momentum when none of
/// the direct sources are available.
pub struct SentimentAgent {
    profile: AgentProfile,
}

/// Sign in the numpy sense: zero maps to zero, not one.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl SentimentAgent {
    pub fn new() -> Self {
        Self::with_weight(1.0)
    }

    pub fn with_weight(weight: f64) -> Self {
        Self {
            profile: AgentProfile::new("Sentiment Analyst", weight),
        }
    }

    /// Recency-weighted mean of per-item sentiment, scaled to +/-100.
    /// Fresh articles dominate through the 1/(1 + days * 0.1) decay.
    fn analyze_news(news: &[NewsItem]) -> f64 {
        if news.is_empty() {
            return 0.0;
        }
        let now = Utc::now();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for item in news {
            let sentiment = item.sentiment.as_score();
            let weight = match item.published {
                Some(published) => {
                    let days_ago = (now - published).num_days().max(0) as f64;
                    1.0 / (1.0 + days_ago * RECENCY_DECAY)
                }
                None => UNDATED_NEWS_WEIGHT,
            };
            weighted_sum += sentiment * weight;
            weight_total += weight;
        }

        weighted_sum / weight_total * 100.0
    }

    fn analyze_social_media(social: &SocialMediaStats) -> f64 {
        let sentiment = social.sentiment_score;
        let mut score = sentiment * 60.0;

        if social.trending {
            score += if sentiment > 0.0 { 30.0 } else { -30.0 };
        }

        if social.mentions > 10_000 {
            score += 20.0 * sign(sentiment);
        } else if social.mentions > 1_000 {
            score += 10.0 * sign(sentiment);
        }

        clamp_score(score)
    }

    /// Count-weighted rating score, nudged by target-price upside.
    fn analyze_analyst_ratings(ratings: &AnalystRatings) -> f64 {
        let total = ratings.total();
        if total == 0 {
            return 0.0;
        }

        let weighted = f64::from(ratings.strong_buy) * 100.0
            + f64::from(ratings.buy) * 50.0
            - f64::from(ratings.sell) * 50.0
            - f64::from(ratings.strong_sell) * 100.0;
        let mut score = weighted / f64::from(total);

        if let (Some(target), Some(current)) = (ratings.target_price, ratings.current_price) {
            if current > 0.0 {
                let upside_pct = (target - current) / current * 100.0;
                score += (upside_pct * 0.5).clamp(-30.0, 30.0);
            }
        }

        clamp_score(score)
    }

    /// Net buying ratio over the trailing 90 days, scaled to +/-100.
    /// Undated trades are kept in the window.
    fn analyze_insider_trades(trades: &[InsiderTrade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        let cutoff = Utc::now() - Duration::days(INSIDER_WINDOW_DAYS);

        let mut buy_value = 0.0;
        let mut sell_value = 0.0;
        for trade in trades {
            if let Some(date) = trade.date {
                if date < cutoff {
                    continue;
                }
            }
            match trade.side {
                TradeSide::Buy => buy_value += trade.value,
                TradeSide::Sell => sell_value += trade.value,
            }
        }

        let total = buy_value + sell_value;
        if total == 0.0 {
            return 0.0;
        }
        (buy_value - sell_value) / total * 100.0
    }

    /// Strong agreement across sources earns 0.85, a clear majority
    /// 0.7, otherwise 0.5.
    fn consensus_confidence(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.1;
        }
        let all_positive = values.iter().all(|v| *v > 20.0);
        let all_negative = values.iter().all(|v| *v < -20.0);
        if all_positive || all_negative {
            return 0.85;
        }

        let positive = values.iter().filter(|v| **v > 20.0).count() as f64;
        let negative = values.iter().filter(|v| **v < -20.0).count() as f64;
        let majority = values.len() as f64 * 0.6;
        if positive > majority || negative > majority {
            0.7
        } else {
            0.5
        }
    }

    fn build_reasoning(scores: &[(&str, f64)], data: &MarketData) -> String {
        let mut parts = Vec::new();
        let lookup = |key: &str| scores.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        let sentiment = data.sentiment.as_ref();

        if let Some(news_score) = lookup("news") {
            let count = sentiment
                .and_then(|s| s.news.as_ref())
                .map_or(0, Vec::len);
            if news_score > 30.0 {
                parts.push(format!("Positive tone across {count} recent articles"));
            } else if news_score < -30.0 {
                parts.push(format!("Negative tone across {count} recent articles"));
            }
        }
        if let Some(social_score) = lookup("social") {
            if social_score > 30.0 {
                parts.push("Positive social media buzz".to_string());
            } else if social_score < -30.0 {
                parts.push("Negative social media sentiment".to_string());
            }
        }
        if lookup("analysts").is_some() {
            let total = sentiment
                .and_then(|s| s.analyst_ratings.as_ref())
                .map_or(0, AnalystRatings::total);
            if total > 0 {
                parts.push(format!("{total} analysts covering the name"));
            }
        }
        if let Some(insider_score) = lookup("insider") {
            if insider_score > 30.0 {
                parts.push("Insiders are net buyers".to_string());
            } else if insider_score < -30.0 {
                parts.push("Insiders are net sellers".to_string());
            }
        }

        if parts.is_empty() {
            "Mixed sentiment picture".to_string()
        } else {
            parts.join("; ")
        }
    }

    /// With no direct sources, 20-period price momentum stands in as a
    /// coarse sentiment proxy at reduced confidence.
    fn momentum_fallback(&self, data: &MarketData) -> Insight {
        let closes: Vec<f64> = data.price_history.iter().map(|b| b.close).collect();
        if closes.len() >= MOMENTUM_LOOKBACK {
            let base = closes[closes.len() - MOMENTUM_LOOKBACK];
            if base != 0.0 {
                let recent_return = (closes[closes.len() - 1] - base) / base;
                let score = (recent_return * 200.0).clamp(-50.0, 50.0);
                return Insight::new(
                    self.name(),
                    score,
                    0.3,
                    "Sentiment inferred from price momentum (no direct sentiment sources).",
                );
            }
        }
        Insight::new(self.name(), 0.0, 0.1, "No sentiment data available.")
    }
}

impl Default for SentimentAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for SentimentAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AgentProfile {
        &mut self.profile
    }

    async fn analyze(&self, _symbol: &str, data: &MarketData) -> Result<Insight, AgentError> {
        let Some(sentiment) = data.sentiment.as_ref() else {
            return Ok(self.momentum_fallback(data));
        };

        let mut scores: Vec<(&str, f64)> = Vec::new();
        if let Some(news) = sentiment.news.as_ref() {
            scores.push(("news", Self::analyze_news(news)));
        }
        if let Some(social) = sentiment.social_media.as_ref() {
            scores.push(("social", Self::analyze_social_media(social)));
        }
        if let Some(ratings) = sentiment.analyst_ratings.as_ref() {
            scores.push(("analysts", Self::analyze_analyst_ratings(ratings)));
        }
        if let Some(trades) = sentiment.insider_trades.as_ref() {
            scores.push(("insider", Self::analyze_insider_trades(trades)));
        }

        if scores.is_empty() {
            return Ok(self.momentum_fallback(data));
        }

        let values: Vec<f64> = scores.iter().map(|(_, v)| *v).collect();
        let final_score = mean(&values);
        let confidence = Self::consensus_confidence(&values);
        let reasoning = Self::build_reasoning(&scores, data);

        let metadata = json!({
            "source_scores": scores
                .iter()
                .map(|(name, score)| ((*name).to_string(), json!(score)))
                .collect::<serde_json::Map<_, _>>(),
        });

        Ok(Insight::new(self.name(), final_score, confidence, reasoning).with_metadata(metadata))
    }
}
