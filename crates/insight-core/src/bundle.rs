use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// The data bundle handed to every agent for one analysis run.
///
/// Produced by an external market-data collaborator. Every section is
/// optional; agents branch on presence and treat a missing section as
/// "not available", never as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketData {
    /// Time-ordered OHLCV series, oldest first. May be empty.
    #[serde(default)]
    pub price_history: Vec<Bar>,
    #[serde(default)]
    pub fundamentals: Option<Fundamentals>,
    #[serde(default)]
    pub sentiment: Option<SentimentData>,
    #[serde(default)]
    pub macro_data: Option<MacroData>,
    #[serde(default)]
    pub sector_data: Option<SectorData>,
    /// Benchmark daily return series aligned to `price_history`, used
    /// for beta. Absent when no benchmark is available.
    #[serde(default)]
    pub market_returns: Option<Vec<f64>>,
}

/// Named financial metrics. Ratios are plain ratios (P/E 18.2), rates
/// and margins are fractions (ROE 0.18 = 18%).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(default)]
    pub trailing_pe: Option<f64>,
    #[serde(default)]
    pub forward_pe: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default)]
    pub peg_ratio: Option<f64>,
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub return_on_assets: Option<f64>,
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub operating_margin: Option<f64>,
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub quarterly_revenue_growth: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub quick_ratio: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub payout_ratio: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// Pre-processed sentiment sources. Each source is optional and scored
/// independently by the sentiment agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentData {
    #[serde(default)]
    pub news: Option<Vec<NewsItem>>,
    #[serde(default)]
    pub social_media: Option<SocialMediaStats>,
    #[serde(default)]
    pub analyst_ratings: Option<AnalystRatings>,
    #[serde(default)]
    pub insider_trades: Option<Vec<InsiderTrade>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub sentiment: SentimentValue,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Per-item news sentiment: either a numeric score in [-1, 1] or a
/// coarse label from the upstream classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SentimentValue {
    Score(f64),
    Label(SentimentLabel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentValue {
    /// Numeric value in [-1, 1]; labels map to +/-0.7 and 0.
    pub fn as_score(&self) -> f64 {
        match self {
            SentimentValue::Score(s) => *s,
            SentimentValue::Label(SentimentLabel::Positive) => 0.7,
            SentimentValue::Label(SentimentLabel::Negative) => -0.7,
            SentimentValue::Label(SentimentLabel::Neutral) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialMediaStats {
    #[serde(default)]
    pub mentions: u64,
    /// Mean sentiment in [-1, 1].
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub trending: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystRatings {
    #[serde(default)]
    pub strong_buy: u32,
    #[serde(default)]
    pub buy: u32,
    #[serde(default)]
    pub hold: u32,
    #[serde(default)]
    pub sell: u32,
    #[serde(default)]
    pub strong_sell: u32,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl AnalystRatings {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub side: TradeSide,
    pub value: f64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Macroeconomic readings. Each sub-section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroData {
    #[serde(default)]
    pub interest_rates: Option<InterestRates>,
    #[serde(default)]
    pub inflation: Option<Inflation>,
    #[serde(default)]
    pub gdp_growth: Option<GdpGrowth>,
    #[serde(default)]
    pub unemployment: Option<Unemployment>,
    #[serde(default)]
    pub market_regime: Option<MarketRegime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRates {
    /// Policy rate in percent.
    pub current_rate: f64,
    #[serde(default)]
    pub trend: Option<RateTrend>,
    #[serde(default)]
    pub next_meeting_expectation: Option<PolicyExpectation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateTrend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyExpectation {
    Cut,
    Hold,
    Hike,
}

fn default_inflation_target() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inflation {
    /// Year-over-year rate in percent.
    pub current_rate: f64,
    /// Central-bank target, percent.
    #[serde(default = "default_inflation_target")]
    pub target_rate: f64,
    #[serde(default)]
    pub trend: Option<RateTrend>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdpGrowth {
    /// Annualized growth rate in percent.
    pub growth_rate: f64,
    #[serde(default)]
    pub trend: Option<GrowthTrend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTrend {
    Accelerating,
    Decelerating,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unemployment {
    /// Headline rate in percent.
    pub unemployment_rate: f64,
    #[serde(default)]
    pub trend: Option<RateTrend>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketRegime {
    #[serde(default, rename = "type")]
    pub kind: Option<RegimeKind>,
    #[serde(default)]
    pub vix: Option<f64>,
    #[serde(default)]
    pub yield_curve: Option<YieldCurveShape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeKind {
    RiskOn,
    RiskOff,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YieldCurveShape {
    Normal,
    Flat,
    Inverted,
}

/// Sector and peer context for the relative-positioning analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorData {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub sector_averages: Option<SectorAverages>,
    #[serde(default)]
    pub market_position: Option<MarketPosition>,
    #[serde(default)]
    pub peer_performance: Option<PeerPerformance>,
    #[serde(default)]
    pub sector_trends: Option<SectorTrends>,
}

/// Sector-mean values for the six comparison metrics, same units as
/// [`Fundamentals`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorAverages {
    #[serde(default)]
    pub trailing_pe: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPosition {
    /// Market share in percent.
    #[serde(default)]
    pub market_share: Option<f64>,
    /// Rank within the sector, 1 = leader.
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub competitive_advantage: Option<CompetitiveAdvantage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitiveAdvantage {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerPerformance {
    /// Year-to-date return in percent.
    #[serde(default)]
    pub ytd_performance: Option<f64>,
    #[serde(default)]
    pub peer_avg_ytd: Option<f64>,
    /// Performance percentile among peers, 0-100.
    #[serde(default)]
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorTrends {
    #[serde(default)]
    pub sector_momentum: Option<SectorMomentum>,
    #[serde(default)]
    pub outlook: Option<SectorOutlook>,
    #[serde(default)]
    pub regulatory_environment: Option<RegulatoryEnvironment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorMomentum {
    Strong,
    Moderate,
    Weak,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorOutlook {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatoryEnvironment {
    Favorable,
    Neutral,
    Unfavorable,
}
