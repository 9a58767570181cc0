use async_trait::async_trait;

use crate::{scoring, AgentError, Insight, MarketData};

/// Identity and run configuration shared by every agent: display name,
/// relative weight in the combination, and an enabled flag.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    name: String,
    weight: f64,
    enabled: bool,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight: scoring::clamp_unit(weight),
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = scoring::clamp_unit(weight);
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

/// One analytical perspective: turns a symbol plus data bundle into an
/// [`Insight`].
///
/// `analyze` must behave as a pure function of its inputs and must not
/// fail for missing data; a perspective that has nothing to work with
/// returns a low- or zero-confidence insight explaining why. An `Err`
/// is reserved for genuinely unexpected conditions and is handled at
/// the orchestrator boundary.
#[async_trait]
pub trait Agent: Send + Sync {
    fn profile(&self) -> &AgentProfile;

    fn profile_mut(&mut self) -> &mut AgentProfile;

    async fn analyze(&self, symbol: &str, data: &MarketData) -> Result<Insight, AgentError>;

    fn name(&self) -> &str {
        self.profile().name()
    }

    fn weight(&self) -> f64 {
        self.profile().weight()
    }

    fn enabled(&self) -> bool {
        self.profile().enabled()
    }

    /// Set the relative weight, clamped to [0, 1].
    fn set_weight(&mut self, weight: f64) {
        self.profile_mut().set_weight(weight);
    }

    fn enable(&mut self) {
        self.profile_mut().enable();
    }

    fn disable(&mut self) {
        self.profile_mut().disable();
    }
}
