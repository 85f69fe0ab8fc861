//! Accuracy tiers and provider selection criteria.
//!
//! A caller declares an [`AccuracyTier`]. The tier maps to:
//!
//! - an accuracy threshold in meters: readings with a larger radius are dropped
//! - a [`ProviderCriteria`] used by the ranker to pick a balanced provider

use std::fmt;
use std::str::FromStr;

/// Caller-declared accuracy/power tradeoff, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccuracyTier {
    Lowest,
    Low,
    Medium,
    #[default]
    Best,
    BestForNavigation,
}

impl AccuracyTier {
    /// Largest accuracy radius (meters) a reading may have to be accepted.
    pub fn threshold(&self) -> f32 {
        match self {
            Self::Lowest | Self::Low => 500.0,
            Self::Medium => 250.0,
            Self::Best | Self::BestForNavigation => 50.0,
        }
    }

    /// Criteria the ranker uses to choose the balanced provider.
    pub fn criteria(&self) -> ProviderCriteria {
        match self {
            Self::Lowest => ProviderCriteria {
                accuracy: AccuracyRequirement::NoRequirement,
                power: PowerRequirement::NoRequirement,
            },
            Self::Low => ProviderCriteria {
                accuracy: AccuracyRequirement::Coarse,
                power: PowerRequirement::NoRequirement,
            },
            Self::Medium => ProviderCriteria {
                accuracy: AccuracyRequirement::Coarse,
                power: PowerRequirement::Medium,
            },
            Self::Best | Self::BestForNavigation => ProviderCriteria {
                accuracy: AccuracyRequirement::Fine,
                power: PowerRequirement::High,
            },
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Best => "best",
            Self::BestForNavigation => "best_for_navigation",
        };
        f.write_str(name)
    }
}

impl FromStr for AccuracyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "best" => Ok(Self::Best),
            "best_for_navigation" | "bestfornavigation" => Ok(Self::BestForNavigation),
            other => Err(format!("unknown accuracy tier '{}'", other)),
        }
    }
}

/// Accuracy class a provider advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccuracyClass {
    /// Meter-level (satellite).
    Fine,
    /// Block/city-level (network).
    Coarse,
}

/// Power a provider draws while subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PowerUsage {
    Low,
    Medium,
    High,
}

/// Properties a platform reports for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub accuracy: AccuracyClass,
    pub power: PowerUsage,
}

impl ProviderCapabilities {
    pub const fn new(accuracy: AccuracyClass, power: PowerUsage) -> Self {
        Self { accuracy, power }
    }
}

/// Minimum accuracy a balanced provider must offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyRequirement {
    NoRequirement,
    Coarse,
    Fine,
}

/// Maximum power a balanced provider may draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerRequirement {
    NoRequirement,
    Medium,
    High,
}

/// Tier-derived criteria for choosing the balanced provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCriteria {
    pub accuracy: AccuracyRequirement,
    pub power: PowerRequirement,
}

impl ProviderCriteria {
    /// Same criteria without a power ceiling.
    pub fn without_power(self) -> Self {
        Self {
            power: PowerRequirement::NoRequirement,
            ..self
        }
    }

    /// Check whether a provider with the given capabilities satisfies the criteria.
    pub fn matches(&self, capabilities: &ProviderCapabilities) -> bool {
        let accuracy_ok = match self.accuracy {
            AccuracyRequirement::NoRequirement | AccuracyRequirement::Coarse => true,
            AccuracyRequirement::Fine => capabilities.accuracy == AccuracyClass::Fine,
        };

        let power_ok = match self.power {
            PowerRequirement::NoRequirement | PowerRequirement::High => true,
            PowerRequirement::Medium => capabilities.power <= PowerUsage::Medium,
        };

        accuracy_ok && power_ok
    }
}
