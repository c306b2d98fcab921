use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Credibility weight per brokerage, matched case-sensitively.
pub const DEFAULT_BROKERAGE_WEIGHTS: &[(&str, f64)] = &[
    ("Goldman Sachs", 1.0),
    ("Morgan Stanley", 1.0),
    ("JPMorgan", 1.0),
    ("Bank of America", 0.95),
    ("Citigroup", 0.95),
    ("Wells Fargo", 0.9),
    ("Barclays", 0.9),
    ("Deutsche Bank", 0.85),
    ("Credit Suisse", 0.85),
    ("UBS", 0.85),
    ("Jefferies", 0.8),
    ("Cowen", 0.8),
    ("Piper Sandler", 0.75),
];

pub const DEFAULT_BROKERAGE_WEIGHT: f64 = 0.7;

pub const DEFAULT_HIGH_PROFILE_KEYWORDS: &[&str] = &[
    "apple",
    "microsoft",
    "google",
    "amazon",
    "tesla",
    "nvidia",
    "meta",
];

/// Share of each weighted sub-score in the composite. The bonus is always added at 100%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub rating: f64,
    pub target: f64,
    pub temporal: f64,
    pub brokerage: f64,
    pub consensus: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            rating: 0.35,
            target: 0.25,
            temporal: 0.20,
            brokerage: 0.10,
            consensus: 0.10,
        }
    }
}

impl ComponentWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("rating", self.rating),
            ("target", self.target),
            ("temporal", self.temporal),
            ("brokerage", self.brokerage),
            ("consensus", self.consensus),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ComponentWeights,
    pub brokerage_weights: BTreeMap<String, f64>,
    pub default_brokerage_weight: f64,
    pub high_profile_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ComponentWeights::default(),
            brokerage_weights: DEFAULT_BROKERAGE_WEIGHTS
                .iter()
                .map(|(name, w)| (name.to_string(), *w))
                .collect(),
            default_brokerage_weight: DEFAULT_BROKERAGE_WEIGHT,
            high_profile_keywords: DEFAULT_HIGH_PROFILE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl ScoringConfig {
    /// Loads an alternate config from `SCORING_CONFIG_PATH` when set, otherwise the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var("SCORING_CONFIG_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scoring config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid scoring config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(text).context("scoring config is not valid JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, w) in self.weights.named() {
            ensure!(
                w.is_finite() && w >= 0.0,
                "component weight `{name}` must be a finite, non-negative number (got {w})"
            );
        }

        ensure!(
            self.default_brokerage_weight.is_finite() && self.default_brokerage_weight >= 0.0,
            "default_brokerage_weight must be a finite, non-negative number (got {})",
            self.default_brokerage_weight
        );
        for (name, w) in &self.brokerage_weights {
            ensure!(
                w.is_finite() && *w >= 0.0,
                "brokerage weight for `{name}` must be a finite, non-negative number (got {w})"
            );
        }

        ensure!(
            self.high_profile_keywords.iter().all(|k| !k.trim().is_empty()),
            "high_profile_keywords must not contain blank entries"
        );
        Ok(())
    }

    pub fn brokerage_weight(&self, brokerage: &str) -> f64 {
        self.brokerage_weights
            .get(brokerage)
            .copied()
            .unwrap_or(self.default_brokerage_weight)
    }
}
