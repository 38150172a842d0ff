use crate::gesture::SWIPE_THRESHOLD;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CATALOG_URL: &str = "assets/profiles.json";
const DEFAULT_ADVANCE_DELAY_MS: u64 = 300;
const DEFAULT_MATCH_PROBABILITY: f64 = 0.5;
const DEFAULT_STACKED_CARDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub catalog_url: String,
    /// Pause between a decision and the next card, long enough for the exit animation.
    pub advance_delay_ms: u64,
    pub match_probability: f64,
    /// Horizontal drag, in pixels, that commits a swipe.
    pub swipe_threshold: f64,
    pub stacked_cards: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_owned(),
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            match_probability: DEFAULT_MATCH_PROBABILITY,
            swipe_threshold: SWIPE_THRESHOLD,
            stacked_cards: DEFAULT_STACKED_CARDS,
        }
    }
}

impl AppConfig {
    /// Parses an optional JSON document; anything unusable yields the defaults.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<AppConfig>(raw) {
            Ok(config) => config.sanitized(),
            Err(err) => {
                warn!("Falling back to default config: {}", err);
                Self::default()
            }
        }
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    fn sanitized(mut self) -> Self {
        if !self.match_probability.is_finite() {
            self.match_probability = DEFAULT_MATCH_PROBABILITY;
        }
        self.match_probability = self.match_probability.clamp(0.0, 1.0);
        if !self.swipe_threshold.is_finite() || self.swipe_threshold <= 0.0 {
            self.swipe_threshold = SWIPE_THRESHOLD;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = AppConfig::from_json(Some(r#"{"advanceDelayMs": 120}"#));
        assert_eq!(config.advance_delay(), Duration::from_millis(120));
        assert_eq!(config.catalog_url, "assets/profiles.json");
        assert_eq!(config.match_probability, 0.5);
    }

    #[test]
    fn malformed_document_uses_defaults() {
        assert_eq!(AppConfig::from_json(Some("[1, 2")), AppConfig::default());
        assert_eq!(AppConfig::from_json(Some("   ")), AppConfig::default());
        assert_eq!(AppConfig::from_json(None), AppConfig::default());
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let config =
            AppConfig::from_json(Some(r#"{"matchProbability": 3.0, "swipeThreshold": -5}"#));
        assert_eq!(config.match_probability, 1.0);
        assert_eq!(config.swipe_threshold, 100.0);
    }
}
