use crate::catalog::Profile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sports a user can pick from, in display order.
pub const SPORTS: [&str; 16] = [
    "Fútbol",
    "Tenis",
    "Básquet",
    "Vóley",
    "Running",
    "Ciclismo",
    "Natación",
    "Yoga",
    "Pilates",
    "Pádel",
    "Hockey",
    "Rugby",
    "Golf",
    "Escalada",
    "Boxeo",
    "Artes marciales",
];

pub const MAX_DISTANCE_KM: f64 = 50.0;
pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 65;

const DEFAULT_DISTANCE_KM: f64 = 10.0;
const DEFAULT_AGE_RANGE: (u32, u32) = (18, 40);
const DEFAULT_SPORTS: [&str; 2] = ["Fútbol", "Tenis"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryFilters {
    sports: Vec<String>,
    max_distance_km: f64,
    min_age: u32,
    max_age: u32,
}

impl Default for DiscoveryFilters {
    fn default() -> Self {
        Self {
            sports: DEFAULT_SPORTS.iter().map(|sport| sport.to_string()).collect(),
            max_distance_km: DEFAULT_DISTANCE_KM,
            min_age: DEFAULT_AGE_RANGE.0,
            max_age: DEFAULT_AGE_RANGE.1,
        }
    }
}

impl DiscoveryFilters {
    /// Filters that admit every profile within the slider bounds.
    pub fn permissive() -> Self {
        Self {
            sports: Vec::new(),
            max_distance_km: MAX_DISTANCE_KM,
            min_age: MIN_AGE,
            max_age: MAX_AGE,
        }
    }

    pub fn sports(&self) -> &[String] {
        &self.sports
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    pub fn age_range(&self) -> (u32, u32) {
        (self.min_age, self.max_age)
    }

    pub fn is_selected(&self, sport: &str) -> bool {
        self.sports.iter().any(|selected| selected == sport)
    }

    /// Adds the sport if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle_sport(&mut self, sport: &str) -> bool {
        if let Some(position) = self.sports.iter().position(|selected| selected == sport) {
            self.sports.remove(position);
            false
        } else {
            self.sports.push(sport.to_owned());
            true
        }
    }

    pub fn set_max_distance(&mut self, km: f64) {
        self.max_distance_km = if km.is_finite() {
            km.clamp(0.0, MAX_DISTANCE_KM)
        } else {
            MAX_DISTANCE_KM
        };
    }

    pub fn set_age_range(&mut self, min: u32, max: u32) {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.min_age = low.clamp(MIN_AGE, MAX_AGE);
        self.max_age = high.clamp(MIN_AGE, MAX_AGE);
    }

    /// Re-applies the bounds, for filters that arrived through deserialization.
    pub fn normalized(mut self) -> Self {
        let (min, max) = (self.min_age, self.max_age);
        self.set_age_range(min, max);
        let km = self.max_distance_km;
        self.set_max_distance(km);
        let mut seen = HashSet::new();
        self.sports.retain(|sport| seen.insert(sport.clone()));
        self
    }

    pub fn admits(&self, profile: &Profile) -> bool {
        let sports_ok =
            self.sports.is_empty() || self.sports.iter().any(|sport| profile.plays(sport));
        sports_ok
            && profile.distance <= self.max_distance_km
            && (self.min_age..=self.max_age).contains(&profile.age)
    }
}
