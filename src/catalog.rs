use gloo_net::http::Request;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub location: String,
    pub bio: String,
    pub sports: Vec<String>,
    /// Kilometres from the current user.
    pub distance: f64,
    pub profile_picture: String,
}

impl Profile {
    pub fn first_sport(&self) -> Option<&str> {
        self.sports.first().map(String::as_str)
    }

    pub fn plays(&self, sport: &str) -> bool {
        self.sports.iter().any(|candidate| candidate == sport)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog not found at {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed catalog: {0}")]
    Parse(String),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

impl CatalogError {
    fn network<E: std::fmt::Display>(err: E) -> Self {
        Self::Network(err.to_string())
    }

    fn parse<E: std::fmt::Display>(err: E) -> Self {
        Self::Parse(err.to_string())
    }
}

/// The read-only list of candidates, in presentation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    profiles: Vec<Profile>,
}

impl Catalog {
    /// Builds a catalog, rejecting blank or repeated identifiers.
    pub fn new(profiles: Vec<Profile>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, profile) in profiles.iter().enumerate() {
            if profile.id.trim().is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "profile {} has an empty id",
                    index
                )));
            }
            if !seen.insert(profile.id.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate profile id '{}'",
                    profile.id
                )));
            }
        }
        Ok(Self { profiles })
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let profiles: Vec<Profile> = serde_json::from_str(text).map_err(CatalogError::parse)?;
        Self::new(profiles)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }
}

pub async fn fetch_catalog(url: &str) -> Result<Catalog, CatalogError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(CatalogError::network)?;

    if response.status() == 404 {
        return Err(CatalogError::NotFound(url.to_owned()));
    }

    if !response.ok() {
        return Err(CatalogError::Network(format!(
            "HTTP {} while fetching {}",
            response.status(),
            url
        )));
    }

    let text = response.text().await.map_err(CatalogError::network)?;
    Catalog::from_json(&text)
}
