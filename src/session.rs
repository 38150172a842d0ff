use crate::catalog::{Catalog, Profile};
use crate::clock::Clock;
use crate::filters::DiscoveryFilters;
use crate::profile::default_current_user;
use crate::storage::{
    load_or_default, Backend, StorageError, DISLIKED_KEY, LAST_SESSION_DATE_KEY, LIKED_KEY,
    MATCHES_KEY, VIEWED_KEY,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Always the matched profile's id.
    pub id: String,
    pub profile: Profile,
    pub timestamp: DateTime<Utc>,
    pub has_chat: bool,
}

/// Profile ids in the order they were first recorded, without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileIds(Vec<String>);

impl ProfileIds {
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    /// Returns whether the id was newly added.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.to_owned());
        true
    }

    /// Returns whether the id was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let mut seen = HashSet::new();
        self.0
            .retain(|id| keep(id.as_str()) && seen.insert(id.clone()));
    }
}

/// What the presentation layer needs after any mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub available: Vec<Profile>,
    pub viewed: usize,
    pub liked: usize,
    pub disliked: usize,
    pub matches: usize,
}

/// Viewed, liked and disliked profiles for the current session plus every
/// match ever made.
///
/// The sets are mirrored to the session backend and reset on a new calendar
/// day; matches are mirrored to the durable backend and never reset.
pub struct SessionStore<D, S, C> {
    catalog: Catalog,
    durable: D,
    session: S,
    clock: C,
    viewed: ProfileIds,
    liked: ProfileIds,
    disliked: ProfileIds,
    matches: Vec<Match>,
    current_user: Profile,
}

impl<D, S, C> SessionStore<D, S, C>
where
    D: Backend,
    S: Backend,
    C: Clock,
{
    /// Hydrates from the backends, starting a fresh session when the last one
    /// was recorded on a different day.
    pub fn open(catalog: Catalog, durable: D, session: S, clock: C) -> Result<Self, StorageError> {
        let matches = dedupe_matches(load_or_default(&durable, MATCHES_KEY));

        let mut store = Self {
            catalog,
            durable,
            session,
            clock,
            viewed: ProfileIds::default(),
            liked: ProfileIds::default(),
            disliked: ProfileIds::default(),
            matches,
            current_user: default_current_user(),
        };

        let today = store.clock.today();
        let last_session = match store.durable.get::<NaiveDate>(LAST_SESSION_DATE_KEY) {
            Ok(date) => date,
            Err(err) => {
                warn!("Ignoring stored session date: {}", err);
                None
            }
        };

        if last_session == Some(today) {
            store.viewed = load_or_default(&store.session, VIEWED_KEY);
            store.liked = load_or_default(&store.session, LIKED_KEY);
            store.disliked = load_or_default(&store.session, DISLIKED_KEY);
            store.normalize_sets();
            debug!(
                "Resumed session with {} viewed profiles",
                store.viewed.len()
            );
        } else {
            info!("Starting a new session day {}", today);
            store.persist_session()?;
            store.durable.set(LAST_SESSION_DATE_KEY, &today)?;
        }

        Ok(store)
    }

    pub fn record_viewed(&mut self, id: &str) -> Result<SessionView, StorageError> {
        if self.viewed.insert(id) {
            self.persist_session()?;
        }
        Ok(self.view())
    }

    /// Marks the profile liked and viewed; a previous dislike is dropped.
    pub fn record_liked(&mut self, id: &str) -> Result<SessionView, StorageError> {
        if self.mark_liked(id) {
            debug!("Liked profile {}", id);
            self.persist_session()?;
        }
        Ok(self.view())
    }

    /// Marks the profile disliked and viewed; a previous like is dropped.
    pub fn record_disliked(&mut self, id: &str) -> Result<SessionView, StorageError> {
        let mut changed = self.disliked.insert(id);
        changed |= self.liked.remove(id);
        changed |= self.viewed.insert(id);
        if changed {
            debug!("Disliked profile {}", id);
            self.persist_session()?;
        }
        Ok(self.view())
    }

    /// Records a mutual match once per profile and likes it. Both mirrors are
    /// written every time, so repeating the call after a failed write heals them.
    pub fn record_match(&mut self, profile: &Profile) -> Result<SessionView, StorageError> {
        if self.match_by_id(&profile.id).is_none() {
            self.matches.push(Match {
                id: profile.id.clone(),
                profile: profile.clone(),
                timestamp: self.clock.now(),
                has_chat: true,
            });
            info!("Matched with {} ({})", profile.name, profile.id);
        }
        self.mark_liked(&profile.id);
        self.persist_matches()?;
        self.persist_session()?;
        Ok(self.view())
    }

    /// Forgets every decision of the session. Matches are kept.
    pub fn reset_session(&mut self) -> SessionView {
        self.viewed.clear();
        self.liked.clear();
        self.disliked.clear();
        self.session.delete(VIEWED_KEY);
        self.session.delete(LIKED_KEY);
        self.session.delete(DISLIKED_KEY);
        info!("Session profiles reset");
        self.view()
    }

    pub fn available_profiles(&self) -> Vec<Profile> {
        self.catalog
            .iter()
            .filter(|profile| !self.viewed.contains(&profile.id))
            .cloned()
            .collect()
    }

    /// Available profiles that also pass the discovery filters.
    pub fn discover(&self, filters: &DiscoveryFilters) -> Vec<Profile> {
        self.catalog
            .iter()
            .filter(|profile| !self.viewed.contains(&profile.id) && filters.admits(profile))
            .cloned()
            .collect()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            available: self.available_profiles(),
            viewed: self.viewed.len(),
            liked: self.liked.len(),
            disliked: self.disliked.len(),
            matches: self.matches.len(),
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn match_by_id(&self, id: &str) -> Option<&Match> {
        self.matches.iter().find(|existing| existing.id == id)
    }

    pub fn viewed(&self) -> &ProfileIds {
        &self.viewed
    }

    pub fn liked(&self) -> &ProfileIds {
        &self.liked
    }

    pub fn disliked(&self) -> &ProfileIds {
        &self.disliked
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn current_user(&self) -> &Profile {
        &self.current_user
    }

    pub fn update_current_user(&mut self, profile: Profile) {
        self.current_user = profile;
    }

    fn mark_liked(&mut self, id: &str) -> bool {
        let mut changed = self.liked.insert(id);
        changed |= self.disliked.remove(id);
        changed |= self.viewed.insert(id);
        changed
    }

    fn persist_session(&mut self) -> Result<(), StorageError> {
        self.session.set(VIEWED_KEY, &self.viewed)?;
        self.session.set(LIKED_KEY, &self.liked)?;
        self.session.set(DISLIKED_KEY, &self.disliked)?;
        Ok(())
    }

    fn persist_matches(&mut self) -> Result<(), StorageError> {
        self.durable.set(MATCHES_KEY, &self.matches)
    }

    /// Restores the set invariants on hydrated data: ids must be in the
    /// catalog, liked and disliked are disjoint subsets of viewed.
    fn normalize_sets(&mut self) {
        let catalog = &self.catalog;
        self.viewed.retain(|id| catalog.contains(id));
        self.liked.retain(|id| catalog.contains(id));
        let liked = &self.liked;
        self.disliked
            .retain(|id| catalog.contains(id) && !liked.contains(id));

        let decided: Vec<String> = self
            .liked
            .iter()
            .chain(self.disliked.iter())
            .map(str::to_owned)
            .collect();
        for id in decided {
            self.viewed.insert(&id);
        }
    }
}

fn dedupe_matches(mut matches: Vec<Match>) -> Vec<Match> {
    let mut seen = HashSet::new();
    matches.retain(|existing| seen.insert(existing.id.clone()));
    matches
}
