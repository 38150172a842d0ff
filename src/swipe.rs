use crate::catalog::Profile;
use crate::clock::Clock;
use crate::filters::DiscoveryFilters;
use crate::gesture::SwipeDirection;
use crate::session::{SessionStore, SessionView};
use crate::storage::{Backend, StorageError};
use log::debug;
use rand::rngs::ThreadRng;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(300);

/// Decides whether a like is reciprocated.
pub trait MatchOracle {
    fn is_mutual(&mut self, profile: &Profile) -> bool;
}

/// Reciprocates each like independently with a fixed probability.
#[derive(Debug, Clone)]
pub struct CoinFlip<R> {
    rng: R,
    probability: f64,
}

impl<R: Rng> CoinFlip<R> {
    pub fn new(rng: R, probability: f64) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self { rng, probability }
    }
}

impl CoinFlip<ThreadRng> {
    pub fn thread_local(probability: f64) -> Self {
        Self::new(rand::thread_rng(), probability)
    }
}

impl<R: Rng> MatchOracle for CoinFlip<R> {
    fn is_mutual(&mut self, _profile: &Profile) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// Nothing to decide on, or the previous card is still leaving.
    Ignored,
    /// The card is leaving; call [`SwipeController::complete_advance`] after the delay.
    Advancing {
        #[serde(rename = "profileId")]
        profile_id: String,
        direction: SwipeDirection,
    },
    Matched { profile: Profile },
}

/// Presents the available profiles one at a time.
///
/// The deck is a snapshot taken at construction, reset or filter change.
/// Once filters are applied every later deal goes through them. Decisions
/// go to the session store passed into each call.
#[derive(Debug)]
pub struct SwipeController<O> {
    deck: Vec<Profile>,
    cursor: usize,
    exit: Option<SwipeDirection>,
    filters: Option<DiscoveryFilters>,
    oracle: O,
    advance_delay: Duration,
}

impl<O: MatchOracle> SwipeController<O> {
    pub fn new<D, S, C>(store: &SessionStore<D, S, C>, oracle: O) -> Self
    where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        Self {
            deck: store.available_profiles(),
            cursor: 0,
            exit: None,
            filters: None,
            oracle,
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn advance_delay(&self) -> Duration {
        self.advance_delay
    }

    pub fn current(&self) -> Option<&Profile> {
        self.deck.get(self.cursor)
    }

    /// The top card followed by the ones stacked behind it.
    pub fn upcoming(&self, count: usize) -> &[Profile] {
        let start = self.cursor.min(self.deck.len());
        let end = start.saturating_add(count).min(self.deck.len());
        &self.deck[start..end]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.deck.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.deck.len()
    }

    pub fn is_transitioning(&self) -> bool {
        self.exit.is_some()
    }

    pub fn exit_direction(&self) -> Option<SwipeDirection> {
        self.exit
    }

    /// Routes a committed gesture to the matching decision.
    pub fn decide<D, S, C>(
        &mut self,
        store: &mut SessionStore<D, S, C>,
        direction: SwipeDirection,
    ) -> Result<Outcome, StorageError>
    where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        match direction {
            SwipeDirection::Left => self.decide_dislike(store),
            SwipeDirection::Right => self.decide_like(store),
        }
    }

    pub fn decide_like<D, S, C>(
        &mut self,
        store: &mut SessionStore<D, S, C>,
    ) -> Result<Outcome, StorageError>
    where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        let Some(profile) = self.decidable() else {
            return Ok(Outcome::Ignored);
        };

        // An existing match means an earlier attempt failed to persist; retry it.
        if store.match_by_id(&profile.id).is_some() || self.oracle.is_mutual(&profile) {
            store.record_match(&profile)?;
            self.cursor += 1;
            return Ok(Outcome::Matched { profile });
        }

        store.record_liked(&profile.id)?;
        debug!("Liked {}, advancing", profile.id);
        self.exit = Some(SwipeDirection::Right);
        Ok(Outcome::Advancing {
            profile_id: profile.id,
            direction: SwipeDirection::Right,
        })
    }

    pub fn decide_dislike<D, S, C>(
        &mut self,
        store: &mut SessionStore<D, S, C>,
    ) -> Result<Outcome, StorageError>
    where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        let Some(profile) = self.decidable() else {
            return Ok(Outcome::Ignored);
        };

        store.record_disliked(&profile.id)?;
        debug!("Disliked {}, advancing", profile.id);
        self.exit = Some(SwipeDirection::Left);
        Ok(Outcome::Advancing {
            profile_id: profile.id,
            direction: SwipeDirection::Left,
        })
    }

    /// Finishes a pending exit and returns the new top card.
    pub fn complete_advance(&mut self) -> Option<&Profile> {
        if self.exit.take().is_some() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Clears the session and deals the catalog again through the active
    /// filters. The returned view lists exactly the dealt deck.
    pub fn reset<D, S, C>(&mut self, store: &mut SessionStore<D, S, C>) -> SessionView
    where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        let mut view = store.reset_session();
        if let Some(filters) = &self.filters {
            view.available = store.discover(filters);
        }
        self.deal(view.available.clone());
        view
    }

    /// Re-deals the undecided profiles that pass `filters`, keeping the session.
    /// The filters stay active for later resets.
    pub fn apply_filters<D, S, C>(
        &mut self,
        store: &SessionStore<D, S, C>,
        filters: &DiscoveryFilters,
    ) where
        D: Backend,
        S: Backend,
        C: Clock,
    {
        self.filters = Some(filters.clone());
        self.deal(store.discover(filters));
    }

    /// The filters in effect, `None` while the deck is unfiltered.
    pub fn filters(&self) -> Option<&DiscoveryFilters> {
        self.filters.as_ref()
    }

    fn deal(&mut self, deck: Vec<Profile>) {
        self.deck = deck;
        self.cursor = 0;
        self.exit = None;
    }

    fn decidable(&self) -> Option<Profile> {
        if let Some(direction) = self.exit {
            debug!("Ignoring decision while card exits {:?}", direction);
            return None;
        }
        self.current().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::clock::FixedClock;
    use crate::storage::MemoryBackend;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    type TestStore = SessionStore<MemoryBackend, MemoryBackend, FixedClock>;

    struct Scripted(VecDeque<bool>);

    impl Scripted {
        fn new(outcomes: &[bool]) -> Self {
            Self(outcomes.iter().copied().collect())
        }
    }

    impl MatchOracle for Scripted {
        fn is_mutual(&mut self, _profile: &Profile) -> bool {
            self.0.pop_front().unwrap_or(false)
        }
    }

    fn profile(id: &str, distance: f64) -> Profile {
        Profile {
            id: id.to_owned(),
            name: id.to_uppercase(),
            age: 30,
            location: "Núñez, CABA".to_owned(),
            bio: String::new(),
            sports: vec!["Pádel".to_owned()],
            distance,
            profile_picture: String::new(),
        }
    }

    fn store_with(ids: &[&str]) -> (TestStore, MemoryBackend) {
        let (store, session, _) = store_and_durable(ids);
        (store, session)
    }

    fn store_and_durable(ids: &[&str]) -> (TestStore, MemoryBackend, MemoryBackend) {
        let catalog = Catalog::new(
            ids.iter()
                .enumerate()
                .map(|(index, id)| profile(id, index as f64 * 10.0))
                .collect(),
        )
        .unwrap();
        let durable = MemoryBackend::new();
        let session = MemoryBackend::new();
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
        let store =
            SessionStore::open(catalog, durable.clone(), session.clone(), clock).unwrap();
        (store, session, durable)
    }

    #[test]
    fn dislike_waits_for_advance() {
        let (mut store, _) = store_with(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[]));

        let outcome = deck.decide_dislike(&mut store).unwrap();
        assert_eq!(
            outcome,
            Outcome::Advancing {
                profile_id: "a".to_owned(),
                direction: SwipeDirection::Left
            }
        );
        assert_eq!(deck.current().map(|p| p.id.as_str()), Some("a"));
        assert_eq!(deck.exit_direction(), Some(SwipeDirection::Left));

        let next = deck.complete_advance().map(|p| p.id.clone());
        assert_eq!(next.as_deref(), Some("b"));
        assert!(!deck.is_transitioning());
    }

    #[test]
    fn decisions_during_transition_are_ignored() {
        let (mut store, _) = store_with(&["a", "b", "c"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[false, false]));

        deck.decide_like(&mut store).unwrap();
        assert_eq!(deck.decide_dislike(&mut store).unwrap(), Outcome::Ignored);
        assert_eq!(deck.decide_like(&mut store).unwrap(), Outcome::Ignored);
        assert!(!store.disliked().contains("a"));
        assert_eq!(store.viewed().len(), 1);

        deck.complete_advance();
        deck.complete_advance();
        assert_eq!(deck.cursor(), 1);
    }

    #[test]
    fn match_advances_immediately() {
        let (mut store, _) = store_with(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[true]));

        let outcome = deck.decide_like(&mut store).unwrap();
        assert!(matches!(outcome, Outcome::Matched { ref profile } if profile.id == "a"));
        assert!(!deck.is_transitioning());
        assert_eq!(deck.current().map(|p| p.id.as_str()), Some("b"));
        assert!(store.match_by_id("a").is_some());
    }

    #[test]
    fn exhausted_deck_ignores_decisions() {
        let (mut store, _) = store_with(&[]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[true]));

        assert!(deck.is_exhausted());
        assert_eq!(deck.decide_like(&mut store).unwrap(), Outcome::Ignored);
        assert_eq!(deck.decide_dislike(&mut store).unwrap(), Outcome::Ignored);
        assert!(store.matches().is_empty());
        assert!(deck.complete_advance().is_none());
    }

    #[test]
    fn reset_deals_full_catalog() {
        let (mut store, _) = store_with(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[true]));
        deck.decide_like(&mut store).unwrap();
        deck.decide_dislike(&mut store).unwrap();
        deck.complete_advance();
        assert!(deck.is_exhausted());

        let view = deck.reset(&mut store);
        assert_eq!(view.available.len(), 2);
        assert_eq!(deck.cursor(), 0);
        assert_eq!(deck.remaining(), 2);
        assert_eq!(store.matches().len(), 1);
    }

    #[test]
    fn upcoming_shows_stack() {
        let (store, _) = store_with(&["a", "b", "c", "d"]);
        let deck = SwipeController::new(&store, Scripted::new(&[]));
        let ids: Vec<&str> = deck.upcoming(3).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(deck.upcoming(10).len(), 4);
    }

    #[test]
    fn filters_redeal_without_reset() {
        let (mut store, _) = store_with(&["a", "b", "c"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[]));
        deck.decide_dislike(&mut store).unwrap();
        deck.complete_advance();

        let mut filters = DiscoveryFilters::permissive();
        filters.set_max_distance(15.0);
        deck.apply_filters(&store, &filters);

        let ids: Vec<&str> = deck.upcoming(5).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(store.disliked().contains("a"));
    }

    #[test]
    fn reset_keeps_applied_filters() {
        let (mut store, _) = store_with(&["a", "b", "c"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[]));
        assert!(deck.filters().is_none());
        assert_eq!(deck.remaining(), 3);

        let mut filters = DiscoveryFilters::permissive();
        filters.set_max_distance(15.0);
        deck.apply_filters(&store, &filters);
        deck.decide_dislike(&mut store).unwrap();
        deck.complete_advance();

        let view = deck.reset(&mut store);
        let dealt: Vec<&str> = deck.upcoming(5).iter().map(|p| p.id.as_str()).collect();
        let listed: Vec<&str> = view.available.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(dealt, vec!["a", "b"]);
        assert_eq!(listed, dealt);
        assert_eq!(view.viewed, 0);
        assert_eq!(deck.filters(), Some(&filters));
    }

    #[test]
    fn failed_write_keeps_cursor() {
        let (mut store, session) = store_with(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[]));
        session.set_read_only(true);

        assert!(deck.decide_dislike(&mut store).is_err());
        assert!(!deck.is_transitioning());
        assert_eq!(deck.cursor(), 0);
    }

    #[test]
    fn gesture_direction_routes_decision() {
        let (mut store, _) = store_with(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[false]));

        deck.decide(&mut store, SwipeDirection::Right).unwrap();
        assert!(store.liked().contains("a"));
        deck.complete_advance();
        deck.decide(&mut store, SwipeDirection::Left).unwrap();
        assert!(store.disliked().contains("b"));
    }

    #[test]
    fn failed_match_write_keeps_card_until_retried() {
        let (mut store, _, durable) = store_and_durable(&["a", "b"]);
        let mut deck = SwipeController::new(&store, Scripted::new(&[true]));
        durable.set_read_only(true);

        assert!(deck.decide_like(&mut store).is_err());
        assert_eq!(deck.cursor(), 0);
        assert_eq!(deck.current().map(|p| p.id.as_str()), Some("a"));
        assert_eq!(store.matches().len(), 1);
        assert!(store.liked().contains("a"));
        assert!(store.viewed().contains("a"));

        durable.set_read_only(false);
        let outcome = deck.decide_like(&mut store).unwrap();
        assert!(matches!(outcome, Outcome::Matched { ref profile } if profile.id == "a"));
        assert_eq!(store.matches().len(), 1);
        assert_eq!(deck.current().map(|p| p.id.as_str()), Some("b"));
    }

    #[test]
    fn coin_flip_extremes_are_deterministic() {
        let sample = profile("a", 0.0);
        let mut always = CoinFlip::new(StdRng::seed_from_u64(7), 1.0);
        let mut never = CoinFlip::new(StdRng::seed_from_u64(7), 0.0);
        for _ in 0..32 {
            assert!(always.is_mutual(&sample));
            assert!(!never.is_mutual(&sample));
        }
    }

    #[test]
    fn coin_flip_is_roughly_fair() {
        let sample = profile("a", 0.0);
        let mut oracle = CoinFlip::new(StdRng::seed_from_u64(42), 0.5);
        let hits = (0..2000).filter(|_| oracle.is_mutual(&sample)).count();
        assert!((800..1200).contains(&hits), "hits = {}", hits);
    }
}
