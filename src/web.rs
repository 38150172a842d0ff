use crate::catalog::fetch_catalog;
use crate::chat::{chat_previews, ChatThreads};
use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::filters::{DiscoveryFilters, SPORTS};
use crate::gesture::DragState;
use crate::profile::ProfileDraft;
use crate::session::SessionStore;
use crate::storage::{DurableBackend, SessionBackend};
use crate::swipe::{CoinFlip, Outcome, SwipeController};
use log::{info, warn};
use rand::rngs::ThreadRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

type BrowserStore = SessionStore<DurableBackend, SessionBackend, SystemClock>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardMotion {
    delta: f64,
    tilt: f64,
    nope_opacity: f64,
    like_opacity: f64,
}

/// Entry point for the rendering layer. Every query returns JSON.
#[wasm_bindgen]
pub struct SportMatch {
    config: AppConfig,
    store: BrowserStore,
    deck: SwipeController<CoinFlip<ThreadRng>>,
    drag: Option<DragState>,
    threads: ChatThreads,
}

#[wasm_bindgen]
impl SportMatch {
    /// Fetches the catalog and restores the session from browser storage.
    pub async fn load(config_json: Option<String>) -> Result<SportMatch, JsValue> {
        let config = AppConfig::from_json(config_json.as_deref());
        let catalog = fetch_catalog(&config.catalog_url).await.map_err(|err| {
            warn!("Failed to load catalog from {}: {}", config.catalog_url, err);
            to_js(err)
        })?;
        let store = SessionStore::open(
            catalog,
            DurableBackend::new(),
            SessionBackend::new(),
            SystemClock,
        )
        .map_err(to_js)?;
        let deck = SwipeController::new(&store, CoinFlip::thread_local(config.match_probability))
            .with_advance_delay(config.advance_delay());
        info!(
            "Loaded {} profiles, {} left to discover",
            store.catalog().len(),
            deck.remaining()
        );

        Ok(SportMatch {
            config,
            store,
            deck,
            drag: None,
            threads: ChatThreads::new(),
        })
    }

    #[wasm_bindgen(js_name = currentProfile)]
    pub fn current_profile(&self) -> Result<Option<String>, JsValue> {
        self.deck.current().map(to_json).transpose()
    }

    /// The top card and the ones stacked behind it.
    pub fn upcoming(&self) -> Result<String, JsValue> {
        to_json(&self.deck.upcoming(self.config.stacked_cards))
    }

    #[wasm_bindgen(js_name = isExhausted)]
    pub fn is_exhausted(&self) -> bool {
        self.deck.is_exhausted()
    }

    #[wasm_bindgen(js_name = isTransitioning)]
    pub fn is_transitioning(&self) -> bool {
        self.deck.is_transitioning()
    }

    #[wasm_bindgen(js_name = advanceDelayMs)]
    pub fn advance_delay_ms(&self) -> u32 {
        u32::try_from(self.deck.advance_delay().as_millis()).unwrap_or(u32::MAX)
    }

    pub fn like(&mut self) -> Result<String, JsValue> {
        let outcome = self.deck.decide_like(&mut self.store).map_err(to_js)?;
        to_json(&outcome)
    }

    pub fn dislike(&mut self) -> Result<String, JsValue> {
        let outcome = self.deck.decide_dislike(&mut self.store).map_err(to_js)?;
        to_json(&outcome)
    }

    /// Call once the exit animation announced by `like`/`dislike` has run.
    #[wasm_bindgen(js_name = completeAdvance)]
    pub fn complete_advance(&mut self) -> Result<Option<String>, JsValue> {
        self.deck.complete_advance().map(to_json).transpose()
    }

    /// Clears the session and re-deals through the applied filters.
    pub fn reset(&mut self) -> Result<String, JsValue> {
        let view = self.deck.reset(&mut self.store);
        to_json(&view)
    }

    /// The applied filters, or `null` while the deck is unfiltered.
    pub fn filters(&self) -> Result<String, JsValue> {
        to_json(&self.deck.filters())
    }

    /// Replaces the discovery filters and re-deals the deck. Returns the deck size.
    #[wasm_bindgen(js_name = applyFilters)]
    pub fn apply_filters(&mut self, filters_json: &str) -> Result<usize, JsValue> {
        let filters: DiscoveryFilters = serde_json::from_str(filters_json).map_err(to_js)?;
        self.deck.apply_filters(&self.store, &filters.normalized());
        Ok(self.deck.remaining())
    }

    #[wasm_bindgen(js_name = knownSports)]
    pub fn known_sports() -> Result<String, JsValue> {
        to_json(&SPORTS)
    }

    pub fn matches(&self) -> Result<String, JsValue> {
        to_json(&self.store.matches())
    }

    pub fn chats(&self, search: &str) -> Result<String, JsValue> {
        to_json(&chat_previews(self.store.matches(), search))
    }

    #[wasm_bindgen(js_name = openChat)]
    pub fn open_chat(&mut self, match_id: &str) -> Result<String, JsValue> {
        let store = &self.store;
        let thread = self
            .threads
            .open(match_id, store.match_by_id(match_id), store.clock());
        to_json(&thread)
    }

    /// Returns the appended message, or `undefined` for blank text or an id
    /// without a match.
    #[wasm_bindgen(js_name = sendMessage)]
    pub fn send_message(&mut self, match_id: &str, text: &str) -> Result<Option<String>, JsValue> {
        let store = &self.store;
        let Some(thread) =
            self.threads
                .for_match(match_id, store.match_by_id(match_id), store.clock())
        else {
            warn!("No match {} to send a message to", match_id);
            return Ok(None);
        };
        thread.send_message(text, store.clock()).map(to_json).transpose()
    }

    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Result<String, JsValue> {
        to_json(self.store.current_user())
    }

    #[wasm_bindgen(js_name = updateCurrentUser)]
    pub fn update_current_user(
        &mut self,
        name: String,
        age: String,
        location: String,
        bio: String,
        sports_json: &str,
    ) -> Result<String, JsValue> {
        let sports: Vec<String> = serde_json::from_str(sports_json).map_err(to_js)?;
        let mut draft = ProfileDraft::from_profile(self.store.current_user());
        draft.name = name;
        draft.age = age;
        draft.location = location;
        draft.bio = bio;
        draft.set_sports(sports);
        let profile = draft.validate().map_err(to_js)?;
        self.store.update_current_user(profile);
        to_json(self.store.current_user())
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, pointer_id: i32, x: f64) {
        if self.drag.is_some() || self.deck.is_exhausted() {
            return;
        }
        self.drag = Some(DragState::begin(pointer_id, x));
    }

    /// Card offset, tilt and stamp opacity for the drag in progress.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, pointer_id: i32, x: f64) -> Result<Option<String>, JsValue> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(None);
        };
        if !drag.update(pointer_id, x) {
            return Ok(None);
        }
        let (nope_opacity, like_opacity) = drag.indicator_opacity();
        to_json(&CardMotion {
            delta: drag.delta(),
            tilt: drag.tilt_degrees(),
            nope_opacity,
            like_opacity,
        })
        .map(Some)
    }

    /// Ends the drag, deciding when it went past the swipe threshold.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, pointer_id: i32) -> Result<String, JsValue> {
        let direction = match self.drag.take() {
            Some(drag) if drag.pointer_id() == pointer_id => {
                drag.release(self.config.swipe_threshold)
            }
            other => {
                self.drag = other;
                None
            }
        };
        let outcome = match direction {
            Some(direction) => self.deck.decide(&mut self.store, direction).map_err(to_js)?,
            None => Outcome::Ignored,
        };
        to_json(&outcome)
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, pointer_id: i32) {
        if self.drag.as_ref().map(DragState::pointer_id) == Some(pointer_id) {
            self.drag = None;
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js)
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
