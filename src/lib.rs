//! Core of SportMatch: a swipe deck over a profile catalog, like/dislike and
//! match bookkeeping mirrored to browser storage, and a mock chat per match.
//!
//! Rendering lives elsewhere. JavaScript drives [`web::SportMatch`]; native
//! hosts and tests use [`SessionStore`] and [`SwipeController`] directly with
//! [`storage::MemoryBackend`].

pub mod catalog;
pub mod chat;
pub mod clock;
pub mod config;
pub mod filters;
pub mod gesture;
pub mod profile;
pub mod session;
pub mod storage;
pub mod swipe;
pub mod web;

pub use catalog::{Catalog, CatalogError, Profile};
pub use chat::{chat_previews, ChatPreview, ChatThread, ChatThreads, Message, Sender};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use filters::DiscoveryFilters;
pub use gesture::{DragState, SwipeDirection};
pub use profile::{ProfileDraft, ProfileError};
pub use session::{Match, ProfileIds, SessionStore, SessionView};
pub use storage::{Backend, MemoryBackend, StorageError};
pub use swipe::{CoinFlip, MatchOracle, Outcome, SwipeController};
