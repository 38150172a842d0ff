use crate::clock::Clock;
use crate::session::Match;
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

const FALLBACK_NAME: &str = "Usuario";
const FALLBACK_AVATAR: &str = "/placeholder.svg";
const FALLBACK_LOCATION: &str = "Buenos Aires";
const PREVIEW_MESSAGE: &str = "Hola! ¿Te gustaría practicar deportes juntos?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Me,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Hours and minutes in the user's timezone, as shown under the bubble.
    pub fn clock_time(&self) -> String {
        self.sent_at.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// The conversation with one match. Lives only in memory; reopening it
/// starts again from the greeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub match_id: String,
    pub partner_name: String,
    pub partner_avatar: String,
    messages: Vec<Message>,
}

impl ChatThread {
    /// Opens the thread for `match_id`, greeting with the match's first sport
    /// and location. Unknown ids get a generic partner.
    pub fn open<C: Clock>(match_id: &str, found: Option<&Match>, clock: &C) -> Self {
        let profile = found.map(|matched| &matched.profile);
        let sport = profile.and_then(|profile| profile.first_sport());
        let location = profile
            .map(|profile| profile.location.as_str())
            .unwrap_or(FALLBACK_LOCATION);
        let started = found
            .map(|matched| matched.timestamp)
            .unwrap_or_else(|| clock.now());

        let greetings = [
            (
                Sender::Other,
                format!(
                    "Hola! Vi que también te gusta {}",
                    sport.unwrap_or("el deporte")
                ),
                0,
            ),
            (
                Sender::Me,
                format!(
                    "¡Hola! Sí, practico {} desde hace unos años. ¿Tú también?",
                    sport.unwrap_or("deportes")
                ),
                2,
            ),
            (
                Sender::Other,
                format!("Sí, estoy buscando compañeros para practicar en {}", location),
                3,
            ),
        ];

        let messages = greetings
            .into_iter()
            .enumerate()
            .map(|(index, (sender, text, minutes))| Message {
                id: (index + 1).to_string(),
                sender,
                text,
                sent_at: started + Duration::minutes(minutes),
            })
            .collect();

        Self {
            match_id: match_id.to_owned(),
            partner_name: profile
                .map(|profile| profile.name.clone())
                .unwrap_or_else(|| FALLBACK_NAME.to_owned()),
            partner_avatar: profile
                .map(|profile| profile.profile_picture.clone())
                .filter(|avatar| !avatar.is_empty())
                .unwrap_or_else(|| FALLBACK_AVATAR.to_owned()),
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends `text` from the user unless it is blank.
    pub fn send_message<C: Clock>(&mut self, text: &str, clock: &C) -> Option<&Message> {
        if text.trim().is_empty() {
            return None;
        }
        self.messages.push(Message {
            id: (self.messages.len() + 1).to_string(),
            sender: Sender::Me,
            text: text.to_owned(),
            sent_at: clock.now(),
        });
        self.messages.last()
    }
}

/// Open threads keyed by match id. Only ids with a match are kept.
#[derive(Debug, Default)]
pub struct ChatThreads {
    threads: HashMap<String, ChatThread>,
}

impl ChatThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached thread for a match, opened on first use. `None` when
    /// `found` is `None`.
    pub fn for_match<C: Clock>(
        &mut self,
        match_id: &str,
        found: Option<&Match>,
        clock: &C,
    ) -> Option<&mut ChatThread> {
        let found = found?;
        Some(
            self.threads
                .entry(match_id.to_owned())
                .or_insert_with(|| ChatThread::open(match_id, Some(found), clock)),
        )
    }

    /// Like [`ChatThreads::for_match`], but an unknown id gets a fresh
    /// fallback thread that is not cached.
    pub fn open<C: Clock>(
        &mut self,
        match_id: &str,
        found: Option<&Match>,
        clock: &C,
    ) -> ChatThread {
        match self.for_match(match_id, found, clock) {
            Some(thread) => thread.clone(),
            None => ChatThread::open(match_id, None, clock),
        }
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPreview {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub last_message: String,
    pub date: NaiveDate,
}

/// One row per match whose name contains `search`, ignoring case.
pub fn chat_previews(matches: &[Match], search: &str) -> Vec<ChatPreview> {
    let needle = search.trim().to_lowercase();
    matches
        .iter()
        .filter(|matched| matched.profile.name.to_lowercase().contains(&needle))
        .map(|matched| ChatPreview {
            id: matched.id.clone(),
            name: matched.profile.name.clone(),
            avatar: matched.profile.profile_picture.clone(),
            last_message: PREVIEW_MESSAGE.to_owned(),
            date: matched.timestamp.with_timezone(&Local).date_naive(),
        })
        .collect()
}
