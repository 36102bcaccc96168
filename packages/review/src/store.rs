//! Card persistence seam.
//!
//! The engine never talks to a database directly; it consumes the [`Store`]
//! trait and leaves storage technology to the host application.
//! [`MemoryStore`] is the in-process reference implementation used by tests
//! and the demo binary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use recall_algo::MemoryModel;

use crate::error::ReviewError;

pub type ItemId = i64;

/// One reviewable item as handed to a session: content plus scheduling
/// state, snapshotted together with the store revision it was read at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub id: ItemId,
    pub prompt: String,
    pub answer: String,
    pub topic: Option<String>,
    pub memory: MemoryModel,
    /// Store revision this snapshot was read at; passed back on save so
    /// competing writes are detected instead of silently merged.
    pub revision: u64,
}

/// Earliest upcoming review, for the "all caught up" surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueForecast {
    pub next_due: DateTime<Utc>,
    /// How many cards come due on that same day.
    pub upcoming: usize,
    pub topic: Option<String>,
}

/// Durable storage contract for memory models.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cards with `due <= now`, ordered by due ascending with item-id
    /// tiebreak, optionally filtered to one topic.
    async fn get_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        topic: Option<&str>,
    ) -> Result<Vec<ReviewCard>, ReviewError>;

    /// Current snapshot of one card.
    async fn load(&self, id: ItemId) -> Result<ReviewCard, ReviewError>;

    /// Write back a graded memory model. `revision` must match the revision
    /// the card was read at; a mismatch means another writer got there
    /// first and yields [`ReviewError::ConcurrencyConflict`].
    async fn save(
        &self,
        id: ItemId,
        memory: &MemoryModel,
        revision: u64,
    ) -> Result<(), ReviewError>;

    /// Earliest card due strictly after `now`, if any.
    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<DueForecast>, ReviewError>;
}

// ==================== In-memory reference store ====================

#[derive(Debug, Clone)]
struct StoredCard {
    prompt: String,
    answer: String,
    topic: Option<String>,
    memory: MemoryModel,
    revision: u64,
}

/// Reference [`Store`] keeping everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    cards: RwLock<HashMap<ItemId, StoredCard>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace a card; revision restarts at zero.
    pub fn insert(
        &self,
        id: ItemId,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        topic: Option<&str>,
        memory: MemoryModel,
    ) {
        self.cards.write().insert(
            id,
            StoredCard {
                prompt: prompt.into(),
                answer: answer.into(),
                topic: topic.map(str::to_string),
                memory,
                revision: 0,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.cards.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.read().is_empty()
    }

    fn snapshot(id: ItemId, card: &StoredCard) -> ReviewCard {
        ReviewCard {
            id,
            prompt: card.prompt.clone(),
            answer: card.answer.clone(),
            topic: card.topic.clone(),
            memory: card.memory.clone(),
            revision: card.revision,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        topic: Option<&str>,
    ) -> Result<Vec<ReviewCard>, ReviewError> {
        let cards = self.cards.read();
        let mut due: Vec<ReviewCard> = cards
            .iter()
            .filter(|(_, card)| card.memory.is_due(now))
            .filter(|(_, card)| match topic {
                Some(wanted) => card.topic.as_deref() == Some(wanted),
                None => true,
            })
            .map(|(id, card)| Self::snapshot(*id, card))
            .collect();

        due.sort_by(|a, b| a.memory.due.cmp(&b.memory.due).then(a.id.cmp(&b.id)));
        due.truncate(limit);
        Ok(due)
    }

    async fn load(&self, id: ItemId) -> Result<ReviewCard, ReviewError> {
        let cards = self.cards.read();
        cards
            .get(&id)
            .map(|card| Self::snapshot(id, card))
            .ok_or(ReviewError::NotFound(id))
    }

    async fn save(
        &self,
        id: ItemId,
        memory: &MemoryModel,
        revision: u64,
    ) -> Result<(), ReviewError> {
        let mut cards = self.cards.write();
        let card = cards.get_mut(&id).ok_or(ReviewError::NotFound(id))?;

        if card.revision != revision {
            return Err(ReviewError::ConcurrencyConflict {
                item: id,
                expected: revision,
                found: card.revision,
            });
        }

        card.memory = memory.clone();
        card.revision += 1;
        Ok(())
    }

    async fn next_due(&self, now: DateTime<Utc>) -> Result<Option<DueForecast>, ReviewError> {
        let cards = self.cards.read();
        let earliest = cards
            .values()
            .filter(|card| card.memory.due > now)
            .min_by_key(|card| card.memory.due);

        let Some(earliest) = earliest else {
            return Ok(None);
        };

        let day = earliest.memory.due.date_naive();
        let upcoming = cards
            .values()
            .filter(|card| card.memory.due > now && card.memory.due.date_naive() == day)
            .count();

        Ok(Some(DueForecast {
            next_due: earliest.memory.due,
            upcoming,
            topic: earliest.topic.clone(),
        }))
    }
}

// ==================== Tests ====================
