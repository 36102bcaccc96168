//! Due-card queue.
//!
//! The queue is materialized once when a session starts and never
//! re-queried mid-session, even if other cards become due while the learner
//! is reviewing.

use chrono::{DateTime, Utc};

use recall_algo::{MemoryModel, Scheduler, SchedulerError, SchedulingPreview};

use crate::store::ReviewCard;

/// Ordered, fixed-at-start set of cards for one review session.
#[derive(Debug, Clone, Default)]
pub struct ReviewQueue {
    cards: Vec<ReviewCard>,
}

impl ReviewQueue {
    /// Build a queue, enforcing due-ascending order with item-id tiebreak
    /// regardless of how the store returned the cards.
    pub fn new(mut cards: Vec<ReviewCard>) -> Self {
        cards.sort_by(|a, b| a.memory.due.cmp(&b.memory.due).then(a.id.cmp(&b.id)));
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReviewCard> {
        self.cards.get(index)
    }

    pub fn cards(&self) -> &[ReviewCard] {
        &self.cards
    }

    /// Scheduling candidates for every card in the queue, one preview per
    /// card in queue order. Used by the UI to label the four rating choices
    /// with their "due in ..." estimates.
    pub fn previews(
        &self,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> Result<Vec<SchedulingPreview>, SchedulerError> {
        let models: Vec<MemoryModel> = self.cards.iter().map(|card| card.memory.clone()).collect();
        scheduler.batch_preview(&models, now)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use recall_algo::SchedulerParams;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn card(id: i64, due: DateTime<Utc>) -> ReviewCard {
        let mut memory = MemoryModel::new(due);
        memory.due = due;
        ReviewCard {
            id,
            prompt: format!("q{id}"),
            answer: format!("a{id}"),
            topic: None,
            memory,
            revision: 0,
        }
    }

    #[test]
    fn queue_sorts_by_due_then_id() {
        let now = fixed_now();
        let queue = ReviewQueue::new(vec![
            card(3, now),
            card(1, now),
            card(2, now - Duration::hours(1)),
        ]);

        let ids: Vec<i64> = queue.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn previews_line_up_with_queue_order() {
        let now = fixed_now();
        let queue = ReviewQueue::new(vec![card(1, now), card(2, now)]);
        let scheduler = Scheduler::new(SchedulerParams::default());

        let previews = queue.previews(&scheduler, now).expect("previews");

        assert_eq!(previews.len(), 2);
        for (preview, queued) in previews.iter().zip(queue.cards()) {
            assert_eq!(
                preview,
                &scheduler.preview(&queued.memory, now).expect("preview")
            );
        }
    }
}
