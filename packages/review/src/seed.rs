use chrono::Utc;

use recall_algo::MemoryModel;

use crate::store::MemoryStore;

struct SeedCard {
    prompt: &'static str,
    answer: &'static str,
    topic: &'static str,
}

const SEED_CARDS: &[SeedCard] = &[
    SeedCard {
        prompt: "What does spaced repetition optimize for?",
        answer: "Long term retention with the fewest reviews",
        topic: "learning-science",
    },
    SeedCard {
        prompt: "What is the spacing effect?",
        answer: "Memory is stronger when practice is spread out over time",
        topic: "learning-science",
    },
    SeedCard {
        prompt: "What does the stability of a memory describe?",
        answer: "How many days until recall probability decays to the retention target",
        topic: "learning-science",
    },
    SeedCard {
        prompt: "What is retrieval practice?",
        answer: "Actively recalling information instead of re-reading it",
        topic: "learning-science",
    },
    SeedCard {
        prompt: "Which sleep stage is most linked to memory consolidation?",
        answer: "Slow wave deep sleep",
        topic: "sleep",
    },
    SeedCard {
        prompt: "Roughly how long is one full sleep cycle?",
        answer: "About 90 minutes",
        topic: "sleep",
    },
];

/// Fill a store with the fixed demo deck; every card starts new and due
/// immediately.
pub fn seed_demo_cards(store: &MemoryStore) -> usize {
    let now = Utc::now();
    for (index, card) in SEED_CARDS.iter().enumerate() {
        store.insert(
            index as i64 + 1,
            card.prompt,
            card.answer,
            Some(card.topic),
            MemoryModel::new(now),
        );
    }
    tracing::info!(count = SEED_CARDS.len(), "seeded demo cards");
    SEED_CARDS.len()
}
