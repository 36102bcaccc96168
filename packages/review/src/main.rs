use std::sync::Arc;

use chrono::Utc;

use recall_algo::{Rating, Scheduler};
use recall_review::config::Config;
use recall_review::grader::LexicalGrader;
use recall_review::queue::ReviewQueue;
use recall_review::session::{ReviewSession, SessionPhase};
use recall_review::store::{MemoryStore, Store};
use recall_review::{logging, seed};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let store = MemoryStore::shared();
    seed::seed_demo_cards(&store);

    let now = Utc::now();
    let due = match store.get_due(now, config.queue_limit, None).await {
        Ok(cards) => cards,
        Err(err) => {
            tracing::error!(error = %err, "failed to load due cards");
            return;
        }
    };
    tracing::info!(due = due.len(), limit = config.queue_limit, "review queue ready");

    let scheduler = Scheduler::new(config.scheduler_params());
    let queue = ReviewQueue::new(due);

    match queue.previews(&scheduler, now) {
        Ok(previews) => {
            for (card, preview) in queue.cards().iter().zip(&previews) {
                tracing::debug!(
                    item = card.id,
                    good_days = preview.interval_days(Rating::Good),
                    easy_days = preview.interval_days(Rating::Easy),
                    "scheduling choices"
                );
            }
        }
        Err(err) => tracing::warn!(error = %err, "preview computation failed"),
    }

    let grader = Arc::new(LexicalGrader::default());
    let mut session = ReviewSession::start(store.clone(), grader, scheduler, queue, now);

    // Scripted walk-through: answer every card with its reference answer.
    while session.phase() != SessionPhase::Complete {
        let Some(card) = session.current_card().cloned() else {
            break;
        };
        if let Err(err) = session.begin_answering() {
            tracing::error!(error = %err, "cannot begin answering");
            break;
        }
        match session.submit_answer(&card.answer, Utc::now()).await {
            Ok(result) => tracing::info!(
                item = result.item_id,
                rating = ?result.rating,
                next_due = %result.next_due,
                progress = session.progress(),
                "card graded"
            ),
            Err(err) => {
                tracing::error!(item = card.id, error = %err, "grading did not complete");
                break;
            }
        }
        if let Err(err) = session.next(Utc::now()) {
            tracing::error!(error = %err, "cannot advance");
            break;
        }
    }

    if let Some(summary) = session.summary() {
        tracing::info!(
            reviewed = summary.reviewed,
            accuracy = summary.accuracy,
            avg_time_ms = summary.avg_time_ms,
            "session complete"
        );
    }

    match store.next_due(Utc::now()).await {
        Ok(Some(forecast)) => tracing::info!(
            next_due = %forecast.next_due,
            upcoming = forecast.upcoming,
            topic = forecast.topic.as_deref().unwrap_or("-"),
            "all caught up"
        ),
        Ok(None) => tracing::info!("no upcoming reviews scheduled"),
        Err(err) => tracing::warn!(error = %err, "forecast unavailable"),
    }
}
