//! Background sweep that reminds attendees of events starting soon.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::models::NotificationType;
use crate::repos::{DueReminder, TicketRepo};
use crate::state::AppState;
use crate::utils::AppError;

pub fn spawn(state: AppState, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(state, shutdown))
}

async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(state.config().reminder_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = state.config().reminder_interval.as_secs(),
        lead_minutes = state.config().reminder_lead.num_minutes(),
        "Reminder sweeper started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sweep(&state, Utc::now()).await {
                    Ok(0) => {}
                    Ok(sent) => tracing::info!(sent, "Event reminders sent"),
                    Err(e) => tracing::warn!(error = %e, "Reminder sweep failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Reminder sweeper stopped");
}

/// Claims due bookings and sends one reminder per (user, event).
pub async fn sweep(state: &AppState, now: DateTime<Utc>) -> Result<usize, AppError> {
    let due = TicketRepo::new(state.db.clone())
        .claim_due_reminders(now + state.config().reminder_lead)
        .await?;

    let mut sent = 0;
    for reminder in unique_reminders(due) {
        let content = reminder_text(&reminder, now);
        // Bookings are already claimed; a failed insert skips that reminder
        match state
            .notify(reminder.user_id, NotificationType::EventReminder, &content)
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => tracing::warn!(
                user_id = %reminder.user_id,
                event_id = %reminder.event_id,
                error = %e,
                "Failed to send event reminder"
            ),
        }
    }

    Ok(sent)
}

/// A user holding several tickets for one event gets a single reminder.
fn unique_reminders(due: Vec<DueReminder>) -> Vec<DueReminder> {
    let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();
    due.into_iter()
        .filter(|r| seen.insert((r.user_id, r.event_id)))
        .collect()
}

fn reminder_text(reminder: &DueReminder, now: DateTime<Utc>) -> String {
    let minutes = (reminder.start_time - now).num_minutes().max(0);
    let when = match minutes {
        0 => "now".to_string(),
        1..=59 => format!("in {} min", minutes),
        _ if minutes < 48 * 60 => format!("in {} h", (minutes + 30) / 60),
        _ => format!("on {}", reminder.start_time.format("%Y-%m-%d %H:%M UTC")),
    };
    format!("Reminder: {} starts {}", reminder.title, when)
}
