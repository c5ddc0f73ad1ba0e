//! Daily sync timer. Sleeps until the next local slot instead of polling the clock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ScheduleSettings;
use crate::sync::{SyncError, SyncOrchestrator, SyncTrigger};

/// Next instant strictly after `now` at which the local clock in `tz` reads
/// `hour:minute`. Local times skipped by a DST jump are skipped; ambiguous
/// ones resolve to the earlier instant.
pub fn next_slot_after(now: DateTime<Utc>, tz: Tz, hour: u32, minute: u32) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    loop {
        if let Some(candidate) = date
            .and_hms_opt(hour, minute, 0)
            .and_then(|local| tz.from_local_datetime(&local).earliest())
        {
            let candidate = candidate.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
        let Some(following) = date.succ_opt() else {
            return DateTime::<Utc>::MAX_UTC;
        };
        date = following;
    }
}

/// When the timer should fire next. A slot whose local date already ran is
/// skipped, which keeps a slightly early wake-up from running the same slot twice.
pub fn next_run(
    now: DateTime<Utc>,
    last_run_date: Option<NaiveDate>,
    settings: &ScheduleSettings,
) -> DateTime<Utc> {
    let (tz, hour, minute) = (settings.timezone, settings.hour, settings.minute);
    let next = next_slot_after(now, tz, hour, minute);
    if last_run_date == Some(local_date(next, tz)) {
        next_slot_after(next, tz, hour, minute)
    } else {
        next
    }
}

fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Spawns the background timer. Runs once at startup when configured, then
/// once per local day at the configured slot.
pub fn spawn(orchestrator: Arc<SyncOrchestrator>, settings: ScheduleSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Scheduler started. Will sync daily at {:02}:{:02} {}",
            settings.hour, settings.minute, settings.tz_label
        );

        if settings.sync_on_startup {
            run_logged(&orchestrator, SyncTrigger::Startup).await;
        }

        let mut last_run_date: Option<NaiveDate> = None;
        loop {
            let now = Utc::now();
            let next = next_run(now, last_run_date, &settings);
            info!("Next scheduled sync at {next}");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            last_run_date = Some(local_date(next, settings.timezone));
            run_logged(&orchestrator, SyncTrigger::Scheduled).await;
        }
    })
}

/// Background failures are logged only; there is no caller to report to.
async fn run_logged(orchestrator: &SyncOrchestrator, trigger: SyncTrigger) {
    match orchestrator.run(trigger).await {
        Ok(_) => {}
        Err(SyncError::AlreadyRunning) => {
            warn!(?trigger, "Skipped: a manual sync was already running")
        }
        Err(e) => error!(?trigger, "Background sync failed: {e}"),
    }
}
