use std::{io::Write, time::Duration};

use anyhow::Result;
use chrono::TimeZone;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{storage::DocumentStore, tracker::StudyTracker};

use super::dashboard::render_dashboard;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Detects Ctrl-C and cancels the token.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}

/// Re-renders the dashboard on every tick until `shutdown` is cancelled. Every frame reloads the
/// store and is derived from scratch, so sessions started or paused elsewhere show up and the open
/// session keeps counting up.
pub async fn watch<S: DocumentStore, Tz: TimeZone>(
    tracker: &mut StudyTracker<S, Tz>,
    shutdown: CancellationToken,
    refresh_interval: Duration,
    out: &mut impl Write,
) -> Result<()> {
    let mut refresh_point = tracker.clock().instant();
    info!("Watching dashboard");
    loop {
        refresh_point += refresh_interval;

        tracker.reload();
        let stats = tracker.snapshot();
        write!(
            out,
            "{CLEAR_SCREEN}{}",
            render_dashboard(&stats, &tracker.document().todos)
        )?;
        out.flush()?;

        select! {
            _ = shutdown.cancelled() => {
                debug!("Stopped watching");
                return Ok(())
            }
            _ = tracker.clock().sleep_until(refresh_point) => ()
        }
    }
}
