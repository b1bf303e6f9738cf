//! `taskdash watch`: recompute the summary when the source file changes.

use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::cli::{report, Context};
use crate::error::{Error, Result};
use crate::output::{emit_error, emit_success};

pub(crate) fn run(ctx: &mut Context, debounce_ms: u64) -> Result<()> {
    let path = ctx.cache.source().path.clone();
    if !path.exists() {
        return Err(Error::SourceNotFound(path));
    }

    refresh(ctx);

    let (event_tx, event_rx) = mpsc::channel();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })?;
    // Spreadsheet editors usually replace the file, so watch its directory.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %path.display(), debounce_ms, "watching source");

    let debounce = Duration::from_millis(debounce_ms);
    let mut pending: Option<Instant> = None;

    loop {
        match event_rx.recv_timeout(wait_for(pending, Instant::now())) {
            Ok(Ok(event)) => {
                if touches(&event, &path) {
                    pending = Some(Instant::now() + debounce);
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "watch error");
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if pending.take().is_some() {
                    ctx.cache.invalidate();
                    refresh(ctx);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Time left before a pending reload fires, or a long idle wait.
fn wait_for(pending: Option<Instant>, now: Instant) -> Duration {
    pending
        .map(|deadline| deadline.saturating_duration_since(now))
        .unwrap_or(IDLE_WAIT)
}

fn touches(event: &Event, source: &Path) -> bool {
    let name = source.file_name();
    event
        .paths
        .iter()
        .any(|path| path == source || (name.is_some() && path.file_name() == name))
}

/// Print a fresh summary. A failed load is reported and the loop keeps going,
/// since the file may be mid-save.
fn refresh(ctx: &mut Context) {
    let result = report::compute(ctx).and_then(|report| {
        let human = report::summary_human(&report);
        emit_success(
            ctx.output,
            "watch",
            &report::SummaryReport::from(&report),
            Some(&human),
        )
    });
    if let Err(err) = result {
        tracing::warn!(error = %err, "reload failed");
        let _ = emit_error("watch", &err, ctx.output.json);
    }
}
