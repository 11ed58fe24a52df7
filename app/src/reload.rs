//! Single-flight reload loop.
//!
//! A pass is: snapshot the store -> compile -> compare with the applied
//! document -> publish when different. [`ReloadGate`] serializes passes:
//! triggers never block, at most one pass runs, and any number of triggers
//! that arrive while a pass runs collapse into one follow-up pass.
//!
//! On a failed compile the applied document stays in force; the next trigger
//! simply tries again.

use crate::publish::Publisher;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use xr_config::diff::{diff, equals, Diff};
use xr_config::{compile, ConfigDocument, InboundStore, Passthrough};
use xr_types::CompileError;

/// Coalescing trigger for reload passes.
#[derive(Debug, Default)]
pub struct ReloadGate {
    // `notify_one` keeps at most one permit: that permit is the pending pass
    notify: Notify,
    triggers: AtomicU64,
}

impl ReloadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a pass. Never blocks.
    pub fn trigger(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Wait until a pass is pending and claim it.
    pub async fn pending(&self) {
        self.notify.notified().await;
    }

    /// Triggers received so far, coalesced or not.
    pub fn trigger_count(&self) -> u64 {
        self.triggers.load(Ordering::Relaxed)
    }
}

/// Result of one pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// Compiled document equals the applied one; nothing published.
    Unchanged,
    /// New document published and now applied.
    Published(Diff),
    /// Compile aborted; the applied document is kept.
    CompileFailed(CompileError),
    /// Publisher failed; the applied document is kept.
    PublishFailed(String),
}

/// Holds the last applied document and runs passes against it.
pub struct Reloader<S, P> {
    store: S,
    passthrough: Passthrough,
    publisher: P,
    applied: Option<ConfigDocument>,
    passes: u64,
}

impl<S: InboundStore, P: Publisher> Reloader<S, P> {
    pub fn new(store: S, passthrough: Passthrough, publisher: P) -> Self {
        Self {
            store,
            passthrough,
            publisher,
            applied: None,
            passes: 0,
        }
    }

    /// Start from an already published document so an unchanged store does
    /// not republish after a restart.
    #[must_use]
    pub fn with_applied(mut self, applied: Option<ConfigDocument>) -> Self {
        self.applied = applied;
        self
    }

    pub fn applied(&self) -> Option<&ConfigDocument> {
        self.applied.as_ref()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn pass(&mut self) -> PassOutcome {
        self.passes += 1;
        let compiled = match compile(&self.store, &self.passthrough) {
            Ok(c) => c,
            Err(e) => {
                error!(code = %e.code(), error = %e, "compile failed; keeping applied config");
                return PassOutcome::CompileFailed(e);
            }
        };
        let document = compiled.document;

        if let Some(applied) = &self.applied {
            if equals(applied, &document) {
                debug!(pass = self.passes, "config unchanged");
                return PassOutcome::Unchanged;
            }
        }
        let change = self
            .applied
            .as_ref()
            .map(|applied| diff(applied, &document))
            .unwrap_or_default();

        if let Err(e) = self.publisher.publish(&document) {
            error!(error = %format!("{e:#}"), "publish failed; keeping applied config");
            return PassOutcome::PublishFailed(format!("{e:#}"));
        }
        info!(
            pass = self.passes,
            fingerprint = %document.fingerprint().unwrap_or_default(),
            inbounds_added = change.inbounds.added.len(),
            inbounds_removed = change.inbounds.removed.len(),
            inbounds_changed = change.inbounds.changed.len(),
            outbounds_added = change.outbounds.added.len(),
            outbounds_removed = change.outbounds.removed.len(),
            rules_added = change.rules.added.len(),
            rules_removed = change.rules.removed.len(),
            reordered = change.inbounds_reordered || change.outbounds_reordered,
            sections = ?change.sections,
            "config published; engine restart required"
        );
        self.applied = Some(document);
        PassOutcome::Published(change)
    }
}

/// Run passes as the gate releases them until `shutdown` resolves.
pub async fn run<S, P, F>(gate: Arc<ReloadGate>, mut reloader: Reloader<S, P>, shutdown: F) -> Reloader<S, P>
where
    S: InboundStore,
    P: Publisher,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            () = gate.pending() => {
                let outcome = reloader.pass();
                debug!(pass = reloader.passes(), outcome = ?outcome, "reload pass done");
            }
        }
    }
    info!(passes = reloader.passes(), triggers = gate.trigger_count(), "reload loop stopped");
    reloader
}

/// Trigger the gate when `path` is created or modified.
///
/// The parent directory is watched so atomic replace-by-rename is seen too.
/// Keep the returned watcher alive for as long as triggers are wanted.
pub fn watch_file(path: &Path, gate: Arc<ReloadGate>) -> Result<RecommendedWatcher> {
    let name = path
        .file_name()
        .map(ToOwned::to_owned)
        .with_context(|| format!("{} has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(name.as_os_str()));
            if relevant {
                debug!(paths = ?event.paths, "records file changed");
                gate.trigger();
            }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    })?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {}", dir.display()))?;
    info!(path = %path.display(), "watching records file");
    Ok(watcher)
}

/// Trigger the gate every `period`. `period` must be non-zero.
pub fn spawn_interval(gate: Arc<ReloadGate>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            gate.trigger();
        }
    })
}
