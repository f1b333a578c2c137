//! Change observation: mutation qualification, debounce, navigation.
//!
//! The observer is the only component that decides *when* to scan. It
//! consumes the document's mutation stream, discards self-inflicted
//! records (everything the annotation layer writes is marked), coalesces
//! bursts behind a debounce window, and watches for navigation both via
//! the navigation-controller attribute and a low-frequency location poll.

use crate::dom::{Document, DocumentHandle, MutationRecord};
use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};
use triage_protocol::defaults::{DEBOUNCE_DELAY_MS, LOCATION_POLL_INTERVAL_MS, NAV_CONTROLLER_ATTR};

/// Observer lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Nothing pending; waiting for a qualifying change.
    Idle,
    /// A qualifying change arrived; the debounce timer is running and any
    /// further qualifying change resets it.
    PendingDebounce,
    /// A scan cycle is executing. Entered only from an elapsed debounce.
    Scanning,
}

/// Timer configuration. Tests shrink these; production uses the defaults.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub debounce: Duration,
    pub location_poll: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_DELAY_MS),
            location_poll: Duration::from_millis(LOCATION_POLL_INTERVAL_MS),
        }
    }
}

/// Decide whether a mutation should schedule a rescan.
///
/// Self-filter: a record whose entire added-node set carries the reserved
/// marker is the annotation layer's own write and must be discarded -
/// without this, every reconciliation would retrigger observation and
/// loop forever. Record-only mutations (text edits, removals) are judged
/// by their target's marker. Navigation-controller attribute writes
/// always qualify, marker or not.
pub fn qualifies(doc: &Document, record: &MutationRecord) -> bool {
    if record.attribute_changed.as_deref() == Some(NAV_CONTROLLER_ATTR) {
        return true;
    }
    if record.added_nodes.is_empty() {
        return !doc.is_marked(record.target);
    }
    !record
        .added_nodes
        .iter()
        .all(|&node| doc.is_marked(node))
}

/// Running observer instance. Dropping the handle (or calling
/// [`ObserverHandle::stop`]) signals the task to exit; an in-flight scan
/// always runs to completion first.
pub struct ObserverHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) struct ChangeObserver {
    doc: DocumentHandle,
    mutations: mpsc::UnboundedReceiver<MutationRecord>,
    config: ObserverConfig,
}

impl ChangeObserver {
    pub(crate) fn new(
        doc: DocumentHandle,
        mutations: mpsc::UnboundedReceiver<MutationRecord>,
        config: ObserverConfig,
    ) -> Self {
        Self {
            doc,
            mutations,
            config,
        }
    }

    /// Spawn the observer loop. The returned handle is the single
    /// ownership point: replacing it tears the loop down.
    pub(crate) fn spawn(self, orchestrator: Arc<Orchestrator>) -> ObserverHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(orchestrator, shutdown_rx));
        ObserverHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(mut self, orchestrator: Arc<Orchestrator>, mut shutdown: oneshot::Receiver<()>) {
        let mut poll = tokio::time::interval(self.config.location_poll);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_location = self.doc.lock().location().to_string();

        // Schedule an initial debounced scan so the document's current
        // state is annotated without waiting for a mutation.
        let mut state = ObserverState::PendingDebounce;
        let mut deadline = Instant::now() + self.config.debounce;

        loop {
            let pending = state == ObserverState::PendingDebounce;
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Observer shutting down");
                    break;
                }
                maybe_record = self.mutations.recv() => {
                    let Some(record) = maybe_record else {
                        debug!("Mutation stream closed; observer exiting");
                        break;
                    };
                    let qualifying = qualifies(&self.doc.lock(), &record);
                    if qualifying {
                        trace!(target = %record.target, "Qualifying mutation; arming debounce");
                        transition(&mut state, ObserverState::PendingDebounce);
                        deadline = Instant::now() + self.config.debounce;
                    }
                }
                _ = tokio::time::sleep_until(deadline), if pending => {
                    transition(&mut state, ObserverState::Scanning);
                    orchestrator.run_scan().await;
                    transition(&mut state, ObserverState::Idle);
                }
                _ = poll.tick() => {
                    let location = self.doc.lock().location().to_string();
                    if location != last_location {
                        debug!(%location, "Location changed (poll)");
                        last_location = location;
                        transition(&mut state, ObserverState::PendingDebounce);
                        deadline = Instant::now() + self.config.debounce;
                    }
                }
            }
        }
    }
}

fn transition(state: &mut ObserverState, to: ObserverState) {
    trace!(from = ?*state, to = ?to, "Observer state transition");
    *state = to;
}
