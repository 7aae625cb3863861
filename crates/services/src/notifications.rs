use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::AbortHandle;

use eco_core::Clock;
use eco_core::model::{Notification, NotificationId, NotificationKind};

use crate::config::NotificationTimings;

/// Where a toast is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    /// Exit transition running; removal follows.
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    pub notification: Notification,
    pub phase: ToastPhase,
}

struct Slot {
    entry: NotificationEntry,
    timer: Option<AbortHandle>,
}

struct Shared {
    clock: Clock,
    timings: NotificationTimings,
    slots: Mutex<Vec<Slot>>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn start_leaving(&self, id: NotificationId) -> bool {
        let changed = {
            let mut slots = self.slots();
            match slots.iter_mut().find(|slot| slot.entry.notification.id == id) {
                Some(slot) => {
                    slot.entry.phase = ToastPhase::Leaving;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.bump();
        }
        changed
    }

    /// Removal is keyed by id, so whichever of timer and dismissal comes second is a no-op.
    fn remove(&self, id: NotificationId, abort_timer: bool) -> bool {
        let removed = {
            let mut slots = self.slots();
            let index = slots
                .iter()
                .position(|slot| slot.entry.notification.id == id);
            index.map(|index| slots.remove(index))
        };
        let Some(slot) = removed else {
            return false;
        };
        if abort_timer {
            if let Some(timer) = slot.timer {
                timer.abort();
            }
        }
        self.bump();
        true
    }
}

/// Page-wide stack of transient messages.
///
/// Cheap to clone; every clone shares the same stack. Insertion is append-only and
/// each toast owns an independent expiry timer.
#[derive(Clone)]
pub struct NotificationCenter {
    shared: Arc<Shared>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new(clock: Clock, timings: NotificationTimings) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                clock,
                timings,
                slots: Mutex::new(Vec::new()),
                revision,
            }),
        }
    }

    /// Push a toast. Outside a Tokio runtime it stays until dismissed.
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) -> NotificationId {
        let notification = Notification::new(kind, message, self.shared.clock.now());
        let id = notification.id;
        tracing::debug!(%id, kind = kind.label(), "showing notification");

        let timer = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(
                runtime
                    .spawn(expire(
                        Arc::downgrade(&self.shared),
                        id,
                        self.shared.timings,
                    ))
                    .abort_handle(),
            ),
            Err(_) => {
                tracing::warn!(%id, "no async runtime; notification will not auto-dismiss");
                None
            }
        };

        self.shared.slots().push(Slot {
            entry: NotificationEntry {
                notification,
                phase: ToastPhase::Visible,
            },
            timer,
        });
        self.shared.bump();
        id
    }

    /// Close a toast now, cancelling its pending expiry. Returns false if it is already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let removed = self.shared.remove(id, true);
        if removed {
            tracing::debug!(%id, "notification dismissed");
        }
        removed
    }

    /// Current stack, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NotificationEntry> {
        self.shared
            .slots()
            .iter()
            .map(|slot| slot.entry.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.slots().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver that changes whenever the stack does.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Drop every toast and cancel all timers (view teardown).
    pub fn clear(&self) {
        let drained: Vec<Slot> = self.shared.slots().drain(..).collect();
        if drained.is_empty() {
            return;
        }
        for timer in drained.into_iter().filter_map(|slot| slot.timer) {
            timer.abort();
        }
        self.shared.bump();
    }
}

async fn expire(shared: Weak<Shared>, id: NotificationId, timings: NotificationTimings) {
    tokio::time::sleep(timings.visible_for).await;
    match shared.upgrade() {
        Some(shared) if shared.start_leaving(id) => {}
        _ => return,
    }

    tokio::time::sleep(timings.exit_for).await;
    if let Some(shared) = shared.upgrade() {
        if shared.remove(id, false) {
            tracing::debug!(%id, "notification expired");
        }
    }
}
