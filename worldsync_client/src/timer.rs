//! Object-owned timers.
//!
//! Objects schedule work for later (hide an emote, finish a drop-in) and keep
//! the returned handle. Destroying an object kills its handles, so a timer
//! never reaches an owner that is gone or whose ID was reused.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use worldsync_shared::protocol::ObjectId;

/// What to do when a timer fires; interpreted by the owning object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    HideEmote,
    SettleMarker,
}

/// Cancellation handle for one scheduled timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    killed: Arc<AtomicBool>,
}

impl TimerHandle {
    fn new() -> Self {
        Self {
            killed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels the timer. Killing twice is harmless.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::Relaxed);
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct PendingTimer {
    owner: ObjectId,
    kind: TimerKind,
    due: Instant,
    handle: TimerHandle,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub owner: ObjectId,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    pub fn schedule(&mut self, owner: ObjectId, kind: TimerKind, delay: Duration, now: Instant) -> TimerHandle {
        let handle = TimerHandle::new();
        self.pending.push(PendingTimer {
            owner,
            kind,
            due: now + delay,
            handle: handle.clone(),
        });
        handle
    }

    /// Removes and returns live timers due at `now`, earliest first.
    /// Killed timers are dropped silently.
    pub fn due(&mut self, now: Instant) -> Vec<FiredTimer> {
        self.pending.retain(|t| !t.handle.is_killed());
        let mut fired: Vec<PendingTimer> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                fired.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        fired.sort_by_key(|t| t.due);
        fired
            .into_iter()
            .map(|t| FiredTimer {
                owner: t.owner,
                kind: t.kind,
            })
            .collect()
    }

    /// Timers not yet fired or killed.
    pub fn len(&self) -> usize {
        self.pending.iter().filter(|t| !t.handle.is_killed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kills and drops every pending timer.
    pub fn clear(&mut self) {
        for timer in self.pending.drain(..) {
            timer.handle.kill();
        }
    }
}
