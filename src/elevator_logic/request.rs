//! Requests and the wait handle a drain worker blocks on.
//!
//! A [`Request`] is shared as `Arc<Request>`: the queue holds one reference, the
//! drain worker serving it holds another. Identity (which request is the current
//! target, which one to remove) is pointer identity, equivalence for de-duplication
//! is the [`CallKey`] triple.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use super::Dirn;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// The `(floor, direction, isPanelCall)` triple two requests are compared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallKey {
    /// Floor the request wants the cabin at
    pub floor: i32,
    /// Wanted travel direction (hall calls) or direction from the cabin (panel calls)
    pub direction: Dirn,
    /// `true` for a button inside the cabin
    pub panel: bool,
}

impl fmt::Display for CallKey {
    /// `3^` up call, `3v` down call, `3-` directionless hall call, `3*` panel call
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.panel {
            "*"
        } else {
            match self.direction {
                Dirn::Up => "^",
                Dirn::Down => "v",
                Dirn::Stop => "-",
            }
        };
        write!(f, "{}{}", self.floor, mark)
    }
}

/// Why a blocked worker woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Telemetry put the cabin on the request's floor
    Arrived,
    /// The queue preempted this request or asked for a re-scan
    Cancelled,
    /// Emergency stop on this elevator
    Stopped,
}

impl WakeReason {
    fn rank(self) -> u8 {
        match self {
            WakeReason::Arrived => 0,
            WakeReason::Cancelled => 1,
            WakeReason::Stopped => 2,
        }
    }
}

/// One-slot signal a drain worker waits on.
///
/// [`signal`](WaitHandle::signal) stores a reason and wakes the waiter. If several
/// signals land before the worker looks, the strongest wins
/// (`Stopped` > `Cancelled` > `Arrived`). A signal sent while nobody waits is kept
/// for the next [`wait`](WaitHandle::wait).
#[derive(Debug, Default)]
pub struct WaitHandle {
    pending: Mutex<Option<WakeReason>>,
    notify: Notify,
}

impl WaitHandle {
    /// Stores `reason` and wakes the worker blocked on this handle.
    pub fn signal(&self, reason: WakeReason) {
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let stronger = match *pending {
                Some(current) => reason.rank() >= current.rank(),
                None => true,
            };
            if stronger {
                *pending = Some(reason);
            }
        }
        self.notify.notify_one();
    }

    /// Takes the stored reason without waiting.
    pub fn try_take(&self) -> Option<WakeReason> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Waits for the next signal and consumes it.
    pub async fn wait(&self) -> WakeReason {
        loop {
            if let Some(reason) = self.try_take() {
                return reason;
            }
            self.notify.notified().await;
        }
    }
}

/// A hall call or panel call on its way through one elevator's queue.
#[derive(Debug)]
pub struct Request {
    id: u64,
    key: CallKey,
    redispatched: bool,
    handle: WaitHandle,
}

impl Request {
    fn build(key: CallKey, redispatched: bool) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            key,
            redispatched,
            handle: WaitHandle::default(),
        })
    }

    /// Creates a hall call from a landing button.
    pub fn hall(floor: i32, direction: Dirn) -> Arc<Self> {
        Self::build(CallKey { floor, direction, panel: false }, false)
    }

    /// Creates a panel call from a button inside the cabin.
    pub fn panel(floor: i32, direction: Dirn) -> Arc<Self> {
        Self::build(CallKey { floor, direction, panel: true }, false)
    }

    /// Fresh copy of this hall call for the re-arbitration that follows arrival.
    /// Wherever the copy lands it is served with a door cycle.
    pub fn redispatch(&self) -> Arc<Self> {
        Self::build(self.key, true)
    }

    /// Unique id, for logging
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The de-duplication triple
    pub fn key(&self) -> CallKey {
        self.key
    }

    /// Target floor
    pub fn floor(&self) -> i32 {
        self.key.floor
    }

    /// Wanted direction
    pub fn direction(&self) -> Dirn {
        self.key.direction
    }

    /// `true` for a cabin panel call
    pub fn is_panel_call(&self) -> bool {
        self.key.panel
    }

    /// `true` for a hall call already re-arbitrated once after arrival
    pub fn is_redispatched(&self) -> bool {
        self.redispatched
    }

    /// Handle the drain worker blocks on while serving this request
    pub fn handle(&self) -> &WaitHandle {
        &self.handle
    }

    /// Telemetry hook: wakes the worker if `floor` is this request's floor.
    pub fn signal_position(&self, floor: i32) {
        if floor == self.key.floor {
            self.handle.signal(WakeReason::Arrived);
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.key)
    }
}
