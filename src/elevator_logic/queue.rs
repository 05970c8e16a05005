//! # Request queue
//!
//! Per-elevator ordered set of pending [`Request`]s, the request currently being
//! served and the cached top/bottom floor of everything pending.
//!
//! All state sits behind one mutex that never leaves this module. Callers only get
//! the atomic operations: [`register`](RequestQueue::register),
//! [`remove`](RequestQueue::remove), [`next_up`](RequestQueue::next_up),
//! [`next_down`](RequestQueue::next_down) and
//! [`contains_equivalent`](RequestQueue::contains_equivalent), plus read-only
//! snapshots and the wake helpers used by telemetry and emergency stop.
//!
//! Invariants held under the lock:
//! - `requests` is sorted ascending by floor and holds no two requests with the same [`CallKey`]
//! - `current`, when set, is a member of `requests`
//! - `top`/`bottom` are the max/min pending floor, or the cabin's floor when empty

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config;

use super::floor::offset_along;
use super::request::{CallKey, Request, WakeReason};
use super::Dirn;

/// Outcome of [`RequestQueue::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// An equivalent request is already queued, nothing changed
    Rejected,
    /// Inserted, the current target is unchanged (or the request became the first target)
    Queued,
    /// Inserted and took over as current target, the old target's waiter was cancelled
    Preempted,
}

#[derive(Debug, Default)]
struct QueueInner {
    requests: Vec<Arc<Request>>,
    current: Option<Arc<Request>>,
    top: i32,
    bottom: i32,
}

impl QueueInner {
    fn contains(&self, key: &CallKey) -> bool {
        self.requests.iter().any(|r| r.key() == *key)
    }

    fn is_member(&self, request: &Arc<Request>) -> bool {
        self.requests.iter().any(|r| Arc::ptr_eq(r, request))
    }

    fn is_current(&self, request: &Arc<Request>) -> bool {
        self.current.as_ref().is_some_and(|c| Arc::ptr_eq(c, request))
    }

    fn recompute_bounds(&mut self, position: f64) {
        match (self.requests.first(), self.requests.last()) {
            (Some(low), Some(high)) => {
                self.bottom = low.floor();
                self.top = high.floor();
            }
            _ => {
                let here = position.round() as i32;
                self.bottom = here;
                self.top = here;
            }
        }
    }

    /// Closest pending request at or ahead of `position` in `heading`.
    ///
    /// Walks the queue in floor order from the cabin outwards and stops at the first
    /// floor that has a candidate. On that floor a request wanting `heading` is preferred.
    fn closest(&self, position: f64, heading: Dirn) -> Option<Arc<Request>> {
        let tolerance = config::FLOOR_TOLERANCE_LOW;
        let ahead = |r: &&Arc<Request>| match heading {
            Dirn::Up => r.floor() as f64 >= position - tolerance,
            Dirn::Down => r.floor() as f64 <= position + tolerance,
            Dirn::Stop => false,
        };
        let walk: Vec<&Arc<Request>> = match heading {
            Dirn::Down => self.requests.iter().rev().filter(ahead).collect(),
            _ => self.requests.iter().filter(ahead).collect(),
        };

        let mut best: Option<&Arc<Request>> = None;
        for candidate in walk {
            match best {
                None => best = Some(candidate),
                Some(found) if found.floor() != candidate.floor() => break,
                Some(found) => {
                    if found.direction() != heading && candidate.direction() == heading {
                        best = Some(candidate);
                    }
                }
            }
        }
        best.cloned()
    }
}

/// Pending requests of one elevator.
#[derive(Debug, Default)]
pub struct RequestQueue {
    inner: Mutex<QueueInner>,
}

impl RequestQueue {
    /// Creates an empty queue for a cabin resting at the bottom floor.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts `request` in floor order and arbitrates it against the current target.
    ///
    /// `position` and `travel` are the cabin's live position and direction of travel,
    /// used for the panel-call offset comparison and the bounds cache.
    ///
    /// The new request replaces the current target when, checked in order:
    /// 1. it wants the same direction as the target and comes before it when moving
    ///    that way (above a down target, below an up target),
    /// 2. it is a panel call and the target is a hall call, or it lies further ahead
    ///    in the direction of travel than the target,
    /// 3. the target sits at the bottom terminal and the new request wants down.
    ///
    /// A replaced target's waiter gets [`WakeReason::Cancelled`]. Independently, a panel
    /// call that did not become the target cancels the target's waiter so the worker re-scans.
    pub fn register(&self, request: Arc<Request>, position: f64, travel: Dirn) -> Registration {
        let mut q = self.lock();
        if q.contains(&request.key()) {
            return Registration::Rejected;
        }

        let at = q.requests.partition_point(|r| r.floor() <= request.floor());
        q.requests.insert(at, request.clone());
        q.recompute_bounds(position);

        let current = match q.current.clone() {
            Some(current) => current,
            None => {
                q.current = Some(request);
                return Registration::Queued;
            }
        };

        let mut outcome = Registration::Queued;
        if preempts(&current, &request, position, travel) {
            q.current = Some(request.clone());
            current.handle().signal(WakeReason::Cancelled);
            outcome = Registration::Preempted;
        }

        if request.is_panel_call() && !q.is_current(&request) {
            if let Some(target) = &q.current {
                target.handle().signal(WakeReason::Cancelled);
            }
        }
        outcome
    }

    /// `true` if a request with the same `(floor, direction, panel)` triple is queued.
    pub fn contains_equivalent(&self, key: &CallKey) -> bool {
        self.lock().contains(key)
    }

    /// Next request to serve when heading up.
    ///
    /// Returns the current target unchanged while it is queued. Otherwise picks the
    /// closest request at or above the cabin and makes it the target. Landing on the
    /// bottom terminal, a waiting down call there takes precedence.
    pub fn next_up(&self, position: f64) -> Option<Arc<Request>> {
        let mut q = self.lock();
        if let Some(current) = q.current.clone() {
            if q.is_member(&current) {
                return Some(current);
            }
        }
        let mut pick = q.closest(position, Dirn::Up);
        if pick.as_ref().map(|r| r.floor()) == Some(config::BOUNDARY_FLOOR) {
            if let Some(down) = q.closest(position, Dirn::Down) {
                pick = Some(down);
            }
        }
        q.current = pick.clone();
        pick
    }

    /// Next request to serve when heading down. Mirror of [`next_up`](Self::next_up)
    /// without the boundary special case.
    pub fn next_down(&self, position: f64) -> Option<Arc<Request>> {
        let mut q = self.lock();
        if let Some(current) = q.current.clone() {
            if q.is_member(&current) {
                return Some(current);
            }
        }
        let pick = q.closest(position, Dirn::Down);
        q.current = pick.clone();
        pick
    }

    /// Removes `request` by identity. Clears the current target if it was this request.
    pub fn remove(&self, request: &Arc<Request>, position: f64) -> bool {
        let mut q = self.lock();
        let before = q.requests.len();
        q.requests.retain(|r| !Arc::ptr_eq(r, request));
        if q.is_current(request) {
            q.current = None;
        }
        q.recompute_bounds(position);
        q.requests.len() != before
    }

    /// The request being served, if any
    pub fn current_target(&self) -> Option<Arc<Request>> {
        self.lock().current.clone()
    }

    /// `true` if `request` is still the current target
    pub fn is_current(&self, request: &Arc<Request>) -> bool {
        self.lock().is_current(request)
    }

    /// Telemetry hook: wakes every waiter whose request is on `floor`.
    pub fn signal_position(&self, floor: i32) {
        for request in self.lock().requests.iter() {
            request.signal_position(floor);
        }
    }

    /// Signals the current target's waiter. Returns `false` when there is no target.
    pub fn signal_current(&self, reason: WakeReason) -> bool {
        match &self.lock().current {
            Some(current) => {
                current.handle().signal(reason);
                true
            }
            None => false,
        }
    }

    /// Drops wake signals nobody consumed, so a released elevator does not act on them.
    pub fn discard_signals(&self) {
        for request in self.lock().requests.iter() {
            request.handle().try_take();
        }
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.lock().requests.len()
    }

    /// `true` when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.lock().requests.is_empty()
    }

    /// Keys of all pending requests, in floor order
    pub fn keys(&self) -> Vec<CallKey> {
        self.lock().requests.iter().map(|r| r.key()).collect()
    }

    /// Highest pending floor, or the cabin's floor at the last mutation when empty
    pub fn top_floor(&self) -> i32 {
        self.lock().top
    }

    /// Lowest pending floor, or the cabin's floor at the last mutation when empty
    pub fn bottom_floor(&self) -> i32 {
        self.lock().bottom
    }
}

fn preempts(current: &Request, new: &Request, position: f64, travel: Dirn) -> bool {
    let target_floor = current.floor();
    let wanted = current.direction();

    let on_the_way = wanted == new.direction()
        && match wanted {
            Dirn::Down => target_floor < new.floor(),
            Dirn::Up => target_floor > new.floor(),
            Dirn::Stop => false,
        };
    if on_the_way {
        return true;
    }

    if new.is_panel_call()
        && (!current.is_panel_call()
            || offset_along(new.floor(), position, travel) > offset_along(target_floor, position, travel))
    {
        return true;
    }

    target_floor == config::BOUNDARY_FLOOR && new.direction() == Dirn::Down
}
