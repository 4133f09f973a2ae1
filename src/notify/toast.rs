//! Transient notification queue.
//!
//! [`ToastQueue`] is a cheap-to-clone handle the controllers push into and
//! the rendering layer drains via [`active`](ToastQueue::active).  Expiry is
//! timestamp-based and enforced by pruning on read — no background timer
//! task to keep alive.
//!
//! Behaviour rules:
//!
//! * an identical message within the dedup window is silently dropped,
//! * a toast carrying an action lives 5 s instead of 3 s and ignores
//!   tap-dismissal — it leaves the queue by being acted on or expiring,
//! * [`act`](ToastQueue::act) hands the attached [`Route`] back to the
//!   caller and removes the toast.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::nav::Route;

/// How long an ordinary toast stays visible.
const TOAST_TTL: Duration = Duration::from_millis(3_000);
/// How long a toast with an attached action stays visible.
const ACTION_TOAST_TTL: Duration = Duration::from_millis(5_000);
/// Window in which a repeated identical message is suppressed.
const DEDUP_WINDOW: Duration = Duration::from_millis(1_000);

// ---------------------------------------------------------------------------
// Toast / ToastKind / ToastAction
// ---------------------------------------------------------------------------

/// Visual category of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
    /// Upsell nudge; usually carries a subscribe action.
    Premium,
}

/// Single action button attached to a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAction {
    /// Button label, e.g. `"Upgrade"`.
    pub label: String,
    /// Where acting on the toast takes the learner.
    pub route: Route,
}

/// One visible notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub action: Option<ToastAction>,
    expires_at: Instant,
}

// ---------------------------------------------------------------------------
// ToastQueue
// ---------------------------------------------------------------------------

struct Inner {
    entries: Vec<Toast>,
    next_id: u64,
    last_message: Option<String>,
    last_shown_at: Option<Instant>,
    dedup_window: Duration,
    ttl: Duration,
    action_ttl: Duration,
}

/// Shared toast queue handle.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<Inner>>,
}

impl ToastQueue {
    /// Queue with the product's default timings.
    pub fn new() -> Self {
        Self::with_timings(DEDUP_WINDOW, TOAST_TTL, ACTION_TOAST_TTL)
    }

    /// Queue with the dedup window from settings and default lifetimes.
    pub fn from_config(config: &crate::config::SessionConfig) -> Self {
        Self::with_timings(
            Duration::from_millis(config.toast_dedup_ms),
            TOAST_TTL,
            ACTION_TOAST_TTL,
        )
    }

    /// Queue with explicit timings (config override, fast tests).
    pub fn with_timings(dedup_window: Duration, ttl: Duration, action_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: Vec::new(),
                next_id: 0,
                last_message: None,
                last_shown_at: None,
                dedup_window,
                ttl,
                action_ttl,
            })),
        }
    }

    /// Show a plain toast.  Returns `None` when the message was suppressed
    /// as a duplicate.
    pub fn show(&self, kind: ToastKind, message: impl Into<String>) -> Option<u64> {
        self.push(kind, message.into(), None)
    }

    /// Show a toast with an attached action (longer lifetime, not
    /// tap-dismissable).
    pub fn show_with_action(
        &self,
        kind: ToastKind,
        message: impl Into<String>,
        action: ToastAction,
    ) -> Option<u64> {
        self.push(kind, message.into(), Some(action))
    }

    pub fn info(&self, message: impl Into<String>) -> Option<u64> {
        self.show(ToastKind::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> Option<u64> {
        self.show(ToastKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Option<u64> {
        self.show(ToastKind::Error, message)
    }

    /// Upsell toast with a routed action button.
    pub fn premium(
        &self,
        message: impl Into<String>,
        label: impl Into<String>,
        route: Route,
    ) -> Option<u64> {
        self.show_with_action(
            ToastKind::Premium,
            message,
            ToastAction {
                label: label.into(),
                route,
            },
        )
    }

    /// Currently visible toasts, oldest first.  Expired entries are pruned
    /// before the snapshot is taken.
    pub fn active(&self) -> Vec<Toast> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        inner.entries.retain(|t| t.expires_at > now);
        inner.entries.clone()
    }

    /// Tap-dismiss.  Ignored when the toast carries an action — those leave
    /// the queue only by being acted on or expiring.
    pub fn dismiss(&self, id: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .entries
            .retain(|t| t.id != id || t.action.is_some());
    }

    /// Act on a toast: removes it and returns the route to navigate to.
    pub fn act(&self, id: u64) -> Option<Route> {
        let mut inner = self.inner.lock().unwrap();
        let pos = inner
            .entries
            .iter()
            .position(|t| t.id == id && t.action.is_some())?;
        let toast = inner.entries.remove(pos);
        toast.action.map(|a| a.route)
    }

    fn push(&self, kind: ToastKind, message: String, action: Option<ToastAction>) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();

        // Duplicate suppression; the window anchors on the last *shown*
        // toast, so sustained spam surfaces once per window.
        if let (Some(last), Some(at)) = (&inner.last_message, inner.last_shown_at) {
            if *last == message && now.duration_since(at) < inner.dedup_window {
                log::debug!("toast suppressed (duplicate): {message}");
                return None;
            }
        }

        let ttl = if action.is_some() {
            inner.action_ttl
        } else {
            inner.ttl
        };
        let id = inner.next_id;
        inner.next_id += 1;
        inner.last_message = Some(message.clone());
        inner.last_shown_at = Some(now);
        inner.entries.push(Toast {
            id,
            kind,
            message,
            action,
            expires_at: now + ttl,
        });
        Some(id)
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
