use crate::domain::coupon::Severity;
use crate::domain::ports::{CheckoutView, FeedView};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call made against the view, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEvent {
    pub seq: usize,
    pub op: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPanel {
    Hidden,
    Checking,
    Valid(String),
    Invalid(String, Severity),
}

/// What the page would currently show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub status: StatusPanel,
    pub busy: bool,
    pub submit_enabled: bool,
    pub payment_error: Option<String>,
    pub coupon_focus_count: usize,
    pub placeholder_visible: bool,
    pub feed: Vec<String>,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            status: StatusPanel::Hidden,
            busy: false,
            submit_enabled: true,
            payment_error: None,
            coupon_focus_count: 0,
            placeholder_visible: true,
            feed: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    snapshot: ViewSnapshot,
    feed: VecDeque<String>,
    events: Vec<ViewEvent>,
}

impl Recorder {
    fn record(&mut self, op: &'static str, detail: impl Into<String>) {
        let seq = self.events.len() + 1;
        self.events.push(ViewEvent {
            seq,
            op,
            detail: detail.into(),
        });
    }
}

/// A view-model that keeps the current widget state and a log of every call.
#[derive(Debug, Default, Clone)]
pub struct RecordingView {
    inner: Arc<Mutex<Recorder>>,
}

impl RecordingView {
    /// Creates a view in its initial page-load state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let recorder = self.lock();
        let mut snapshot = recorder.snapshot.clone();
        snapshot.feed = recorder.feed.iter().cloned().collect();
        snapshot
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().events.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().events.iter().filter(|e| e.op == op).count()
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CheckoutView for RecordingView {
    fn show_checking(&self) {
        let mut r = self.lock();
        r.snapshot.status = StatusPanel::Checking;
        r.record("show_checking", "");
    }

    fn show_valid(&self, text: &str) {
        let mut r = self.lock();
        r.snapshot.status = StatusPanel::Valid(text.to_string());
        r.record("show_valid", text);
    }

    fn show_invalid(&self, text: &str, severity: Severity) {
        let mut r = self.lock();
        r.snapshot.status = StatusPanel::Invalid(text.to_string(), severity);
        r.record("show_invalid", format!("{severity}: {text}"));
    }

    fn hide_status(&self) {
        let mut r = self.lock();
        r.snapshot.status = StatusPanel::Hidden;
        r.record("hide_status", "");
    }

    fn focus_coupon(&self) {
        let mut r = self.lock();
        r.snapshot.coupon_focus_count += 1;
        r.record("focus_coupon", "");
    }

    fn set_busy(&self, busy: bool) {
        let mut r = self.lock();
        r.snapshot.busy = busy;
        r.record("set_busy", busy.to_string());
    }

    fn set_submit_enabled(&self, enabled: bool) {
        let mut r = self.lock();
        r.snapshot.submit_enabled = enabled;
        r.record("set_submit_enabled", enabled.to_string());
    }

    fn show_payment_error(&self, message: &str) {
        let mut r = self.lock();
        r.snapshot.payment_error = Some(message.to_string());
        r.record("show_payment_error", message);
    }

    fn hide_payment_error(&self) {
        let mut r = self.lock();
        r.snapshot.payment_error = None;
        r.record("hide_payment_error", "");
    }
}

impl FeedView for RecordingView {
    fn hide_placeholder(&self) {
        let mut r = self.lock();
        r.snapshot.placeholder_visible = false;
        r.record("hide_placeholder", "");
    }

    fn prepend(&self, html: &str) {
        let mut r = self.lock();
        r.feed.push_front(html.to_string());
        r.record("prepend", html);
    }

    fn remove_oldest(&self) {
        let mut r = self.lock();
        let removed = r.feed.pop_back().unwrap_or_default();
        r.record("remove_oldest", removed);
    }
}
