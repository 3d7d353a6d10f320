use super::debounce::Debouncer;
use crate::domain::coupon::{CouponQueryState, CouponResult, CouponVerdict, Severity};
use crate::domain::ports::{CheckoutViewRef, CouponApiRef, CouponRequest};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Snapshot of the coupon check as the page currently shows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponStatus {
    pub state: CouponQueryState,
    pub result: Option<CouponResult>,
    pub message: Option<String>,
}

#[derive(Default)]
struct Tracker {
    /// Sequence number of the most recently issued request.
    latest: u64,
    /// The field changed since the last check was issued.
    unchecked: bool,
    status: CouponStatus,
}

struct ValidatorInner {
    api: CouponApiRef,
    view: CheckoutViewRef,
    csrf_token: String,
    delay: Duration,
    debouncer: Debouncer,
    tracker: Mutex<Tracker>,
    /// Serializes status changes with the view calls that show them.
    /// Always taken before `tracker`, never while holding it.
    view_order: Mutex<()>,
}

/// Advisory coupon check driven by keystrokes.
///
/// Requests are debounced, and only the answer to the most recently issued
/// request is ever applied: a slow reply to an older code is dropped.
///
/// View methods are called with no validator state locked, so they may read
/// [`CouponValidator::state`]. They must not call [`CouponValidator::on_input`]
/// or [`CouponValidator::check_now`].
#[derive(Clone)]
pub struct CouponValidator {
    inner: Arc<ValidatorInner>,
}

impl CouponValidator {
    /// Creates an idle validator that waits `delay` after the last keystroke.
    pub fn new(
        api: CouponApiRef,
        view: CheckoutViewRef,
        csrf_token: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ValidatorInner {
                api,
                view,
                csrf_token: csrf_token.into(),
                delay,
                debouncer: Debouncer::new(),
                tracker: Mutex::new(Tracker::default()),
                view_order: Mutex::new(()),
            }),
        }
    }

    /// Handles the coupon field's new value after a keystroke.
    pub fn on_input(&self, code: &str) {
        if code.is_empty() {
            self.inner.debouncer.cancel();
            self.inner.reset();
            return;
        }

        self.inner.tracker().unchecked = true;
        let inner = Arc::clone(&self.inner);
        let code = code.to_string();
        self.inner.debouncer.schedule(self.inner.delay, async move {
            inner.check(code).await;
        });
    }

    /// Validates immediately, skipping the debounce window.
    pub async fn check_now(&self, code: &str) {
        if code.is_empty() {
            self.inner.reset();
            return;
        }
        self.inner.check(code.to_string()).await;
    }

    pub fn state(&self) -> CouponQueryState {
        self.inner.tracker().status.state
    }

    pub fn status(&self) -> CouponStatus {
        self.inner.tracker().status.clone()
    }

    /// `Valid` for the text currently in the field, with no newer keystroke waiting.
    pub fn is_confirmed_valid(&self) -> bool {
        let tracker = self.inner.tracker();
        tracker.status.state == CouponQueryState::Valid && !tracker.unchecked
    }

    /// A visible status that is not a confirmed discount must be fixed before paying.
    pub fn blocks_submission(&self) -> bool {
        let tracker = self.inner.tracker();
        let state = tracker.status.state;
        state.is_visible() && (state != CouponQueryState::Valid || tracker.unchecked)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// True while a keystroke is waiting out the debounce or a check is in flight.
    pub fn is_settling(&self) -> bool {
        let tracker = self.inner.tracker();
        tracker.unchecked || tracker.status.state == CouponQueryState::Checking
    }
}

impl ValidatorInner {
    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn view_order(&self) -> MutexGuard<'_, ()> {
        self.view_order.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        let _order = self.view_order();
        {
            let mut tracker = self.tracker();
            // Bumping the sequence orphans any request still in flight.
            tracker.latest += 1;
            tracker.unchecked = false;
            tracker.status = CouponStatus::default();
        }
        self.view.hide_status();
    }

    async fn check(&self, code: String) {
        let ticket = {
            let _order = self.view_order();
            let ticket = {
                let mut tracker = self.tracker();
                tracker.latest += 1;
                tracker.unchecked = false;
                tracker.status = CouponStatus {
                    state: CouponQueryState::Checking,
                    ..Default::default()
                };
                tracker.latest
            };
            self.view.show_checking();
            ticket
        };

        let request = CouponRequest {
            coupon_code: code.clone(),
            csrf_token: self.csrf_token.clone(),
        };
        let verdict = match self.api.validate(request).await {
            Ok(reply) => reply.verdict(),
            Err(e) => {
                warn!(code = %code, error = %e, "coupon validation request failed");
                CouponVerdict::Invalid {
                    message: e.to_string(),
                    severity: Severity::Error,
                }
            }
        };

        let _order = self.view_order();
        {
            let mut tracker = self.tracker();
            if tracker.latest != ticket {
                debug!(code = %code, ticket, latest = tracker.latest, "discarding stale coupon reply");
                return;
            }
            tracker.status = match &verdict {
                CouponVerdict::Valid(result) => CouponStatus {
                    state: CouponQueryState::Valid,
                    result: Some(result.clone()),
                    message: Some(result.summary()),
                },
                CouponVerdict::Invalid { message, severity } => CouponStatus {
                    state: (*severity).into(),
                    result: None,
                    message: Some(message.clone()),
                },
            };
        }

        match &verdict {
            CouponVerdict::Valid(result) => self.view.show_valid(&result.summary()),
            CouponVerdict::Invalid { message, severity } => {
                self.view.show_invalid(message, *severity)
            }
        }
        debug!(code = %code, "coupon status settled");
    }
}
