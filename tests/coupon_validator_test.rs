use async_trait::async_trait;
use checkout_flow::application::coupon::CouponValidator;
use checkout_flow::domain::coupon::{CouponQueryState, CouponReply, Severity};
use checkout_flow::domain::ports::{CheckoutView, CouponApi, CouponRequest};
use checkout_flow::error::{ClientError, Result};
use checkout_flow::infrastructure::view::{RecordingView, StatusPanel};
use rand::Rng;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

mod common;
use common::{CSRF, DEBOUNCE, default_harness, percent, reply, settle};

#[tokio::test(start_paused = true)]
async fn test_valid_coupon_summary() {
    let h = default_harness();
    h.api
        .insert(
            "SAVE20",
            reply(
                200,
                r#"{"percent_off": 20, "duration": "repeating", "duration_in_months": 3}"#,
                20,
            ),
        )
        .await;

    h.validator.on_input("SAVE20");
    settle().await;

    assert_eq!(h.validator.state(), CouponQueryState::Valid);
    assert!(h.validator.is_confirmed_valid());
    assert_eq!(
        h.view.snapshot().status,
        StatusPanel::Valid("20% off for 3 months".to_string())
    );
    assert!(h.validator.status().result.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_coupon_is_a_warning() {
    let h = default_harness();
    h.api
        .insert("BADCODE", reply(404, r#"{"error": "Coupon not found"}"#, 0))
        .await;

    h.validator.on_input("BADCODE");
    settle().await;

    assert_eq!(h.validator.state(), CouponQueryState::InvalidWarn);
    assert_eq!(
        h.view.snapshot().status,
        StatusPanel::Invalid("Coupon not found".to_string(), Severity::Warn)
    );
    assert!(h.validator.blocks_submission());
}

#[tokio::test(start_paused = true)]
async fn test_server_failure_is_an_error() {
    let h = default_harness();
    h.api
        .insert("BOOM", reply(500, r#"{"error": "Something broke"}"#, 0))
        .await;

    h.validator.on_input("BOOM");
    settle().await;

    assert_eq!(h.validator.state(), CouponQueryState::InvalidError);
    assert_eq!(
        h.view.snapshot().status,
        StatusPanel::Invalid("Something broke".to_string(), Severity::Error)
    );
}

#[tokio::test(start_paused = true)]
async fn test_keystroke_burst_sends_one_request() {
    let h = default_harness();
    h.api.insert("SAVE20", percent(20, 0)).await;

    for prefix in ["S", "SA", "SAV", "SAVE", "SAVE2", "SAVE20"] {
        h.validator.on_input(prefix);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    settle().await;

    let requests = h.api.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].coupon_code, "SAVE20");
    assert_eq!(requests[0].csrf_token, CSRF);
    assert_eq!(h.view.count("show_checking"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_is_sent_before_the_window_closes() {
    let h = default_harness();
    h.validator.on_input("SAVE20");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(h.validator.is_pending());
    assert!(h.api.requests().await.is_empty());
    assert_eq!(h.validator.state(), CouponQueryState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_to_older_code_is_discarded() {
    let h = default_harness();
    // The first code is valid but slow; the second is unknown and fast.
    h.api.insert("SLOW", percent(50, 500)).await;
    h.api
        .insert("FAST", reply(404, r#"{"error": "Coupon not found"}"#, 10))
        .await;

    h.validator.on_input("SLOW");
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(h.validator.state(), CouponQueryState::Checking);

    h.validator.on_input("FAST");
    settle().await;

    assert_eq!(h.api.requests().await.len(), 2);
    assert_eq!(h.validator.state(), CouponQueryState::InvalidWarn);
    assert_eq!(h.view.count("show_valid"), 0);
    assert!(!h.validator.is_confirmed_valid());
}

#[tokio::test(start_paused = true)]
async fn test_last_issued_request_wins_under_random_latency() {
    let h = default_harness();
    let mut rng = rand::thread_rng();
    for i in 1..=5u32 {
        h.api
            .insert(&format!("CODE{i}"), percent(i, rng.gen_range(1..500)))
            .await;
    }

    let mut handles = Vec::new();
    for i in 1..=5u32 {
        let validator = h.validator.clone();
        handles.push(tokio::spawn(async move {
            validator.check_now(&format!("CODE{i}")).await;
        }));
        tokio::task::yield_now().await;
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(h.validator.state(), CouponQueryState::Valid);
    assert_eq!(
        h.view.snapshot().status,
        StatusPanel::Valid("5% off forever".to_string())
    );
    assert_eq!(h.view.count("show_valid"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_field_resets_to_idle() {
    let h = default_harness();
    h.api.insert("SAVE20", percent(20, 0)).await;

    h.validator.on_input("SAVE20");
    settle().await;
    assert_eq!(h.validator.state(), CouponQueryState::Valid);

    h.validator.on_input("");
    assert_eq!(h.validator.state(), CouponQueryState::Idle);
    assert_eq!(h.view.snapshot().status, StatusPanel::Hidden);
    settle().await;
    assert_eq!(h.api.requests().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_field_orphans_inflight_request() {
    let h = default_harness();
    h.api.insert("SLOW", percent(10, 500)).await;

    h.validator.on_input("SLOW");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(h.validator.state(), CouponQueryState::Checking);

    h.validator.on_input("");
    settle().await;

    assert_eq!(h.validator.state(), CouponQueryState::Idle);
    assert_eq!(h.view.snapshot().status, StatusPanel::Hidden);
    assert!(!h.validator.blocks_submission());
}

#[tokio::test(start_paused = true)]
async fn test_clearing_cancels_pending_check() {
    let h = default_harness();
    h.validator.on_input("SAVE20");
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.validator.on_input("");
    settle().await;

    assert!(h.api.requests().await.is_empty());
    assert_eq!(h.view.count("show_checking"), 0);
}

struct UnreachableApi;

#[async_trait]
impl CouponApi for UnreachableApi {
    async fn validate(&self, _request: CouponRequest) -> Result<CouponReply> {
        Err(ClientError::TransportError(
            "connection refused".to_string(),
        ))
    }
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_an_error() {
    let view = RecordingView::new();
    let validator = CouponValidator::new(
        Arc::new(UnreachableApi),
        Arc::new(view.clone()),
        CSRF,
        DEBOUNCE,
    );

    validator.on_input("SAVE20");
    settle().await;

    assert_eq!(validator.state(), CouponQueryState::InvalidError);
    assert_eq!(
        view.snapshot().status,
        StatusPanel::Invalid(
            "Transport error: connection refused".to_string(),
            Severity::Error
        )
    );
}

/// A view that reads the validator back from inside its callbacks.
#[derive(Default)]
struct StateReadingView {
    validator: OnceLock<CouponValidator>,
    seen: Mutex<Vec<(&'static str, CouponQueryState)>>,
}

impl StateReadingView {
    fn note(&self, op: &'static str) {
        if let Some(validator) = self.validator.get() {
            let state = validator.state();
            self.seen.lock().unwrap().push((op, state));
        }
    }
}

impl CheckoutView for StateReadingView {
    fn show_checking(&self) {
        self.note("show_checking");
    }
    fn show_valid(&self, _text: &str) {
        self.note("show_valid");
    }
    fn show_invalid(&self, _text: &str, _severity: Severity) {
        self.note("show_invalid");
    }
    fn hide_status(&self) {
        self.note("hide_status");
    }
    fn focus_coupon(&self) {}
    fn set_busy(&self, _busy: bool) {}
    fn set_submit_enabled(&self, _enabled: bool) {}
    fn show_payment_error(&self, _message: &str) {}
    fn hide_payment_error(&self) {}
}

#[tokio::test(start_paused = true)]
async fn test_view_callbacks_can_read_validator_state() {
    let h = default_harness();
    h.api.insert("SAVE20", percent(20, 10)).await;
    let view = Arc::new(StateReadingView::default());
    let validator = CouponValidator::new(Arc::new(h.api.clone()), view.clone(), CSRF, DEBOUNCE);
    assert!(view.validator.set(validator.clone()).is_ok());

    validator.on_input("SAVE20");
    settle().await;
    validator.on_input("");

    assert_eq!(
        *view.seen.lock().unwrap(),
        vec![
            ("show_checking", CouponQueryState::Checking),
            ("show_valid", CouponQueryState::Valid),
            ("hide_status", CouponQueryState::Idle),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_new_keystroke_unconfirms_previous_code() {
    let h = default_harness();
    h.api.insert("SAVE20", percent(20, 0)).await;
    h.validator.on_input("SAVE20");
    settle().await;
    assert!(h.validator.is_confirmed_valid());

    h.validator.on_input("SAVE2");
    assert_eq!(h.validator.state(), CouponQueryState::Valid);
    assert!(!h.validator.is_confirmed_valid());
    assert!(h.validator.blocks_submission());
    assert!(h.validator.is_settling());

    settle().await;
    assert_eq!(h.validator.state(), CouponQueryState::InvalidWarn);
    assert!(!h.validator.is_settling());
}
