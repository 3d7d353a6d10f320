use checkout_flow::application::checkout::CheckoutController;
use checkout_flow::application::coupon::CouponValidator;
use checkout_flow::domain::coupon::CouponReply;
use checkout_flow::domain::payment::{PublishableKey, TokenReply};
use checkout_flow::infrastructure::in_memory::{
    InMemoryForm, ScriptedCouponApi, ScriptedProcessor, ScriptedReply,
};
use checkout_flow::infrastructure::view::RecordingView;
use std::sync::Arc;
use std::time::Duration;

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const CSRF: &str = "csrf-token";

pub struct Harness {
    pub api: ScriptedCouponApi,
    pub processor: ScriptedProcessor,
    pub form: InMemoryForm,
    pub view: RecordingView,
    pub validator: CouponValidator,
    pub checkout: Arc<CheckoutController>,
}

pub fn harness(key: Option<&str>, token: TokenReply, token_delay: Duration) -> Harness {
    let api = ScriptedCouponApi::new();
    let processor = ScriptedProcessor::new(token, token_delay);
    let form = InMemoryForm::with_name("Ann Example");
    let view = RecordingView::new();

    let validator = CouponValidator::new(
        Arc::new(api.clone()),
        Arc::new(view.clone()),
        CSRF,
        DEBOUNCE,
    );
    let checkout = Arc::new(CheckoutController::new(
        validator.clone(),
        Arc::new(processor.clone()),
        Arc::new(form.clone()),
        Arc::new(view.clone()),
        PublishableKey::parse(key),
    ));

    Harness {
        api,
        processor,
        form,
        view,
        validator,
        checkout,
    }
}

pub fn default_harness() -> Harness {
    harness(Some("pk_test_123"), TokenReply::token("tok_1"), Duration::ZERO)
}

pub fn reply(status: u16, body: &str, delay_ms: u64) -> ScriptedReply {
    ScriptedReply::new(CouponReply::new(status, body), Duration::from_millis(delay_ms))
}

pub fn percent(value: u32, delay_ms: u64) -> ScriptedReply {
    reply(
        200,
        &format!(r#"{{"percent_off": {value}, "duration": "forever"}}"#),
        delay_ms,
    )
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}
