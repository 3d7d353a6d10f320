use crate::domain::coupon::CouponReply;
use crate::domain::payment::{CardFields, PaymentFormFields, PublishableKey, TokenReply};
use crate::domain::ports::{CheckoutForm, CouponApi, CouponRequest, PaymentProcessor};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;

/// A canned coupon answer and how long the "server" takes to give it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedReply {
    pub reply: CouponReply,
    pub delay: Duration,
}

impl ScriptedReply {
    pub fn new(reply: CouponReply, delay: Duration) -> Self {
        Self { reply, delay }
    }
}

/// Coupon endpoint backed by a table of canned replies.
///
/// Codes are matched case-insensitively, like the real endpoint which
/// upper-cases them. Unknown codes get a 404.
#[derive(Default, Clone)]
pub struct ScriptedCouponApi {
    replies: Arc<RwLock<HashMap<String, ScriptedReply>>>,
    requests: Arc<RwLock<Vec<CouponRequest>>>,
}

impl ScriptedCouponApi {
    /// Creates an endpoint that knows no codes.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, code: &str, reply: ScriptedReply) {
        let mut replies = self.replies.write().await;
        replies.insert(code.to_uppercase(), reply);
    }

    pub async fn requests(&self) -> Vec<CouponRequest> {
        self.requests.read().await.clone()
    }

    fn not_found() -> ScriptedReply {
        ScriptedReply::new(
            CouponReply::new(404, r#"{"error": "Discount code not found."}"#),
            Duration::ZERO,
        )
    }
}

#[async_trait]
impl CouponApi for ScriptedCouponApi {
    async fn validate(&self, request: CouponRequest) -> Result<CouponReply> {
        let scripted = {
            let replies = self.replies.read().await;
            replies
                .get(&request.coupon_code.to_uppercase())
                .cloned()
                .unwrap_or_else(Self::not_found)
        };
        self.requests.write().await.push(request);

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        Ok(scripted.reply)
    }
}

/// Card processor that always answers with the same reply.
#[derive(Clone)]
pub struct ScriptedProcessor {
    reply: Arc<RwLock<TokenReply>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProcessor {
    /// Creates a processor that answers every request with `reply` after `delay`.
    pub fn new(reply: TokenReply, delay: Duration) -> Self {
        Self {
            reply: Arc::new(RwLock::new(reply)),
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn set_reply(&self, reply: TokenReply) {
        *self.reply.write().await = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn create_token(&self, _key: &PublishableKey, _card: &CardFields) -> Result<TokenReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.read().await.clone())
    }
}

#[derive(Debug, Default)]
struct FormState {
    fields: PaymentFormFields,
    hidden: Vec<(String, String)>,
}

/// Payment form kept in memory; counts real submissions.
#[derive(Default, Clone)]
pub struct InMemoryForm {
    state: Arc<Mutex<FormState>>,
    submissions: Arc<AtomicUsize>,
}

impl InMemoryForm {
    /// Creates an empty, unsubmitted form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a form with the payer name already filled in.
    pub fn with_name(name: &str) -> Self {
        let form = Self::new();
        form.set_name(name);
        form
    }

    pub fn set_name(&self, name: &str) {
        self.lock().fields.name = name.to_string();
    }

    pub fn set_card(&self, card: CardFields) {
        self.lock().fields.card = card;
    }

    pub fn hidden(&self, name: &str) -> Option<String> {
        self.lock()
            .hidden
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CheckoutForm for InMemoryForm {
    fn fields(&self) -> PaymentFormFields {
        self.lock().fields.clone()
    }

    fn attach_hidden(&self, name: &str, value: &str) {
        self.lock().hidden.push((name.to_string(), value.to_string()));
    }

    fn submit(&self) {
        self.submissions.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let api = ScriptedCouponApi::new();
        let reply = api
            .validate(CouponRequest {
                coupon_code: "nope".to_string(),
                csrf_token: "t".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply.status, 404);
        assert_eq!(api.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_codes_match_case_insensitively() {
        let api = ScriptedCouponApi::new();
        api.insert(
            "save20",
            ScriptedReply::new(CouponReply::new(200, "{}"), Duration::ZERO),
        )
        .await;

        let reply = api
            .validate(CouponRequest {
                coupon_code: "Save20".to_string(),
                csrf_token: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
    }

    #[tokio::test]
    async fn test_processor_counts_calls() {
        let processor = ScriptedProcessor::new(TokenReply::token("tok_1"), Duration::ZERO);
        let key = PublishableKey::parse(Some("pk")).unwrap();
        let reply = processor
            .create_token(&key, &CardFields::default())
            .await
            .unwrap();
        assert_eq!(reply, TokenReply::token("tok_1"));
        assert_eq!(processor.calls(), 1);
    }

    #[test]
    fn test_form_keeps_last_hidden_value() {
        let form = InMemoryForm::with_name("Ann");
        form.attach_hidden("stripe_token", "a");
        form.attach_hidden("stripe_token", "b");
        assert_eq!(form.hidden("stripe_token").as_deref(), Some("b"));
        assert_eq!(form.fields().name, "Ann");
    }
}
