use super::coupon::{CouponReply, Severity};
use super::payment::{CardFields, PaymentFormFields, PublishableKey, TokenReply};
use super::stream::StreamMessage;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Body of a coupon validation request. The anti-forgery token travels as a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponRequest {
    pub coupon_code: String,
    #[serde(skip)]
    pub csrf_token: String,
}

/// The server endpoint that checks coupon codes.
#[async_trait]
pub trait CouponApi: Send + Sync {
    async fn validate(&self, request: CouponRequest) -> Result<CouponReply>;
}

/// The external card processor that exchanges card fields for a one-time token.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_token(&self, key: &PublishableKey, card: &CardFields) -> Result<TokenReply>;
}

/// Checkout widgets the coupon validator and the submission gate drive.
pub trait CheckoutView: Send + Sync {
    fn show_checking(&self);
    fn show_valid(&self, text: &str);
    fn show_invalid(&self, text: &str, severity: Severity);
    fn hide_status(&self);
    fn focus_coupon(&self);
    fn set_busy(&self, busy: bool);
    fn set_submit_enabled(&self, enabled: bool);
    fn show_payment_error(&self, message: &str);
    fn hide_payment_error(&self);
}

/// The payment form itself.
pub trait CheckoutForm: Send + Sync {
    fn fields(&self) -> PaymentFormFields;
    fn attach_hidden(&self, name: &str, value: &str);
    /// Real submission, bypassing the gate. The page navigates away afterwards.
    fn submit(&self);
}

/// Live feed panel.
pub trait FeedView: Send + Sync {
    fn hide_placeholder(&self);
    fn prepend(&self, html: &str);
    fn remove_oldest(&self);
}

pub type MessageHandler = Arc<dyn Fn(StreamMessage) + Send + Sync>;

pub trait Subscription: Send + Sync {
    fn unsubscribe(&self);
}

pub trait StreamClient: Send + Sync {
    fn subscribe(&self, channel: &str, handler: MessageHandler) -> Box<dyn Subscription>;
}

/// Builds streaming clients. Called at most once per session.
pub trait StreamConnector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Arc<dyn StreamClient>>;
}

pub type CouponApiRef = Arc<dyn CouponApi>;
pub type PaymentProcessorRef = Arc<dyn PaymentProcessor>;
pub type CheckoutViewRef = Arc<dyn CheckoutView>;
pub type CheckoutFormRef = Arc<dyn CheckoutForm>;
pub type FeedViewRef = Arc<dyn FeedView>;
pub type StreamConnectorRef = Arc<dyn StreamConnector>;
