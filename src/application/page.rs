use super::checkout::CheckoutController;
use super::coupon::CouponValidator;
use super::stream::{StreamSession, StreamSettings};
use crate::config::PageConfig;
use crate::domain::ports::{
    CheckoutFormRef, CheckoutViewRef, CouponApiRef, FeedViewRef, PaymentProcessorRef,
    StreamConnectorRef,
};
use crate::error::Result;
use std::sync::Arc;

/// Collaborators a page needs from its environment.
pub struct PageAdapters {
    pub coupon_api: CouponApiRef,
    pub processor: PaymentProcessorRef,
    pub form: CheckoutFormRef,
    pub view: CheckoutViewRef,
    pub feed_view: FeedViewRef,
    pub connector: StreamConnectorRef,
}

/// One page load: the checkout controller plus, when the page carries a
/// stream URL, the live feed session.
pub struct CheckoutPage {
    pub checkout: Arc<CheckoutController>,
    pub stream: Option<StreamSession>,
}

impl CheckoutPage {
    /// Wires every component from the page configuration and subscribes the feed.
    pub fn mount(config: &PageConfig, adapters: PageAdapters) -> Result<Self> {
        config.validate()?;

        let coupon = CouponValidator::new(
            adapters.coupon_api,
            Arc::clone(&adapters.view),
            config.csrf_token.clone(),
            config.debounce(),
        );
        let checkout = Arc::new(CheckoutController::new(
            coupon,
            adapters.processor,
            adapters.form,
            adapters.view,
            config.publishable_key(),
        ));

        let has_stream = config
            .stream_public_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());

        let stream = if has_stream {
            let settings = StreamSettings::from_config(config)?;
            let mut session = StreamSession::new(adapters.connector, adapters.feed_view, settings);
            session.reinitialize()?;
            Some(session)
        } else {
            None
        };

        Ok(Self { checkout, stream })
    }

    pub fn coupon(&self) -> &CouponValidator {
        self.checkout.coupon()
    }
}
