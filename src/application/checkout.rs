use super::coupon::CouponValidator;
use crate::domain::payment::{
    MISSING_NAME_MESSAGE, PaymentFormFields, PublishableKey, TOKEN_FIELD, TokenReply,
};
use crate::domain::ports::{CheckoutFormRef, CheckoutViewRef, PaymentProcessorRef};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// What asked for the submission: a "pay" button outside the form, or the form itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Intent,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The coupon status is showing something other than a confirmed discount.
    CouponUnconfirmed,
    MissingName,
    /// A token request for this form is still outstanding.
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    /// The form went out. `token` is `None` when payment collection is disabled.
    Submitted { token: Option<String> },
    TokenizationFailed { message: String },
}

/// Submission gate and card tokenizer for the payment form.
///
/// At most one token request is outstanding per form: the lock is taken when
/// the gate admits a submission and only released by a failed tokenization.
/// A successful one submits the form and keeps the lock, since the page is
/// navigating away.
pub struct CheckoutController {
    coupon: CouponValidator,
    processor: PaymentProcessorRef,
    form: CheckoutFormRef,
    view: CheckoutViewRef,
    key: Option<PublishableKey>,
    submitting: AtomicBool,
}

impl CheckoutController {
    /// Creates an unlocked controller. `key` is `None` when payment collection is disabled.
    pub fn new(
        coupon: CouponValidator,
        processor: PaymentProcessorRef,
        form: CheckoutFormRef,
        view: CheckoutViewRef,
        key: Option<PublishableKey>,
    ) -> Self {
        Self {
            coupon,
            processor,
            form,
            view,
            key,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn coupon(&self) -> &CouponValidator {
        &self.coupon
    }

    /// Decides synchronously whether a submission may go to tokenization.
    ///
    /// On success the lock is held, the busy indicator is on and the submit
    /// control is disabled.
    pub fn admit(&self, trigger: SubmitTrigger) -> Result<PaymentFormFields, Rejection> {
        if self.is_submitting() {
            info!(?trigger, "submission ignored, tokenization in flight");
            return Err(Rejection::AlreadySubmitting);
        }

        if self.coupon.blocks_submission() {
            info!(?trigger, state = ?self.coupon.state(), "submission blocked by coupon status");
            self.view.focus_coupon();
            return Err(Rejection::CouponUnconfirmed);
        }

        let fields = self.form.fields();
        if !fields.has_name() {
            self.view.set_busy(false);
            self.view.show_payment_error(MISSING_NAME_MESSAGE);
            return Err(Rejection::MissingName);
        }

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Rejection::AlreadySubmitting);
        }

        self.view.hide_payment_error();
        self.view.set_busy(true);
        self.view.set_submit_enabled(false);
        Ok(fields)
    }

    /// Runs the gate and, if admitted, the token round trip.
    pub async fn submit(&self, trigger: SubmitTrigger) -> SubmitOutcome {
        match self.admit(trigger) {
            Ok(fields) => self.tokenize(fields).await,
            Err(rejection) => SubmitOutcome::Rejected(rejection),
        }
    }

    async fn tokenize(&self, fields: PaymentFormFields) -> SubmitOutcome {
        let Some(key) = &self.key else {
            info!("no publishable key configured, submitting without a token");
            self.form.submit();
            return SubmitOutcome::Submitted { token: None };
        };

        match self.processor.create_token(key, &fields.card).await {
            Ok(TokenReply::Token { id }) => {
                info!("card tokenized, submitting payment form");
                self.form.attach_hidden(TOKEN_FIELD, &id);
                self.view.set_busy(true);
                self.form.submit();
                SubmitOutcome::Submitted { token: Some(id) }
            }
            Ok(TokenReply::Failure { error }) => self.release(error.message),
            Err(e) => self.release(e.to_string()),
        }
    }

    fn release(&self, message: String) -> SubmitOutcome {
        warn!(%message, "tokenization failed");
        self.view.set_busy(false);
        self.view.set_submit_enabled(true);
        self.view.show_payment_error(&message);
        self.submitting.store(false, Ordering::Release);
        SubmitOutcome::TokenizationFailed { message }
    }
}
