use super::csv::script_reader::{ScriptEvent, ScriptStep};
use super::fixtures::Fixtures;
use crate::application::checkout::{SubmitOutcome, SubmitTrigger};
use crate::application::page::{CheckoutPage, PageAdapters};
use crate::config::PageConfig;
use crate::domain::payment::CardFields;
use crate::domain::stream::StreamMessage;
use crate::error::{ClientError, Result};
use crate::infrastructure::broker::LocalBroker;
use crate::infrastructure::in_memory::InMemoryForm;
use crate::infrastructure::view::{RecordingView, ViewEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const SETTLE_POLL: Duration = Duration::from_millis(10);

/// Drives a mounted checkout page with scripted user and network events.
pub struct Replay {
    page: CheckoutPage,
    form: InMemoryForm,
    view: RecordingView,
    broker: LocalBroker,
    channel: String,
    submissions: Vec<JoinHandle<SubmitOutcome>>,
}

impl Replay {
    pub async fn mount(config: &PageConfig, fixtures: &Fixtures) -> Result<Self> {
        let form = InMemoryForm::new();
        let view = RecordingView::new();
        let broker = LocalBroker::new();

        let adapters = PageAdapters {
            coupon_api: Arc::new(fixtures.coupon_api().await),
            processor: Arc::new(fixtures.processor()),
            form: Arc::new(form.clone()),
            view: Arc::new(view.clone()),
            feed_view: Arc::new(view.clone()),
            connector: Arc::new(broker.clone()),
        };
        let page = CheckoutPage::mount(config, adapters)?;

        Ok(Self {
            page,
            form,
            view,
            broker,
            channel: config.channel.clone(),
            submissions: Vec::new(),
        })
    }

    pub async fn apply(&mut self, step: ScriptStep) -> Result<()> {
        debug!(?step, "replaying step");
        match step.event {
            ScriptEvent::Type => self.page.coupon().on_input(step.text()),
            ScriptEvent::Name => self.form.set_name(step.text()),
            ScriptEvent::Card => self.form.set_card(parse_card(step.text())?),
            ScriptEvent::Submit => self.spawn_submit(SubmitTrigger::Form),
            ScriptEvent::Intent => self.spawn_submit(SubmitTrigger::Intent),
            ScriptEvent::Publish => {
                let message: StreamMessage = serde_json::from_str(step.text())?;
                let delivered = self.broker.publish(&self.channel, &message);
                debug!(delivered, "stream message published");
            }
            ScriptEvent::Reinit => {
                let stream = self.page.stream.as_mut().ok_or_else(|| {
                    ClientError::ScriptError("page has no live feed".to_string())
                })?;
                stream.reinitialize()?;
            }
            ScriptEvent::Wait => tokio::time::sleep(Duration::from_millis(step.millis()?)).await,
        }
        // Let tasks woken by this step run before the next one.
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Waits for the coupon check and outstanding submissions, then returns
    /// the full view log.
    pub async fn finish(self) -> Result<Vec<ViewEvent>> {
        while self.page.coupon().is_settling() {
            tokio::time::sleep(SETTLE_POLL).await;
        }
        for handle in self.submissions {
            let outcome = handle
                .await
                .map_err(|e| ClientError::ScriptError(format!("submission task failed: {e}")))?;
            info!(?outcome, "submission settled");
        }
        Ok(self.view.events())
    }

    pub fn view(&self) -> &RecordingView {
        &self.view
    }

    pub fn form(&self) -> &InMemoryForm {
        &self.form
    }

    fn spawn_submit(&mut self, trigger: SubmitTrigger) {
        let checkout = Arc::clone(&self.page.checkout);
        self.submissions
            .push(tokio::spawn(async move { checkout.submit(trigger).await }));
    }
}

fn parse_card(value: &str) -> Result<CardFields> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [number, cvc, exp_month, exp_year] = parts.as_slice() else {
        return Err(ClientError::ScriptError(format!(
            "card expects 'number cvc month year', got '{value}'"
        )));
    };
    Ok(CardFields {
        number: number.to_string(),
        cvc: cvc.to_string(),
        exp_month: exp_month.to_string(),
        exp_year: exp_year.to_string(),
    })
}
