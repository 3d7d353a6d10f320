use crate::config::PageConfig;
use crate::domain::ports::{
    FeedViewRef, MessageHandler, StreamClient, StreamConnectorRef, Subscription,
};
use crate::domain::stream::{FeedState, StreamMessage};
use crate::error::{ClientError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub url: String,
    pub channel: String,
    pub template: String,
    pub feed_limit: usize,
}

impl StreamSettings {
    pub fn from_config(config: &PageConfig) -> Result<Self> {
        let url = config
            .stream_public_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::ConfigError("stream_public_url is not set".to_string()))?;

        Ok(Self {
            url,
            channel: config.channel.clone(),
            template: config.item_template.clone(),
            feed_limit: config.feed_limit,
        })
    }
}

/// Owns the page's streaming client and its single feed subscription.
///
/// The client is built on first use and then reused. Every call to
/// [`StreamSession::reinitialize`] drops the current subscription before
/// creating the next, so a channel never has two handlers from one session.
pub struct StreamSession {
    connector: StreamConnectorRef,
    view: FeedViewRef,
    settings: StreamSettings,
    template: Arc<str>,
    client: Option<Arc<dyn StreamClient>>,
    subscription: Option<Box<dyn Subscription>>,
    feed: Arc<Mutex<FeedState>>,
}

impl StreamSession {
    /// Creates an unconnected session; nothing is subscribed until [`StreamSession::reinitialize`].
    pub fn new(connector: StreamConnectorRef, view: FeedViewRef, settings: StreamSettings) -> Self {
        let feed = Arc::new(Mutex::new(FeedState::new(settings.feed_limit)));
        let template = Arc::from(settings.template.as_str());
        Self {
            connector,
            view,
            settings,
            template,
            client: None,
            subscription: None,
            feed,
        }
    }

    pub fn reinitialize(&mut self) -> Result<()> {
        let client = match &self.client {
            Some(client) => Arc::clone(client),
            None => {
                let client = self.connector.connect(&self.settings.url)?;
                info!(url = %self.settings.url, "stream client connected");
                self.client = Some(Arc::clone(&client));
                client
            }
        };

        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
            debug!(channel = %self.settings.channel, "previous feed subscription removed");
        }

        self.subscription = Some(client.subscribe(&self.settings.channel, self.handler()));
        info!(channel = %self.settings.channel, "subscribed to live feed");
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    pub fn feed(&self) -> FeedState {
        self.feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn handler(&self) -> MessageHandler {
        let feed = Arc::clone(&self.feed);
        let view = Arc::clone(&self.view);
        let template = Arc::clone(&self.template);

        Arc::new(move |message: StreamMessage| {
            let rendered = message.render(&template);
            let mut feed = feed.lock().unwrap_or_else(PoisonError::into_inner);

            if feed.placeholder_visible {
                view.hide_placeholder();
            }
            let evicted = feed.receive(rendered.clone());
            view.prepend(&rendered);
            for _ in evicted {
                view.remove_oldest();
            }
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
