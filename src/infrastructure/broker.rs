use crate::domain::ports::{
    MessageHandler, StreamClient, StreamConnector, Subscription,
};
use crate::domain::stream::StreamMessage;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Default)]
struct BrokerInner {
    channels: Mutex<HashMap<String, Vec<(u64, MessageHandler)>>>,
    next_id: AtomicU64,
    connects: AtomicUsize,
}

impl BrokerInner {
    fn channels(&self) -> MutexGuard<'_, HashMap<String, Vec<(u64, MessageHandler)>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process publish/subscribe hub standing in for the streaming server.
#[derive(Default, Clone)]
pub struct LocalBroker {
    inner: Arc<BrokerInner>,
}

impl LocalBroker {
    /// Creates a broker with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `message` to every handler on `channel`; returns how many ran.
    pub fn publish(&self, channel: &str, message: &StreamMessage) -> usize {
        let handlers: Vec<MessageHandler> = self
            .inner
            .channels()
            .get(channel)
            .map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(message.clone());
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner.channels().get(channel).map_or(0, Vec::len)
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }
}

impl StreamConnector for LocalBroker {
    fn connect(&self, _url: &str) -> Result<Arc<dyn StreamClient>> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(LocalClient {
            broker: Arc::downgrade(&self.inner),
        }))
    }
}

struct LocalClient {
    broker: Weak<BrokerInner>,
}

impl StreamClient for LocalClient {
    fn subscribe(&self, channel: &str, handler: MessageHandler) -> Box<dyn Subscription> {
        let mut id = 0;
        if let Some(broker) = self.broker.upgrade() {
            id = broker.next_id.fetch_add(1, Ordering::SeqCst);
            broker
                .channels()
                .entry(channel.to_string())
                .or_default()
                .push((id, handler));
        }
        Box::new(LocalSubscription {
            broker: self.broker.clone(),
            channel: channel.to_string(),
            id,
        })
    }
}

struct LocalSubscription {
    broker: Weak<BrokerInner>,
    channel: String,
    id: u64,
}

impl Subscription for LocalSubscription {
    fn unsubscribe(&self) {
        if let Some(broker) = self.broker.upgrade()
            && let Some(subs) = broker.channels().get_mut(&self.channel)
        {
            subs.retain(|(id, _)| *id != self.id);
        }
    }
}
