use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_CHANNEL: &str = "/cats";
pub const DEFAULT_FEED_LIMIT: usize = 10;
pub const DEFAULT_ITEM_TEMPLATE: &str =
    "<div class=\"tweet\"><strong>{0}</strong> <em>{1}</em> {2}</div>";

/// An inbound live-update message.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct StreamMessage {
    pub user: String,
    pub r#type: String,
    pub tweet: String,
}

impl StreamMessage {
    pub fn render(&self, template: &str) -> String {
        render(template, &[&self.user, &self.r#type, &self.tweet])
    }
}

/// Substitutes `{N}` placeholders with `values[N]`.
///
/// Placeholders without a matching value, and braces that do not wrap a
/// plain index, are kept as written.
pub fn render(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let index = &after[..close];
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let value = index.parse::<usize>().ok().and_then(|i| values.get(i))?;
            Some((*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Rendered feed items, most recent first, never longer than `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBuffer {
    items: VecDeque<String>,
    limit: usize,
}

impl FeedBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Inserts at the head and returns whatever fell off the tail.
    pub fn push_front(&mut self, item: String) -> Vec<String> {
        self.items.push_front(item);
        let mut evicted = Vec::new();
        while self.items.len() > self.limit {
            if let Some(oldest) = self.items.pop_back() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl Default for FeedBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_LIMIT)
    }
}

/// What the live feed panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub placeholder_visible: bool,
    pub buffer: FeedBuffer,
}

impl FeedState {
    pub fn new(limit: usize) -> Self {
        Self {
            placeholder_visible: true,
            buffer: FeedBuffer::new(limit),
        }
    }

    pub fn receive(&mut self, rendered: String) -> Vec<String> {
        self.placeholder_visible = false;
        self.buffer.push_front(rendered)
    }
}
