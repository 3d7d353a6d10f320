use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::io::Read;

/// Something the user (or the network) does to the page during a replay.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEvent {
    /// The coupon field now holds `value`.
    Type,
    /// The payer name field now holds `value`.
    Name,
    /// Card fields as `number cvc month year`.
    Card,
    /// The form's own submit event.
    Submit,
    /// A "pay" button outside the form.
    Intent,
    /// A JSON stream message arriving on the feed channel.
    Publish,
    /// The feed initializer runs again.
    Reinit,
    /// Let `value` milliseconds pass.
    Wait,
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct ScriptStep {
    pub event: ScriptEvent,
    pub value: Option<String>,
}

impl ScriptStep {
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    pub fn millis(&self) -> Result<u64> {
        self.text().parse().map_err(|_| {
            ClientError::ScriptError(format!("'{}' is not a number of milliseconds", self.text()))
        })
    }
}

/// Reads replay steps from a CSV source with an `event,value` header.
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    /// Creates a new reader over a headered CSV source.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes steps; a malformed row yields an error and reading continues.
    pub fn steps(self) -> impl Iterator<Item = Result<ScriptStep>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ClientError::from))
    }
}
