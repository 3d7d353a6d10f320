use serde::{Deserialize, Serialize};

/// Name of the hidden form field that carries the processor token.
pub const TOKEN_FIELD: &str = "stripe_token";

pub const MISSING_NAME_MESSAGE: &str = "You must enter your name.";

/// The payment processor's publishable key, as embedded in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishableKey(String);

impl PublishableKey {
    /// Returns `None` for a blank key: the page runs without payment collection.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw card entry fields. These go to the processor only, never to the origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub number: String,
    pub cvc: String,
    pub exp_month: String,
    pub exp_year: String,
}

/// Everything the gate reads from the payment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFormFields {
    pub name: String,
    pub card: CardFields,
}

impl PaymentFormFields {
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorError {
    pub message: String,
}

/// Reply from the processor's token call: `{id}` or `{error: {message}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenReply {
    Failure { error: ProcessorError },
    Token { id: String },
}

impl TokenReply {
    pub fn token(id: impl Into<String>) -> Self {
        TokenReply::Token { id: id.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        TokenReply::Failure {
            error: ProcessorError {
                message: message.into(),
            },
        }
    }
}
