use crate::error::{ClientError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown when the server answers with something we cannot interpret.
pub const UNPROCESSABLE_MESSAGE: &str = "Discount code cannot be processed.";

/// Where the advisory coupon check currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouponQueryState {
    #[default]
    Idle,
    Checking,
    Valid,
    InvalidWarn,
    InvalidError,
}

impl CouponQueryState {
    /// The status panel is shown for every state except `Idle`.
    pub fn is_visible(self) -> bool {
        self != CouponQueryState::Idle
    }

    pub fn is_settled(self) -> bool {
        matches!(
            self,
            CouponQueryState::Valid | CouponQueryState::InvalidWarn | CouponQueryState::InvalidError
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

impl Severity {
    /// 404 means the code simply does not exist; anything else is a hard failure.
    pub fn from_status(status: u16) -> Self {
        if status == 404 {
            Severity::Warn
        } else {
            Severity::Error
        }
    }
}

impl From<Severity> for CouponQueryState {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warn => CouponQueryState::InvalidWarn,
            Severity::Error => CouponQueryState::InvalidError,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warn => f.write_str("warn"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A non-negative amount of money in currency units.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn new(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value.round_dp(2)))
        } else {
            Err(ClientError::ValidationError(
                "Money amount must not be negative".to_string(),
            ))
        }
    }

    pub fn from_cents(cents: i64) -> Result<Self> {
        Self::new(Decimal::new(cents, 2))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Discount {
    Percent(Decimal),
    Amount(Money),
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discount::Percent(value) => write!(f, "{}% off", value.normalize()),
            Discount::Amount(money) => write!(f, "{money} off"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponDuration {
    Forever,
    Once,
    Months(u32),
}

impl fmt::Display for CouponDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponDuration::Forever => f.write_str("forever"),
            CouponDuration::Once => f.write_str("on your first payment"),
            CouponDuration::Months(1) => f.write_str("for 1 month"),
            CouponDuration::Months(count) => write!(f, "for {count} months"),
        }
    }
}

/// The server's verdict for a valid coupon.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponResult {
    pub discount: Discount,
    pub duration: CouponDuration,
}

impl CouponResult {
    /// Human-readable summary, e.g. `20% off for 3 months`.
    pub fn summary(&self) -> String {
        format!("{} {}", self.discount, self.duration)
    }
}

#[derive(Debug, Deserialize)]
struct CouponPayload {
    percent_off: Option<Decimal>,
    amount_off: Option<Decimal>,
    duration: String,
    duration_in_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuccessBody {
    Wrapped { data: CouponPayload },
    Bare(CouponPayload),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl TryFrom<CouponPayload> for CouponResult {
    type Error = ClientError;

    fn try_from(payload: CouponPayload) -> Result<Self> {
        let discount = match (payload.percent_off, payload.amount_off) {
            (Some(percent), _) if percent > Decimal::ZERO => Discount::Percent(percent),
            (_, Some(amount)) if amount > Decimal::ZERO => Discount::Amount(Money::new(amount)?),
            _ => {
                return Err(ClientError::ValidationError(
                    "Coupon carries no discount".to_string(),
                ));
            }
        };

        let duration = match payload.duration.as_str() {
            "forever" => CouponDuration::Forever,
            "once" => CouponDuration::Once,
            other => match payload.duration_in_months {
                Some(months) if months > 0 => CouponDuration::Months(months),
                _ => {
                    return Err(ClientError::ValidationError(format!(
                        "Duration '{other}' requires a month count"
                    )));
                }
            },
        };

        Ok(Self { discount, duration })
    }
}

/// Raw answer from the coupon validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponVerdict {
    Valid(CouponResult),
    Invalid { message: String, severity: Severity },
}

impl CouponReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Interprets the reply. Never fails: anything unreadable becomes a hard error.
    pub fn verdict(&self) -> CouponVerdict {
        if self.is_success() {
            let parsed = serde_json::from_str::<SuccessBody>(&self.body)
                .map_err(ClientError::from)
                .and_then(|body| match body {
                    SuccessBody::Wrapped { data } => CouponResult::try_from(data),
                    SuccessBody::Bare(payload) => CouponResult::try_from(payload),
                });

            return match parsed {
                Ok(result) => CouponVerdict::Valid(result),
                Err(_) => CouponVerdict::Invalid {
                    message: UNPROCESSABLE_MESSAGE.to_string(),
                    severity: Severity::Error,
                },
            };
        }

        let message = serde_json::from_str::<ErrorBody>(&self.body)
            .map(|body| body.error)
            .unwrap_or_else(|_| UNPROCESSABLE_MESSAGE.to_string());

        CouponVerdict::Invalid {
            message,
            severity: Severity::from_status(self.status),
        }
    }
}
