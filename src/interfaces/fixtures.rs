use crate::domain::coupon::CouponReply;
use crate::domain::payment::TokenReply;
use crate::error::Result;
use crate::infrastructure::in_memory::{ScriptedCouponApi, ScriptedProcessor, ScriptedReply};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CouponFixture {
    pub status: u16,
    pub body: serde_json::Value,
    #[serde(default)]
    pub delay_ms: u64,
}

/// Canned answers for the coupon endpoint and the card processor.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub coupons: HashMap<String, CouponFixture>,
    pub token: Option<TokenReply>,
    pub token_delay_ms: u64,
}

impl Fixtures {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub async fn coupon_api(&self) -> ScriptedCouponApi {
        let api = ScriptedCouponApi::new();
        for (code, fixture) in &self.coupons {
            let reply = CouponReply::new(fixture.status, fixture.body.to_string());
            api.insert(code, ScriptedReply::new(reply, Duration::from_millis(fixture.delay_ms)))
                .await;
        }
        api
    }

    pub fn processor(&self) -> ScriptedProcessor {
        let reply = self
            .token
            .clone()
            .unwrap_or_else(|| TokenReply::token("tok_replay"));
        ScriptedProcessor::new(reply, Duration::from_millis(self.token_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_parsing() {
        let json = r#"{
            "coupons": {
                "SAVE20": {"status": 200, "body": {"percent_off": 20, "duration": "forever"}}
            },
            "token": {"error": {"message": "Your card was declined."}},
            "token_delay_ms": 50
        }"#;
        let fixtures = Fixtures::from_json(json).unwrap();
        assert_eq!(fixtures.coupons["SAVE20"].status, 200);
        assert_eq!(fixtures.coupons["SAVE20"].delay_ms, 0);
        assert_eq!(
            fixtures.token,
            Some(TokenReply::failure("Your card was declined."))
        );
    }

    #[test]
    fn test_empty_fixtures() {
        let fixtures = Fixtures::from_json("{}").unwrap();
        assert!(fixtures.coupons.is_empty());
        assert_eq!(fixtures.token, None);
    }
}
