//! Application layer: the asynchronous coordination behind the checkout page.
//!
//! Everything here talks to the outside world through the ports in
//! [`crate::domain::ports`], so it runs the same against a browser bridge or
//! the in-memory adapters used by the tests and the replay CLI.

pub mod checkout;
pub mod coupon;
pub mod debounce;
pub mod page;
pub mod stream;
