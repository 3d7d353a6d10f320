//! Domain types and the ports the checkout page talks through.

pub mod coupon;
pub mod payment;
pub mod ports;
pub mod selection;
pub mod stream;
