//! In-memory adapters for every port: scripted endpoints, a recording
//! view-model and a local publish/subscribe broker.

pub mod broker;
pub mod in_memory;
pub mod view;
