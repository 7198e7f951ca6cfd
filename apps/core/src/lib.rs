pub mod action_executor;
pub mod config;
pub mod contract;
pub mod logging;
pub mod model;
pub mod node_cache;
pub mod query_service;
pub mod runtime;
pub mod search;
pub mod status;
pub mod transport;
