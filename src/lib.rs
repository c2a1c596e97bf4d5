pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod marker;
pub mod normalize;
pub mod output;
pub mod phylopic;
pub mod store;
