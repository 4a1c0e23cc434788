pub mod app;
pub mod config;
pub mod pipeline;
pub mod predict;
pub mod session;
pub mod store;
