pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod fs_util;
pub mod loader;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod store;
pub mod validate;
