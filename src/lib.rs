pub mod cli;
pub mod config;
pub mod connector;
pub mod logging;
