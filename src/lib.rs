pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod platforms;
pub mod services;
pub mod sources;
pub mod storage;
