//! Application service layer - use cases, config, scanning, batch runs, export

pub mod app;
pub mod batch;
pub mod calibration;
pub mod config;
pub mod export;
pub mod repository;
pub mod scanner;
