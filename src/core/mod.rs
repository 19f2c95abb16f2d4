//! Core types, errors and tuning configuration

pub mod config;
pub mod error;
pub mod types;
