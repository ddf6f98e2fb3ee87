// src/lib.rs

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod present;
pub mod query;
pub mod table;
