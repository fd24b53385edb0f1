// src/lib.rs

pub mod error;
pub mod model;
pub mod storage;
pub mod records;
pub mod service;
pub mod app_state;
pub mod config;
