//service/mod.rs
pub mod lifecycle;
pub mod notifier;
pub mod purge;
pub mod quote_service;
pub mod scheduler;
