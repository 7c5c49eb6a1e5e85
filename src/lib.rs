pub mod app;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod consumer;
pub mod input;
pub mod interruptor;
pub mod latch;
pub mod producer;
pub mod slot;
pub mod worker_id;
