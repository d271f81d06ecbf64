pub mod app;
pub mod cli;
mod commands;
pub mod context;
pub mod export;
pub mod repository;
pub mod rest;
pub mod storage;
pub mod tracing;
pub mod types;
