pub mod app;
pub mod config;
pub mod engine;
pub mod llm;
pub mod memory;
pub mod shared;
pub mod tools;
