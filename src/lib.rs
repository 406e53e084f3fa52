pub mod collision;
pub mod config;
pub mod constants;
pub mod engine;
pub mod entity;
pub mod error;
pub mod movement;
pub mod protocol;
pub mod runtime;
pub mod scheduler;
pub mod types;
pub mod world;
