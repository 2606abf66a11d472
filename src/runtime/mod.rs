pub mod blueprint;
pub mod condition;
pub mod config;
pub mod context;
pub mod engine;
pub mod event;
pub mod node;
pub mod observer;
pub mod pacer;
pub mod storage;
pub mod syscall;
pub mod task;
