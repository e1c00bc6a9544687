//! Butler Library
//!
//! Resolves a natural-language device command to a catalog device, checks
//! that every device it depends on is online and recently reported, and
//! only then issues the activation command.

pub mod backend;
pub mod catalog;
pub mod engine;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod report;
pub mod storage;
pub mod utils;
