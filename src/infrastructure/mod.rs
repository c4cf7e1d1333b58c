//! Infrastructure layer - Store adapters and services

pub mod logging;
pub mod membership;
pub mod storage;
pub mod tag;
pub mod team;
