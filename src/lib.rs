//! Staplay — session persistence and `.staplay` backups for a Star Trek
//! Adventures play companion.

pub mod backup;
pub mod config;
pub mod error;
pub mod model;
pub mod paths;
pub mod storage;
pub mod store;
