//! Per-entity database repositories

pub mod goals;
pub mod leads;
pub mod logs;
pub mod members;
pub mod runs;
pub mod users;
