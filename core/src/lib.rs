//! Core of the sunshine weather cache: day normalisation, the SQLite
//! forecast store, payload parsing, sync orchestration and scheduling.

pub mod changes;
pub mod dates;
pub mod db;
pub mod error;
pub mod models;
pub mod openweather;
pub mod prefs;
pub mod scheduler;
pub mod sync;
pub mod weather;
