//! Academia Backend Library
//!
//! Student management over HTTP: enrollment, payment tracking, delinquency
//! queries, all behind bearer-token authentication. Exposed as a library so
//! integration tests can drive the assembled router in-process.

pub mod app;
pub mod auth;
pub mod db;
pub mod students;
