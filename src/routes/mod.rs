//! Router composition.

pub mod routes;
