//! Bus station finder service.
//!
//! Answers: "which bus stations are closest to me, and how far away are
//! they?" Rankings are computed locally by great-circle distance or
//! delegated to an upstream service, and cached per neighborhood.

pub mod cache;
pub mod config;
pub mod domain;
pub mod geo;
pub mod lookup;
pub mod stations;
pub mod web;
