//! Multi-party approval workflow for university internship placements.
//!
//! Students submit an application once their profile passes the eligibility gate; staff,
//! the course instructor, the assigned supervisor, and the committee then take custody and
//! rule in a fixed order. See [`workflows::placement`] for the engine and its ports.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
