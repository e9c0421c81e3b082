//! Core library for the StayCheck inspection service.
//!
//! Records properties, rooms, checklist items, and check-in/check-out events,
//! accepts uploaded room photos, delegates photo understanding to an external
//! vision backend, and derives damage/cost reports by pairing check-in and
//! check-out photos per room.

pub mod config;
pub mod domain;
pub mod error;
pub mod inspection;
pub mod store;
pub mod telemetry;
pub mod vision;
