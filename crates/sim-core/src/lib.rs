//! Deterministic tick-driven economy simulation: station production and
//! consumption state machines, resource and capital ledger, time-bounded
//! goals, pluggable ownership policy, score routing, and time-scoped
//! global modifiers.
//!
//! The composition root is [`world::SimWorld`]; it owns one instance of each
//! subsystem and ticks them in a fixed documented order per step.

pub mod events;
pub mod goals;
pub mod ledger;
pub mod loot;
pub mod policy;
pub mod sample;
pub mod score;
pub mod station;
pub mod world;
