//! Player controller crate: the state machine, command surface, and
//! observable streams that sit on top of a pipeline and its two loops.
//!
//! A [`PlayerController`] owns at most one [`mediacore_types::Media`] at a
//! time, driving it through `Empty` → `Preparing` → `Ready` and the
//! `Ready` substatuses via [`Command`]s serialized behind a single
//! command mutex.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod command;
mod config;
mod controller;

#[cfg(test)]
mod test_support;

pub use command::Command;
pub use config::ControllerConfig;
pub use controller::PlayerController;
