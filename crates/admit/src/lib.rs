//! Admit - run transaction workloads through the admission scheduler
//!
//! Wires configuration, logging and the Lock/Execution Service clients from
//! `admit-core` into a command-line tool.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
