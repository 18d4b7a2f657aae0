//! Subcommand modules for the `ibdnet` binary.

pub mod call;
pub mod toy;
