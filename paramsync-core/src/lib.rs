//! Core types for paramsync: parameter naming, tags, and `.env` parsing.
//!
//! Nothing in this crate touches the network or the console; the
//! `paramsync` binary crate wires these types to the AWS CLI and the operator.

pub mod env_file;
pub mod models;
