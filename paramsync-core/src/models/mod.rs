//! Domain models for paramsync.
//!
//! # Core Concepts
//!
//! - [`ParameterPath`]: The hierarchical name `/{project}/{environment}/{key}` of a
//!   parameter. Uniquely determined by its three components.
//! - [`Tag`] / [`TagSet`]: Key/value metadata re-applied to a parameter after every write.
//! - [`PutParameter`]: Everything needed for a single create or overwrite call.
//!
//! Projects and environments themselves are plain folders on disk and have no
//! model of their own; see `paramsync::scaffold`.

mod parameter;
mod tag;

pub use parameter::*;
pub use tag::*;
