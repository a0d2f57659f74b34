//! Data fusion.
//!
//! Builds the master dataset from model elements, external sources and
//! calculated columns:
//!
//! ```text
//! leaf ids ──► bulk properties ──► join source 1 ──► … ──► join source n
//!                                                              │
//!                          schema projection ◄── calculations ◄┘
//! ```

mod builder;
pub mod error;
pub mod formula;
mod join;

pub use builder::{BuildOutcome, MasterDataBuilder};
pub use error::{BuildError, FormulaError, FormulaResult};
pub use join::{join_key, JoinIndex};
