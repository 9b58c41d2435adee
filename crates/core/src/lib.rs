//! Tabulon Core - shared data model for the Tabulon table store.
//!
//! This crate defines the building blocks every other Tabulon crate works
//! with:
//!
//! - `Value`: any value that can be stored in a cell
//! - `RowId`: a row address (integer or string)
//! - `Row`: one record, a field-to-value mapping
//! - `Table`: an id-to-row mapping
//! - `Error`: the crate-family error type

pub mod error;
pub mod row;
pub mod value;

pub use error::{Error, Result};
pub use row::{Row, RowId, Table};
pub use value::Value;
