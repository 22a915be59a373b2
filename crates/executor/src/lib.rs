//! Command surface for TensorDB.
//!
//! Tokenized argument vectors from the host protocol layer parse into
//! [`Command`] values and execute against a [`tensordb_engine::Database`]
//! through [`Executor`], producing [`Reply`] values for the host to render.

pub mod executor;
pub mod parse;
pub mod reply;

pub use executor::Executor;
pub use parse::{parse, Command, TensorFormat};
pub use reply::Reply;
