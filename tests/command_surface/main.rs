//! End-to-end exercises of the tokenized command surface.

mod common;
mod durability;
mod models;
mod scripts;
mod stats;
mod tensors;
