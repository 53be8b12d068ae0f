//! Ordered collection of coupled cars and the per-tick drive of their models.

mod train_model;

pub use train_model::*;

#[cfg(test)]
mod tests;
