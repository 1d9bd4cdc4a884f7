mod arena;
pub mod builder;
mod children;
pub mod engine;
pub mod error;
pub mod games;
pub mod ids;
pub mod merge;
pub mod node;
mod prune;
pub mod snapshot;
pub mod variation_tree;

#[cfg(test)]
mod tests;
