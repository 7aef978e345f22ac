//! Text formats: a Newick lexer and processor, a phyloxml writer, and
//! gz-aware file helpers.

pub mod file;
pub mod lexer;
pub mod newick;
pub mod phyloxml;

pub use newick::{NewickBehavior, NewickProcessor};
pub use phyloxml::PhyloxmlWriter;
