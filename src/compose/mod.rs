//! Documents made of more than one grammar.
//!
//! A [`Composer`] parses a document with a primary grammar, selects
//! regions with an anchor query and parses each region's own text with a
//! secondary grammar. The resulting [`CompositeTree`] keeps every tree in
//! one coordinate space, so a single [`TextEdit`](crate::ts::TextEdit)
//! updates all of them before the next incremental rebuild.

pub mod composite;
pub mod ranges;
pub mod walk;

pub use composite::{ComposeError, Composer, CompositeTree, SecondaryTree};
pub use ranges::{covering_ranges, node_covering_ranges};
pub use walk::{CompositeNode, Walk};
