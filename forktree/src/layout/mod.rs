//! Tree layout
//!
//! Pure read-only consumers of a fully ingested task model.

pub mod text;

pub use text::{TextLayouter, TreeLines};
