//! Library records and the stores that produce them.
//!
//! Albums and songs come either from scanning a directory tree or from a
//! TOML manifest; the player consumes them as `Track` values built through
//! `Album::track`.

mod display;
mod manifest;
mod model;
mod scan;
mod store;

pub use display::display_from_fields;
pub use manifest::ManifestLibrary;
pub use model::*;
pub use store::{DirectoryLibrary, LibraryStore};
