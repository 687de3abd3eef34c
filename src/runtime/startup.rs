use std::path::Path;

use crate::config::LibrarySettings;
use crate::error::LibraryError;
use crate::library::{DirectoryLibrary, LibraryStore, ManifestLibrary};

/// Pick the store for `arg`: a `.toml` file is read as a manifest, anything
/// else is scanned as a music directory.
pub fn open_library(
    arg: &Path,
    settings: &LibrarySettings,
) -> Result<Box<dyn LibraryStore>, LibraryError> {
    let is_manifest = arg.is_file()
        && arg
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    if is_manifest {
        Ok(Box::new(ManifestLibrary::load(arg)?))
    } else {
        let lib = DirectoryLibrary::scan(arg, settings);
        tracing::debug!(
            root = %lib.root().display(),
            albums = lib.albums().len(),
            "library scanned"
        );
        Ok(Box::new(lib))
    }
}
