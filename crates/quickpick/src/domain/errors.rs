//! Domain-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickOpenError {
    #[error("bookmark target {} is not accessible", path.display())]
    BookmarkUnreachable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn listing command `{program}`")]
    FinderSpawn {
        program: String,
        #[source]
        source: io::Error,
    },
}
