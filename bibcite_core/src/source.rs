use std::path::Path;
use std::path::PathBuf;

use crate::CiteError;
use crate::CiteResult;

/// Supplies the raw text of a bibliography file.
pub trait BibSource {
	/// Return the text at `location`. Failing here aborts the whole run.
	fn fetch(&self, location: &Path) -> CiteResult<String>;
}

/// Reads bibliography files from disk, relative to a project root.
#[derive(Debug, Clone)]
pub struct FileSource {
	root: PathBuf,
}

impl FileSource {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

impl BibSource for FileSource {
	fn fetch(&self, location: &Path) -> CiteResult<String> {
		let path = self.root.join(location);
		std::fs::read_to_string(&path).map_err(|e| {
			CiteError::Fetch {
				path: location.display().to_string(),
				reason: e.to_string(),
			}
		})
	}
}

impl<F> BibSource for F
where
	F: Fn(&Path) -> CiteResult<String>,
{
	fn fetch(&self, location: &Path) -> CiteResult<String> {
		self(location)
	}
}
