use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const REFERENCES: &str = "@article{ada,
  author = {Ada LastAda},
  title = {On Engines},
  journal = {Notes},
  year = 2020,
  doi = {10.1000/xyz}
}

@misc{bob,
  author = {Bob LastBob1 and Carol LastBob2},
  title = {Web Thing},
  url = {https://example.org/thing},
  urldate = {2024-01-31}
}
";

pub const DECK: &str = r#"<html lang="en"><body><div class="slides"><section><p>A <span data-cite="ada"></span> and <span data-cite="bob"></span></p><div class="citation-bar"></div></section></div></body></html>"#;

pub fn bibcite_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("bibcite"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// A project with the default bibliography location and a deck.
pub fn write_project(root: &Path, deck: &str) -> std::io::Result<()> {
	std::fs::create_dir_all(root.join("bib"))?;
	std::fs::write(root.join("bib/references.bib"), REFERENCES)?;
	std::fs::write(root.join("deck.html"), deck)
}
