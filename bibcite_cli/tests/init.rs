use bibcite_core::AnyEmptyResult;
use bibcite_core::CiteConfig;
use predicates::prelude::*;

mod common;

use common::bibcite_cmd;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	bibcite_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Created bibcite.toml"));

	let config_path = tmp.path().join("bibcite.toml");
	let content = std::fs::read_to_string(&config_path)?;
	assert!(content.contains("bib_file = \"bib/references.bib\""));
	assert!(content.contains("# [markers]"));

	let config = CiteConfig::load(tmp.path())?;
	assert_eq!(config, Some(CiteConfig::default()));

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	let config_path = tmp.path().join(".config/bibcite.toml");
	std::fs::write(&config_path, "existing config")?;

	bibcite_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("already exists"));

	assert_eq!(std::fs::read_to_string(&config_path)?, "existing config");
	assert!(!tmp.path().join("bibcite.toml").exists());

	Ok(())
}
