use std::path::Path;
use std::path::PathBuf;
use std::process;

use bibcite_core::AnyResult;
use bibcite_core::BibSource;
use bibcite_core::CiteConfig;
use bibcite_core::CiteError;
use bibcite_core::Document;
use bibcite_core::FileSource;
use bibcite_core::Locale;
use bibcite_core::Resolution;
use bibcite_core::long_citation;
use bibcite_core::parse_bibliography;
use bibcite_core::parse_html;
use bibcite_core::run_citations;
use bibcite_cli::BibciteCli;
use bibcite_cli::Commands;
use bibcite_cli::OutputFormat;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = "# bibcite configuration\n\n# Bibliography file, relative to the \
                             project root.\nbib_file = \"bib/references.bib\"\n\n# Inline \
                             citation markers, e.g. <span data-cite=\"knuth84\"></span>.\n# \
                             [markers]\n# selector = \"[data-cite]\"\n# attribute = \
                             \"data-cite\"\n# class = \"cite-sup\"\n# brackets = false\n# tooltip \
                             = true\n# replace = true\n\n# Per-slide short citations.\n# \
                             [summary]\n# selector = \".citation-bar\"\n\n# The numbered \
                             bibliography.\n# [sources]\n# selector = \".sources\"\n# title = \
                             \"Sources\"\n# create = true\n# id_prefix = \"src-\"\n";

fn main() {
	let args = BibciteCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	let default_filter = if args.verbose {
		"bibcite=debug"
	} else {
		"bibcite=warn"
	};
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.without_time(),
		)
		.init();

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Render { deck, bib, output }) => {
			run_render(&args, deck, bib.as_deref(), output.as_deref())
		}
		Some(Commands::Check { deck, bib, format }) => {
			match run_check(&args, deck, bib.as_deref(), *format) {
				Ok(true) => Ok(()),
				Ok(false) => process::exit(1),
				Err(e) => Err(e),
			}
		}
		Some(Commands::List { bib, format }) => run_list(&args, bib.as_deref(), *format),
		None => {
			eprintln!("No subcommand specified. Run `bibcite --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<CiteError>() {
			Ok(cite_err) => {
				let report: miette::Report = (*cite_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn resolve_root(args: &BibciteCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The discovered config with `--bib` applied.
fn load_config(root: &Path, bib: Option<&Path>) -> AnyResult<CiteConfig> {
	let mut config = CiteConfig::load_or_default(root)?;
	if let Some(bib) = bib {
		config.bib_file = bib.to_path_buf();
	}
	Ok(config)
}

fn read_deck(root: &Path, deck: &Path) -> AnyResult<Document> {
	let content = std::fs::read_to_string(root.join(deck))
		.map_err(|e| format!("could not read deck `{}`: {e}", deck.display()))?;
	Ok(parse_html(content)?)
}

fn resolve_deck(
	root: &Path,
	deck: &Path,
	bib: Option<&Path>,
) -> AnyResult<(Document, Resolution, CiteConfig)> {
	let config = load_config(root, bib)?;
	let mut document = read_deck(root, deck)?;
	let resolution = run_citations(&mut document, &FileSource::new(root), &config)?;
	Ok((document, resolution, config))
}

fn print_missing_warnings(resolution: &Resolution, config: &CiteConfig) {
	for key in &resolution.missing {
		eprintln!(
			"{} no record for `{key}` in {}",
			colored!("warning:", yellow),
			config.bib_file.display()
		);
	}
}

fn run_init(args: &BibciteCli) -> AnyResult<()> {
	let root = resolve_root(args);

	if let Some(existing) = CiteConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("bibcite.toml");
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created bibcite.toml");
	println!();
	println!("Next steps:");
	println!("  1. Put your BibTeX records in bib/references.bib");
	println!("  2. Mark citations in your slides:");
	println!("     <span data-cite=\"key1, key2\"></span>");
	println!("  3. Run `bibcite render <DECK>` to number them");

	Ok(())
}

fn run_render(
	args: &BibciteCli,
	deck: &Path,
	bib: Option<&Path>,
	output: Option<&Path>,
) -> AnyResult<()> {
	let root = resolve_root(args);
	let (document, resolution, config) = resolve_deck(&root, deck, bib)?;
	print_missing_warnings(&resolution, &config);

	let html = document.to_html();
	match output {
		Some(output) => {
			std::fs::write(root.join(output), &html)?;
			println!(
				"Rendered {} citation(s) into {}",
				resolution.registry.len(),
				output.display()
			);
		}
		None => println!("{html}"),
	}

	Ok(())
}

/// Returns `true` when every key resolved.
fn run_check(
	args: &BibciteCli,
	deck: &Path,
	bib: Option<&Path>,
	format: OutputFormat,
) -> AnyResult<bool> {
	let root = resolve_root(args);
	let (_, resolution, config) = resolve_deck(&root, deck, bib)?;

	match format {
		OutputFormat::Json => {
			let citations: Vec<serde_json::Value> = resolution
				.registry
				.iter()
				.map(|entry| {
					serde_json::json!({
						"key": entry.key,
						"number": entry.number,
						"found": !resolution.missing.iter().any(|key| key == entry.key),
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": resolution.is_complete(),
				"citations": citations,
				"missing": &resolution.missing,
				"summaries": &resolution.summaries,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			if !resolution.registry.is_empty() {
				println!("{}", colored!("Citations:", bold));
				for entry in resolution.registry.iter() {
					let status = if resolution.missing.iter().any(|key| key == entry.key) {
						colored!("missing", red)
					} else {
						colored!("ok", green)
					};
					println!("  [{}] {} ({status})", entry.number, entry.key);
				}
			}

			if resolution.is_complete() {
				println!(
					"Check passed: {} citation(s) resolved.",
					resolution.registry.len()
				);
			} else {
				eprintln!(
					"Check failed: {} key(s) missing from {}",
					resolution.missing.len(),
					config.bib_file.display()
				);
				for key in &resolution.missing {
					eprintln!("  {key}");
				}
			}
		}
	}

	Ok(resolution.is_complete())
}

fn run_list(args: &BibciteCli, bib: Option<&Path>, format: OutputFormat) -> AnyResult<()> {
	let root = resolve_root(args);
	let config = load_config(&root, bib)?;
	let text = FileSource::new(&root).fetch(&config.bib_file)?;
	let records = parse_bibliography(&text);

	match format {
		OutputFormat::Json => {
			let records: Vec<_> = records.iter().collect();
			println!("{}", serde_json::to_string_pretty(&records)?);
		}
		OutputFormat::Text => {
			if records.is_empty() {
				println!("No records found in {}.", config.bib_file.display());
				return Ok(());
			}

			println!("{}", colored!("Records:", bold));
			for record in &records {
				println!(
					"  {} ({}): {}",
					record.key,
					record.r#type,
					long_citation(Some(record), Locale::En)
				);
			}
			println!();
			println!("{} record(s)", records.len());
		}
	}

	Ok(())
}
