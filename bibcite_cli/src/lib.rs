use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Number the citations of a slide deck and render its bibliography.",
	long_about = "bibcite reads a BibTeX bibliography and an HTML slide deck, numbers every \
	              citation marker in reading order, and writes reference glyphs, per-slide short \
	              citations, and a numbered bibliography back into the deck.\n\nQuick start:\n  \
	              bibcite init            Create a bibcite.toml\n  bibcite render deck.html  \
	              Print the rendered deck\n  bibcite check deck.html   Verify every key has a \
	              record\n  bibcite list            Show the parsed bibliography"
)]
pub struct BibciteCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. Relative file arguments are
	/// resolved against it.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize bibcite in a project by creating a sample `bibcite.toml`.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Resolve the citations of a deck and print or write the result.
	///
	/// Markers are replaced by numbered reference glyphs, every section's
	/// citation bar receives its short citations, and the bibliography list
	/// is rebuilt. Keys without a record are rendered with a visible note and
	/// reported as warnings.
	Render {
		/// The HTML deck to render.
		deck: PathBuf,

		/// Bibliography file to use instead of `bib_file` from the config.
		#[arg(long)]
		bib: Option<PathBuf>,

		/// Write the rendered deck here instead of printing it.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Check that every cited key has a bibliography record.
	///
	/// Resolves the deck in memory and prints the citation numbers. Exits
	/// with a non-zero status code when any key is missing from the
	/// bibliography.
	Check {
		/// The HTML deck to check.
		deck: PathBuf,

		/// Bibliography file to use instead of `bib_file` from the config.
		#[arg(long)]
		bib: Option<PathBuf>,

		/// Output format for check results.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List the records of the bibliography.
	List {
		/// Bibliography file to use instead of `bib_file` from the config.
		#[arg(long)]
		bib: Option<PathBuf>,

		/// Output format for the record list.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
