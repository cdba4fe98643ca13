use std::path::PathBuf;

use clap::Parser;

use plcopen_cli::cli;
use plcopen_cli::logger;

#[derive(Parser, Debug)]
#[command(name = "plcopen", about = "Checks and converts PLCopen TC6 documents")]
struct Args {
    /// Turn on verbose logging.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log records to this file instead of standard error.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Checks that the documents (XML or, by extension, JSON) are valid.
    Check { files: Vec<PathBuf> },
    /// Converts a PLCopen XML document to JSON.
    Xml2json {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Converts a JSON document to PLCopen XML.
    Json2xml {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Spaces per nesting level. Zero writes a single line.
        #[arg(long, default_value_t = 2)]
        indent: usize,
    },
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    match args.action {
        Action::Check { files } => cli::check(files, false),
        Action::Xml2json {
            input,
            output,
            pretty,
        } => cli::xml2json(&input, output.as_deref(), pretty),
        Action::Json2xml {
            input,
            output,
            indent,
        } => {
            let indent = if indent == 0 { None } else { Some(indent) };
            cli::json2xml(&input, output.as_deref(), indent)
        }
    }
}
