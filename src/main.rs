mod dump;
mod time;

use std::{
    error::Error,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

struct HelpTemplate {}

const INDENT: &str = "  ";

impl From<HelpTemplate> for clap::builder::StyledStr {
    fn from(_: HelpTemplate) -> Self {
        format!(
            "{{about-with-newline}}
{{usage-heading}}
{INDENT}(.xmi data in stdin) | {{usage}}
{INDENT}<FILE.xmi {{usage}}{{tab}}(does not work on PowerShell)

{{all-args}}{{after-help}}",
        )
        .into()
    }
}

fn stdin_help() -> HelpTemplate {
    HelpTemplate {}
}

#[derive(Subcommand)]
enum CliCommand {
    /// Converts XMI files into Standard MIDI Files.
    ///
    /// Every sequence of an XMI file is written to its own format-0 file, named after the input
    /// with a 0-based sequence index appended: `music.xmi` becomes `music_0.mid`, `music_1.mid`,
    /// and so on. A file that fails to load, convert, or save does not stop the others.
    Convert {
        /// Directory for the converted files [default: next to each input file]
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        #[arg(required = true, value_name = "FILE.xmi")]
        files: Vec<PathBuf>,
    },

    /// Converts XMI data and dumps the events of every resulting sequence to stdout.
    ///
    /// Shows exactly what `convert` would write, with one event per line, the relative delta,
    /// and the total MIDI pulse count in separate columns.
    #[command(help_template = stdin_help())]
    Dump,
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_about,
    infer_subcommands = true,
    subcommand_help_heading = "Commands (partial matches are supported)"
)]
struct Cli {
    /// Log chunk-level conversion details to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        concat!(env!("CARGO_CRATE_NAME"), "=debug")
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn output_path(input: &Path, out_dir: Option<&Path>, index: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or("out".into());
    let dir = out_dir.or(input.parent()).unwrap_or(Path::new(""));
    dir.join(format!("{stem}_{index}.mid"))
}

/// Converts a single file, returning `false` if anything about it went wrong.
fn convert_file(input: &Path, out_dir: Option<&Path>) -> bool {
    let xmi = match fs::read(input) {
        Ok(xmi) => xmi,
        Err(e) => {
            eprintln!("Could not load {}: {e}", input.display());
            return false;
        }
    };
    eprintln!("Loaded {}", input.display());

    let sequences = xmi2mid::transcode(&xmi);
    if sequences.is_empty() {
        eprintln!("Could not convert {}", input.display());
        return false;
    }

    let mut saved_all = true;
    for (i, smf) in sequences.into_iter().enumerate() {
        let output = output_path(input, out_dir, i);
        match fs::write(&output, smf) {
            Ok(()) => eprintln!(
                "Converted and saved {} to {}",
                input.display(),
                output.display()
            ),
            Err(e) => {
                eprintln!("Could not save {}: {e}", output.display());
                saved_all = false;
            }
        }
    }
    saved_all
}

fn convert(files: &[PathBuf], out_dir: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let failed = files
        .iter()
        .filter(|input| !convert_file(input, out_dir))
        .count();
    if failed != 0 {
        return Err(format!("{failed} of {} files failed to convert", files.len()).into());
    }
    Ok(())
}

fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    init_logging(args.verbose);

    match args.command {
        CliCommand::Convert { out_dir, files } => convert(&files, out_dir.as_deref())?,
        CliCommand::Dump => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            let sequences = xmi2mid::transcode(&bytes);
            if sequences.is_empty() {
                return Err("no convertible EVNT chunks found".into());
            }
            dump::dump(&sequences)?;
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        let args = std::env::args()
            .skip(1)
            .fold(String::new(), |a, b| a + " " + &b);
        eprintln!(
            "`{}{args}`: error: {e}",
            std::env::current_exe()
                .ok()
                .as_ref()
                .and_then(|p| p.file_stem())
                .map(|p| p.to_string_lossy())
                .unwrap_or(env!("CARGO_PKG_NAME").into())
        );
        std::process::exit(1);
    }
}
