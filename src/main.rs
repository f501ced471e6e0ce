use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use sicxe_asm::asm::{assemble, AsmConfig, AsmErr, Dialect, Radix};
use sicxe_asm::err::Report;

/// Two-pass assembler for SIC/XE programs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File from which assembly source is read.
    input: PathBuf,

    /// Directory the listing (.lst) and object program (.obj) are written to.
    /// Defaults to the directory of the input file.
    #[arg(short = 'o', long)]
    out_dir: Option<PathBuf>,

    /// Assemble plain SIC instead of SIC/XE.
    #[arg(long)]
    sic: bool,

    /// Read START, END and BASE addresses as decimal numbers instead of hex.
    #[arg(long)]
    decimal_start: bool,

    /// Print the listing and object program to stdout instead of writing files.
    #[arg(long)]
    stdout: bool,
}

#[derive(Debug)]
enum Fail {
    /// The source could not be assembled.
    Asm(AsmErr),
    /// Reading the source or writing an output failed.
    Io(PathBuf, std::io::Error),
    /// Logging could not be set up.
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::Asm(e) => write!(f, "{:#}", Report::new(e)),
            Fail::Io(path, e) => write!(f, "Error: {}: {e}", path.display()),
            Fail::InitialisationFailure(msg) => f.write_str(msg),
        }
    }
}

impl Error for Fail {}

fn output_paths(cli: &Cli) -> (PathBuf, PathBuf) {
    let dir = match &cli.out_dir {
        Some(dir) => dir.clone(),
        None => cli.input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let stem = cli.input.file_stem().unwrap_or(cli.input.as_os_str());
    let with_ext = |ext: &str| {
        let mut name = stem.to_os_string();
        name.push(ext);
        dir.join(name)
    };

    (with_ext(".lst"), with_ext(".obj"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), Fail> {
    std::fs::write(path, contents).map_err(|e| Fail::Io(path.to_path_buf(), e))?;
    event!(Level::INFO, "wrote {}", path.display());
    Ok(())
}

fn run_assembler() -> Result<(), Fail> {
    let cli = Cli::parse();

    // Log output is selected with RUST_LOG, see
    // https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .map_err(|e| Fail::InitialisationFailure(format!(
            "failed to initialise tracing filter (perhaps there is a problem with RUST_LOG): {e}"
        )))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "assemble", input=?cli.input);
    let _enter = span.enter();

    let config = AsmConfig {
        dialect: if cli.sic { Dialect::Sic } else { Dialect::SicXe },
        start_radix: if cli.decimal_start { Radix::Decimal } else { Radix::Hex },
    };
    let src = std::fs::read_to_string(&cli.input)
        .map_err(|e| Fail::Io(cli.input.clone(), e))?;

    let asm = assemble(&src, &config).map_err(Fail::Asm)?;
    event!(Level::INFO, "assembled {} ({} symbols, {} bytes)", asm.object.name, asm.symbols.len(), asm.object.length);

    if cli.stdout {
        print!("{}", asm.listing);
        println!();
        print!("{}", asm.object);
    } else {
        let (lst_path, obj_path) = output_paths(&cli);
        write_file(&lst_path, &asm.listing.to_string())?;
        write_file(&obj_path, &asm.object.to_string())?;
    }
    Ok(())
}

fn main() {
    match run_assembler() {
        Err(e) => {
            event!(Level::ERROR, "assembly failed: {e:?}");
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
