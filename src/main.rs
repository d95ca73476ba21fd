use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jackc::lexer::{tokenize, tokens_to_xml};
use jackc::{compile_batch, DriverError, Unit};

#[derive(Parser)]
#[command(name = "jackc", version, about = "Compiles Jack classes to VM code")]
struct Cli {
    /// A .jack file, or a directory whose .jack files are compiled
    path: PathBuf,

    /// Print VM code to stdout instead of writing .vm files
    #[arg(long)]
    stdout: bool,

    /// Also write each unit's token listing to <Name>T.xml
    #[arg(long)]
    tokens: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every unit compiled and was written.
fn run(cli: &Cli) -> Result<bool, DriverError> {
    let mut all_ok = true;

    let mut loaded = Vec::new();
    for file in source_files(&cli.path)? {
        match fs::read_to_string(&file) {
            Ok(source) => loaded.push((file.display().to_string(), file, source)),
            Err(source) => {
                eprintln!("{}", DriverError::Io { path: file, source });
                all_ok = false;
            }
        }
    }

    let units: Vec<_> = loaded
        .iter()
        .map(|(name, _, source)| Unit {
            name: name.as_str(),
            source: source.as_str(),
        })
        .collect();

    for ((_, file, source), (name, result)) in loaded.iter().zip(compile_batch(&units)) {
        let written = match result {
            Ok(chunk) if cli.stdout => {
                print!("{}", chunk);
                Ok(())
            }
            Ok(chunk) => write_output(&file.with_extension("vm"), &chunk.to_string()),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                all_ok = false;
                Ok(())
            }
        };
        if let Err(e) = written {
            eprintln!("{}", e);
            all_ok = false;
        }

        if cli.tokens {
            if let Ok(tokens) = tokenize(source) {
                if let Err(e) = write_output(&token_listing_path(file), &tokens_to_xml(&tokens)) {
                    eprintln!("{}", e);
                    all_ok = false;
                }
            }
        }
    }

    Ok(all_ok)
}

fn source_files(path: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let io_error = |source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    if path.is_dir() {
        for entry in fs::read_dir(path).map_err(io_error)? {
            let file = entry.map_err(io_error)?.path();
            if file.is_file() && is_jack_file(&file) {
                files.push(file);
            }
        }
        files.sort();
    } else if path.is_file() && is_jack_file(path) {
        files.push(path.to_path_buf());
    }

    if files.is_empty() {
        Err(DriverError::NoSources(path.to_path_buf()))
    } else {
        Ok(files)
    }
}

fn is_jack_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "jack")
}

fn token_listing_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.with_file_name(format!("{}T.xml", stem))
}

fn write_output(path: &Path, contents: &str) -> Result<(), DriverError> {
    fs::write(path, contents).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote output");
    Ok(())
}
