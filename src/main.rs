use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rescheme::diagnostic::{Diagnostic, ansi::AnsiRenderer, json, registry};
use rescheme::heap::{DEFAULT_HEAP_CAPACITY, Heap, HeapConfig};
use rescheme::printer;
use rescheme::reader::{ReadError, Reader};

const BANNER: &str = concat!("ReScheme v", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(name = "rescheme", version, about = "Read Scheme data and echo it back")]
struct Cli {
    /// Source file to read. Standard input when omitted.
    file: Option<PathBuf>,

    /// Number of object slots in the heap arena.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_HEAP_CAPACITY)]
    heap_size: usize,

    /// Report diagnostics as JSON lines.
    #[arg(long)]
    json: bool,

    #[arg(long)]
    no_color: bool,

    /// Print collector statistics as JSON on shutdown.
    #[arg(long)]
    stats: bool,

    /// Log filter, e.g. `rescheme=debug`. Overrides RESCHEME_LOG.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Explain an error code and exit.
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

struct Reporter {
    json: bool,
    color: bool,
}

impl Reporter {
    fn emit(&self, d: &Diagnostic) {
        if self.json {
            eprintln!("{}", json::render(d));
        } else {
            eprint!("{}", AnsiRenderer { use_color: self.color }.render(d));
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let reporter = Reporter {
        json: cli.json,
        color: !cli.no_color && io::stderr().is_terminal(),
    };

    if let Some(code) = &cli.explain {
        return match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                ExitCode::SUCCESS
            }
            None => {
                reporter.emit(&Diagnostic::error(format!("unknown error code '{code}'")));
                ExitCode::FAILURE
            }
        };
    }

    if cli.heap_size == 0 {
        reporter.emit(
            &Diagnostic::warning("heap size 0 raised to 1")
                .with_note("the arena needs at least one slot"),
        );
    }
    let mut heap = Heap::new(HeapConfig { capacity: cli.heap_size });

    let ok = match &cli.file {
        Some(path) => run_file(&mut heap, path, &reporter),
        None => run_repl(&mut heap, &reporter),
    };

    let stats = heap.shutdown();
    if cli.stats {
        match serde_json::to_string(&stats) {
            Ok(s) => eprintln!("{s}"),
            Err(e) => reporter.emit(&Diagnostic::error(format!("could not serialize stats: {e}"))),
        }
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(d) => EnvFilter::new(d),
        None => EnvFilter::try_from_env("RESCHEME_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Read every datum in `source` and write it back, one per line.
fn echo(heap: &mut Heap, source: &str) -> Result<(), ReadError> {
    let mut reader = Reader::new(source);
    loop {
        let value = reader.read(heap)?;
        if value.is_eof() {
            return Ok(());
        }
        println!("{}", printer::write(heap, value)?);
    }
}

fn run_file(heap: &mut Heap, path: &Path, reporter: &Reporter) -> bool {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            reporter.emit(&Diagnostic::error(format!("could not read {}: {e}", path.display())));
            return false;
        }
    };
    match echo(heap, &source) {
        Ok(()) => true,
        Err(e) => {
            reporter.emit(&Diagnostic::from(&e).with_source(source.as_str()));
            false
        }
    }
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    out.write_all(b"> ")?;
    out.flush()
}

fn run_repl(heap: &mut Heap, reporter: &Reporter) -> bool {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        println!("{BANNER}");
    }

    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            if let Err(e) = prompt(&mut io::stdout()) {
                reporter.emit(&Diagnostic::error(format!("could not write to standard output: {e}")));
                return false;
            }
        }
        let line = match lines.next() {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                reporter.emit(&Diagnostic::error(format!("could not read standard input: {e}")));
                return false;
            }
        };
        // a bad datum costs the rest of its line; a heap failure ends the session
        if let Err(e) = echo(heap, &line) {
            reporter.emit(&Diagnostic::from(&e).with_source(line.as_str()));
            if e.is_fatal() {
                return false;
            }
        }
    }
    if interactive {
        println!();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn prompt_writes_marker() {
        let mut out = Vec::new();
        prompt(&mut out).unwrap();
        assert_eq!(out, b"> ");
    }

    #[test]
    fn prompt_surfaces_flush_failure() {
        let err = prompt(&mut Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
