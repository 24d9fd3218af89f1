use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sigh_core::diagnostic::Diagnostic;
use sigh_core::span::LineMap;
use sigh_core::{CoreError, SourceFile, check, load_sources, parse_program, run};

/// Run Sigh programs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// A `.si` file, or a directory searched recursively for `.si` files.
    /// Reads stdin when omitted.
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    #[arg(long, help = "Stop after semantic analysis")]
    check: bool,

    #[arg(long, help = "Print the parsed AST before running")]
    dump_ast: bool,

    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level: off, error, warn, info, debug, trace"
    )]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(cli.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let sources = match &cli.input {
        Some(path) => load_sources(path)
            .with_context(|| format!("failed to load sources from {}", path.display()))?,
        None => {
            let mut contents = String::new();
            io::stdin()
                .read_to_string(&mut contents)
                .context("failed to read program from stdin")?;
            vec![SourceFile {
                path: PathBuf::from("<stdin>"),
                contents,
            }]
        }
    };
    log::debug!("loaded {} source file(s)", sources.len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;
    for file in &sources {
        let name = file.path.display().to_string();
        if let Err(err) = process(&cli, file, &name, &mut out) {
            out.flush().context("failed to flush stdout")?;
            report(file, &name, &err);
            failures += 1;
        }
    }
    out.flush().context("failed to flush stdout")?;

    if failures > 0 {
        anyhow::bail!("{failures} of {} program(s) failed", sources.len());
    }
    Ok(())
}

/// Each file is a program of its own.
fn process(cli: &Cli, file: &SourceFile, name: &str, out: &mut dyn Write) -> Result<(), CoreError> {
    if cli.dump_ast {
        let program = parse_program(&file.contents)?;
        writeln!(out, "{program:#?}")?;
    }
    if cli.check {
        check(&file.contents)?;
        writeln!(out, "ok: {name}")?;
        return Ok(());
    }
    if let Some(value) = run(&file.contents, out)? {
        writeln!(out, "Program returned {value}")?;
    }
    Ok(())
}

fn report(file: &SourceFile, name: &str, err: &CoreError) {
    let diagnostics: Vec<Diagnostic> = err.diagnostics();
    if diagnostics.is_empty() {
        eprintln!("{name}: error: {err}");
        return;
    }
    let lines = LineMap::new(&file.contents);
    for diag in &diagnostics {
        eprintln!("{}", diag.render(&lines, name));
    }
}
