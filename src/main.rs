//! Controlador de línea de comandos del traductor.

use anyhow::{Context, Result};
use clap::{crate_version, App, Arg};
use std::{
    fs::{self, File},
    io::{self, Read, Write},
};

use microc::{emit, lex, lower, lower::RegisterMap, parse};

/// Programa de muestra, usado cuando no se indica un archivo de
/// entrada.
const SAMPLE: &str = "int a = 3; int b = 4; int i; \
                      for (i = 0; i <= 3; i++) { \
                      if (a == b) { a += i + 2; } \
                      if (a != b) { a = a + 1; } }";

fn main() -> Result<()> {
    let matches = App::new("microc")
        .version(crate_version!())
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("Source file ('-' for stdin, default: built-in sample)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .takes_value(true)
                .default_value("-")
                .value_name("FILE")
                .help("Output file ('-' for stdout)"),
        )
        .get_matches();

    let code = match matches.value_of("input") {
        None => SAMPLE.to_string(),
        Some("-") => {
            let mut code = String::new();
            io::stdin()
                .read_to_string(&mut code)
                .context("Failed to read from stdin")?;

            code
        }

        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file: {}", path))?,
    };

    let (tokens, warnings) = lex::scan(&code);
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let ast = parse::parse(&tokens)?;
    let program = lower::lower(&ast, &RegisterMap::default())?;

    match matches.value_of("output") {
        Some("-") | None => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();

            emit::write(&program, &mut stdout)?;
            stdout.flush()?;
        }

        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;

            emit::write(&program, &mut file)?;
        }
    }

    Ok(())
}
