// src/bin/ext2dump.rs
use std::env;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use colored::*;
use ext2dump::{Dumper, DumpError, FileImage};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Uso: ext2dump imagen.img";

fn main() {
    // Logs a stderr; stdout queda solo para los registros
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{} {:#}", "ext2dump:".red().bold(), err);
        let code = err
            .downcast_ref::<DumpError>()
            .map(DumpError::exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

fn run() -> Result<()> {
    // 1. Un solo argumento: la ruta de la imagen
    let mut args = env::args().skip(1);
    let image_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| DumpError::Usage(USAGE.into()))?;

    if args.next().is_some() {
        return Err(DumpError::Usage(format!("{USAGE} (solo un argumento)")).into());
    }

    // 2. Abrir en solo lectura
    let image = FileImage::open(&image_path)?;

    // 3. Volcar. Lo escrito antes de un error se conserva en stdout.
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = Dumper::new(&image, &mut out).run();
    out.flush().context("No se pudo vaciar la salida estándar")?;

    result.with_context(|| format!("Error al volcar {:?}", image.path()))
}
