//! `decodeasm` entry point.
//!
//! Decodes one hex opcode, or the Go byte-slice literals on standard input,
//! and prints one instruction per line.

mod cli;
mod input;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use capstone_wasm_common::{ConfigFile, LogConfig, LogFormat};
use capstone_wasm_core::DecoderRuntime;
use capstone_wasm_disasm::OpenDisassembler;

use crate::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().context("Failed to write usage output")?;
            return Ok(ExitCode::from(cli::parse_exit_status(&e)));
        }
    };

    let mut config = match &cli.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?,
        None => ConfigFile::default(),
    };
    init_tracing(&config.log);

    let code = if cli.stdin {
        input::parse_byte_literals(io::stdin().lock())?
    } else {
        let opcode = cli.opcode.as_deref().unwrap_or_default();
        match input::parse_hex_opcode(opcode) {
            Ok(code) => code,
            Err(e) => {
                debug!(error = %e, "Rejected opcode");
                eprintln!("invalid hex opcode: {}", input::strip_hex_prefix(opcode));
                eprintln!("{}", Cli::command().render_usage());
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    if let Some(module) = cli.module {
        config.runtime.decoder.module_path = Some(module);
    }

    let (arch, mode) = cli.arch.target();
    let runtime =
        DecoderRuntime::from_config(&config.runtime).context("Failed to load the decoder module")?;
    let cs = runtime
        .open(arch, mode)
        .with_context(|| format!("Failed to open a {arch} disassembler"))?;

    let lines = cs.decode(&code);
    cs.close();

    let mut out = io::stdout().lock();
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    if cli.stdin && lines.is_empty() {
        warn!(bytes = code.len(), "No instructions decoded");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match log.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}
