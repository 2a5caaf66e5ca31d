// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wirerouter worker process.
//!
//! Reads route requests as JSON and writes one JSON response per request to stdout.
//! Diagnostics go to stderr (`RUST_LOG` controls the level, default `warn`).

use std::error::Error;
use std::io::{Read, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use wirerouter::worker::{encode_response, handle_request_json, request_schema, WorkerError};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--time-limit-ms <ms>]\n  {program} --input <file> [--time-limit-ms <ms>]\n  {program} --stdio [--time-limit-ms <ms>]\n  {program} --schema\n\nWithout flags one request is read from stdin.\n--input reads one request from a file.\n--stdio answers line-delimited requests until EOF.\n--schema prints the JSON schema of a request.\n--time-limit-ms overrides the batch budget of every request."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    input: Option<String>,
    stdio: bool,
    schema: bool,
    time_limit_ms: Option<u64>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                if options.input.is_some() {
                    return Err(());
                }
                options.input = Some(args.next().ok_or(())?);
            }
            "--stdio" => {
                if options.stdio {
                    return Err(());
                }
                options.stdio = true;
            }
            "--schema" => {
                if options.schema {
                    return Err(());
                }
                options.schema = true;
            }
            "--time-limit-ms" => {
                if options.time_limit_ms.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.time_limit_ms = Some(raw.parse().map_err(|_| ())?);
            }
            _ => return Err(()),
        }
    }

    if options.stdio && options.input.is_some() {
        return Err(());
    }
    if options.schema && (options.stdio || options.input.is_some() || options.time_limit_ms.is_some()) {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn write_line(out: &mut impl Write, line: &str) -> Result<(), WorkerError> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

async fn serve_stdio(time_limit_ms: Option<u64>) -> Result<(), WorkerError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout().lock();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_request_json(&line, time_limit_ms).await;
        write_line(&mut stdout, &encode_response(&response)?)?;
    }
    Ok(())
}

fn read_one(path: Option<&str>) -> Result<String, WorkerError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut raw = String::new();
            std::io::stdin().lock().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "wirerouter".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if options.schema {
            let schema = serde_json::to_string_pretty(&request_schema())?;
            write_line(&mut std::io::stdout().lock(), &schema)?;
            return Ok(());
        }

        init_tracing();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        if options.stdio {
            runtime.block_on(serve_stdio(options.time_limit_ms))?;
            return Ok(());
        }

        let raw = read_one(options.input.as_deref())?;
        let response = runtime.block_on(handle_request_json(&raw, options.time_limit_ms));
        write_line(&mut std::io::stdout().lock(), &encode_response(&response)?)?;
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("wirerouter: {err}");
        std::process::exit(1);
    }
}
