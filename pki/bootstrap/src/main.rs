//! One-shot entry point: bootstrap the local PKI and write the
//! artifacts.

// The binary only links the library surface.
#![allow(unused_crate_dependencies)]

use std::process::ExitCode;

use localtls_bootstrap::config::BootstrapConfig;
use localtls_bootstrap::pipeline;
use localtls_common::tracing::enable_tracing;
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing()?;
    let config = match std::env::args().nth(1) {
        Some(path) => BootstrapConfig::load(path)?,
        None => BootstrapConfig::default(),
    };
    let artifacts = pipeline::run(&config)?;
    let paths = pipeline::write(&artifacts, &config.output_dir)?;
    info!(
        "PKI artifacts ready: {ca_cert}, {ca_key}, {server_cert}, {server_key}",
        ca_cert = paths.ca.certificate.display(),
        ca_key = paths.ca.private_key.display(),
        server_cert = paths.server.certificate.display(),
        server_key = paths.server.private_key.display(),
    );
    Ok(())
}
