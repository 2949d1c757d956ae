//! Chardev binary entry point.
//!
//! Loads the device against the in-process registrar, walks it through
//! a write/read cycle, and unloads it again.

use std::process::ExitCode;
use std::sync::Arc;

use chardev::{cli, logging, Config, DeviceManager, MemoryRegistrar};
use tracing::info;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("chardev: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chardev: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", format!("chardev={}", config.log_filter()));
    }
    logging::init();

    if let Err(e) = run(&config) {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(config: &Config) -> chardev::Result<()> {
    info!("chardev v{}", env!("CARGO_PKG_VERSION"));

    let registrar = Arc::new(MemoryRegistrar::new());
    let device = DeviceManager::load(registrar, &config.device.name, &config.device.class)?;
    info!("character device loaded at {}", device.node_path());

    // Exercise the device end to end
    let session = device.open()?;
    info!("session {} opened", session);

    let written = device.write(session, b"hello, device")?;
    info!("wrote {} bytes", written);

    let content = device.read(session, 64)?;
    info!("read back: {:?}", String::from_utf8_lossy(&content));

    device.write(session, b"hi")?;
    info!("overwrote content; valid length is now {}", device.buffer().valid_len()?);

    device.close(session)?;
    info!("session closed ({} live)", device.session_count());

    device.unload()?;
    info!("character device unloaded");
    Ok(())
}
