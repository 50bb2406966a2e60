//! Command probing example
//!
//! Usage: `cargo run --example probe -- [start-hex]`
//!
//! Sends every candidate command from `start-hex` on and prints the ones
//! the scanner answers. Takes many hours for the whole space.

use anyhow::Context;
use s400w::{KNOWN_COMMANDS, Scanner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let start = match std::env::args().nth(1) {
        Some(arg) => u32::from_str_radix(arg.trim_start_matches("0x"), 16)
            .context("start must be a hex number")?,
        None => 0,
    };

    let mut scanner = Scanner::from_env()?;
    println!("probing @ {:08x}", start);

    for hit in scanner.probe(start, &KNOWN_COMMANDS).await {
        println!("{:08x}: {}", hit.command, hit.response);
    }

    Ok(())
}
