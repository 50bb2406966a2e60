//! Scan example
//!
//! Usage: `cargo run --example scan -- [300|600] [output.jpg]`
//!
//! Writes the JPEG to the given file, or to a timestamped file in the
//! current directory. Set `S400W_PREVIEW=1` to also store the raw preview.

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, bail};
use chrono::Local;
use s400w::{Response, Scanner, WriteSink};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let dpi = match args.next() {
        Some(arg) => Some(arg.parse::<u32>().context("resolution must be 300 or 600")?),
        None => None,
    };
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let name = args.next().unwrap_or_else(|| format!("scan-{stamp}.jpg"));

    let mut scanner = Scanner::from_env()?;

    // Older firmware ignores the resolution commands
    let dpi = match dpi {
        Some(dpi) if scanner.supports_resolution().await => Some(dpi),
        Some(dpi) => {
            println!("Firmware cannot set {} dpi, using the current resolution", dpi);
            None
        }
        None => None,
    };

    let file = File::create(&name).with_context(|| format!("cannot create {name}"))?;
    let mut jpeg = WriteSink::new(BufWriter::new(file));

    let mut preview = match std::env::var("S400W_PREVIEW").as_deref() {
        Ok("1") => {
            let file = File::create(format!("preview-{stamp}.raw"))?;
            Some(WriteSink::new(BufWriter::new(file)))
        }
        _ => None,
    };

    let preview_sink = preview.as_mut().map(|sink| sink as &mut dyn s400w::ScanSink);
    let response = scanner.scan(dpi, preview_sink, Some(&mut jpeg)).await;

    if response != Response::SCAN_READY {
        bail!("scan failed: {}", response);
    }

    println!("Saved {} ({} bytes)", name, jpeg.written());
    Ok(())
}
