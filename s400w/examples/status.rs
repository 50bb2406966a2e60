//! Scanner status example
//!
//! Target comes from `S400W_HOST` / `S400W_PORT`.

use s400w::Scanner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut scanner = Scanner::from_env()?;
    println!("Scanner at {}", scanner.remote_addr());

    match scanner.firmware().await {
        Ok(firmware) => println!(
            "Firmware: {} (resolution setting {})",
            firmware,
            if firmware.supports_resolution() { "supported" } else { "not supported" }
        ),
        Err(e) => println!("Firmware: {}", e),
    }

    println!("Status: {}", scanner.status().await);

    match scanner.battery_state().await {
        Ok(battery) => println!("Battery: {}", battery.level()),
        Err(e) => println!("Battery: {}", e),
    }

    Ok(())
}
