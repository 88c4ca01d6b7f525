//! Standalone CLI tool for capturing screenshots.
//!
//! `wmcp-screenshot` exited 1 with "not yet implemented" despite
//! `cup_core::screenshot` already containing a complete DXGI/GDI
//! pipeline; this wires it through via `Session::screenshot`.

use clap::Parser;
use cup_core::cup::node::Bounds;
use cup_core::cup::session::Session;

#[derive(Parser)]
#[command(name = "cup-screenshot", about = "Capture a screenshot via DXGI/GDI")]
struct Args {
    /// Output file path
    #[arg(short, long, default_value = "screenshot.png")]
    out: String,

    /// Monitor index (0 = primary)
    #[arg(long, default_value = "0")]
    monitor: u32,

    /// Crop to x,y,w,h before encoding
    #[arg(long, value_parser = parse_region)]
    region: Option<Bounds>,
}

fn parse_region(s: &str) -> Result<Bounds, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err("expected x,y,w,h".into());
    }
    let nums: Result<Vec<i32>, _> = parts.iter().map(|p| p.trim().parse::<i32>()).collect();
    let nums = nums.map_err(|e| e.to_string())?;
    Ok(Bounds { x: nums[0], y: nums[1], w: nums[2], h: nums[3] })
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.monitor != 0 {
        eprintln!("cup-screenshot: only monitor 0 is supported by the current capture path");
    }

    let mut session = Session::new();
    let png = match session.screenshot(args.region) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cup-screenshot: capture failed: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::write(&args.out, &png) {
        eprintln!("cup-screenshot: failed to write {}: {e}", args.out);
        std::process::exit(2);
    }

    println!("Saved {} bytes to {}", png.len(), args.out);
}
