//! Standalone CLI tool for dumping a CUP accessibility tree.
//!
//! Replaces `wmcp-tree`'s raw-UIA JSON dump with a full `Session` capture.
//! Argument surface and the stdout capture report mirror
//! `original_source/cup/__main__.py`'s argparse tool line for line.
//! Unlike `wmcp-tree.rs`'s `--all` flag, which silently fell back to the
//! foreground window with a TODO, window enumeration here is fully wired:
//! absent `--foreground`, every visible window is captured (optionally
//! narrowed by `--app`).

use std::time::Instant;

use clap::Parser;
use cup_core::cup::pruner::{count_nodes, prune_tree, Detail};
use cup_core::cup::session::{Scope, Session};

#[derive(Parser)]
#[command(
    name = "cup-tree",
    about = "Capture accessibility tree in Computer Use Protocol format"
)]
struct Args {
    /// Max tree depth (0 = unlimited)
    #[arg(long, default_value = "0")]
    depth: usize,

    /// Only capture the foreground/focused window
    #[arg(long)]
    foreground: bool,

    /// Filter to window/app title containing this string
    #[arg(long)]
    app: Option<String>,

    /// Write pruned CUP JSON to file
    #[arg(long)]
    json_out: Option<String>,

    /// Write full (unpruned) CUP JSON to file
    #[arg(long)]
    full_json_out: Option<String>,

    /// Write compact LLM text to file
    #[arg(long)]
    compact_out: Option<String>,

    /// Print compact text to stdout
    #[arg(long)]
    compact: bool,

    /// Force platform (default: auto-detect)
    #[arg(long, value_parser = ["windows", "macos", "linux", "web"])]
    platform: Option<String>,

    /// CDP port for web platform (default: 9222)
    #[arg(long)]
    cdp_port: Option<u16>,

    /// CDP host for web platform (default: localhost)
    #[arg(long)]
    cdp_host: Option<String>,
}

fn session_for(platform: Option<&str>) -> Session {
    match platform {
        Some("windows") => {
            Session::with_adapter(Box::new(cup_core::cup::adapter::WindowsAdapter::new()))
        }
        Some("macos") => {
            Session::with_adapter(Box::new(cup_core::cup::adapter::MacosAdapter::new()))
        }
        Some("linux") => {
            Session::with_adapter(Box::new(cup_core::cup::adapter::LinuxAdapter::new()))
        }
        Some("web") => Session::with_adapter(Box::new(cup_core::cup::adapter::WebAdapter::new())),
        _ => Session::new(),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let max_depth = if args.depth > 0 { args.depth } else { 999 };

    if args.platform.as_deref() == Some("web") {
        if let Some(port) = args.cdp_port {
            std::env::set_var("CUP_CDP_PORT", port.to_string());
        }
        if let Some(host) = &args.cdp_host {
            std::env::set_var("CUP_CDP_HOST", host);
        }
    }

    let mut session = session_for(args.platform.as_deref());
    println!("=== CUP Tree Capture ({}) ===", session.platform_name());

    let scope = if args.foreground { Scope::Foreground } else { Scope::Full };
    let app_filter = if args.foreground { None } else { args.app.as_deref() };

    let t0 = Instant::now();
    let outcome = match session.capture(scope, app_filter, max_depth, Detail::Standard) {
        Ok(o) => o,
        Err(e) if e.tag() == "windownotfound" => {
            println!("No window found matching '{}'", args.app.as_deref().unwrap_or(""));
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("cup-tree: capture failed: {e}");
            std::process::exit(1);
        }
    };
    let t_walk = t0.elapsed().as_secs_f64() * 1000.0;

    let screen = outcome.envelope.screen;
    let scale_str = match screen.scale {
        Some(s) if (s - 1.0).abs() > f64::EPSILON => format!(" @{s}x"),
        _ => String::new(),
    };
    println!("Screen: {}x{}{}", screen.w, screen.h, scale_str);

    if args.foreground {
        let title = outcome.envelope.app.as_ref().and_then(|a| a.name.clone()).unwrap_or_default();
        println!("Target: foreground (\"{title}\")");
    } else {
        println!("Target: {} window(s)", outcome.window_list.iter().filter(|w| app_matches(w, app_filter)).count());
    }

    let stats = collect_stats(&outcome.envelope.tree, max_depth.min(cup_core::cup::capture::MAX_TREE_DEPTH));
    println!("Captured {} nodes in {:.1} ms", stats.nodes, t_walk);
    println!("Max depth: {}", stats.max_depth);

    let json_str = match serde_json::to_string(&outcome.envelope) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cup-tree: serialization failed: {e}");
            std::process::exit(2);
        }
    };
    println!("JSON size: {:.1} KB", json_str.len() as f64 / 1024.0);

    println!("\nRole distribution (top 15):");
    let mut roles: Vec<(&String, &usize)> = stats.roles.iter().collect();
    roles.sort_by(|a, b| b.1.cmp(a.1));
    for (role, count) in roles.into_iter().take(15) {
        println!("  {role:45} {count:6}");
    }

    if let Some(tools) = &outcome.envelope.tools {
        println!("\nWebMCP tools ({}):", tools.len());
        for tool in tools {
            let desc = tool.description.as_deref().unwrap_or("");
            let desc_str = if desc.is_empty() { String::new() } else { format!(" - {desc}") };
            println!("  {}{desc_str}", tool.name);
        }
    }

    if let Some(path) = &args.json_out {
        let pruned = prune_tree(&outcome.envelope.tree, Detail::Standard);
        let mut pruned_envelope = outcome.envelope.clone();
        pruned_envelope.tree = pruned;
        match serde_json::to_string_pretty(&pruned_envelope) {
            Ok(json) => {
                let kb = json.len() as f64 / 1024.0;
                if let Err(e) = std::fs::write(path, json) {
                    eprintln!("cup-tree: failed to write {path}: {e}");
                    std::process::exit(2);
                }
                println!("\nPruned JSON written to {path} ({kb:.1} KB)");
            }
            Err(e) => {
                eprintln!("cup-tree: serialization failed: {e}");
                std::process::exit(2);
            }
        }
    }

    if let Some(path) = &args.full_json_out {
        match serde_json::to_string_pretty(&outcome.envelope) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    eprintln!("cup-tree: failed to write {path}: {e}");
                    std::process::exit(2);
                }
                println!("Full JSON written to {path} ({:.1} KB)", json_str.len() as f64 / 1024.0);
            }
            Err(e) => {
                eprintln!("cup-tree: serialization failed: {e}");
                std::process::exit(2);
            }
        }
    }

    if args.compact_out.is_some() || args.compact {
        let window_list = if args.foreground { Some(outcome.window_list.as_slice()) } else { None };
        let compact_str = cup_core::cup::serialize::serialize_compact(&outcome.envelope, window_list, Detail::Standard);
        let compact_kb = compact_str.len() as f64 / 1024.0;
        if args.compact {
            println!("\n{compact_str}");
        }
        if let Some(path) = &args.compact_out {
            if let Err(e) = std::fs::write(path, &compact_str) {
                eprintln!("cup-tree: failed to write {path}: {e}");
                std::process::exit(2);
            }
            let json_kb = json_str.len() as f64 / 1024.0;
            let ratio = if json_kb > 0.0 { (1.0 - compact_kb / json_kb) * 100.0 } else { 0.0 };
            println!("Compact written to {path} ({compact_kb:.1} KB, {ratio:.0}% smaller)");
        }
    }
}

fn app_matches(w: &cup_core::cup::WindowDescriptor, app_filter: Option<&str>) -> bool {
    match app_filter {
        Some(f) => w.title.to_lowercase().contains(&f.to_lowercase()),
        None => true,
    }
}

fn collect_stats(trees: &[cup_core::cup::CupNode], max_depth: usize) -> cup_core::cup::CaptureStats {
    let mut stats = cup_core::cup::CaptureStats { nodes: 0, max_depth, roles: Default::default() };
    fn walk(node: &cup_core::cup::CupNode, stats: &mut cup_core::cup::CaptureStats) {
        stats.nodes += 1;
        *stats.roles.entry(node.role.as_str().to_string()).or_insert(0) += 1;
        for child in &node.children {
            walk(child, stats);
        }
    }
    for root in trees {
        walk(root, &mut stats);
    }
    stats
}
