//! bvh-accel CLI - Build and inspect BVHs for `.obj` meshes.

use bvh_accel::prelude::*;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("BVH_ACCEL_BUILD_DATE");

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("bvh-accel");

    // Parse global flags
    let mut level = "info";
    let mut config: Option<&str> = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            "-c" | "--config" => match iter.next() {
                Some(p) => config = Some(p.as_str()),
                None => {
                    eprintln!("Usage: {} --config <settings.json> ...", prog);
                    std::process::exit(1);
                }
            },
            _ => filtered_args.push(arg),
        }
    }

    init_logging(level);

    if filtered_args.is_empty() {
        print_usage(prog);
        return;
    }

    let settings = load_settings(config);

    match filtered_args[0] {
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Usage: {} info <file.obj>", prog);
                std::process::exit(1);
            }
            cmd_info(filtered_args[1], &settings);
        }
        "dump" | "d" => {
            if filtered_args.len() < 2 {
                eprintln!("Usage: {} dump <file.obj>", prog);
                std::process::exit(1);
            }
            cmd_dump(filtered_args[1], &settings);
        }
        "version" | "-V" | "--version" => println!("bvh-accel {} ({})", VERSION, BUILD_DATE),
        "help" | "h" | "-h" | "--help" => print_usage(prog),
        _ => {
            // Assume it's a file path
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0], &settings);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                print_usage(prog);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage(prog: &str) {
    println!("bvh-accel {} - Build GPU BVHs for .obj meshes", VERSION);
    println!();
    println!("Usage: {} [options] <command> <file.obj>", prog);
    println!();
    println!("Commands:");
    println!("  i, info    Build and show tree statistics");
    println!("  d, dump    Build and print flattened nodes as JSON");
    println!("  version    Show version");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -c, --config <file>  Settings file (default: ${})", bvh_accel::settings::CONFIG_ENV);
    println!("  -v, --verbose        Debug output");
    println!("  -vv, --trace         Trace output (very verbose)");
    println!("  -q, --quiet          Errors only");
}

fn load_settings(config: Option<&str>) -> Settings {
    let Some(path) = config else {
        return Settings::load();
    };
    match Settings::from_file(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Load, build, pack. Exits the process on any failure.
fn build_scene(path: &str, settings: &Settings) -> (Vec<Triangle>, Bvh, SceneBuffers) {
    tracing::info!("Loading mesh: {}", path);

    let run = || -> Result<(Vec<Triangle>, Bvh, SceneBuffers)> {
        let mut tris = load_obj(path, &settings.load_options())?;
        let bvh = build_with(&mut tris, &settings.build_options())?;
        let buffers = bvh.pack(&tris, &settings.capacity())?;
        Ok((tris, bvh, buffers))
    };

    match run() {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to build BVH for {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &str, settings: &Settings) {
    let (tris, bvh, buffers) = build_scene(path, settings);
    let stats = bvh.stats();
    let bounds = bvh.root.bounds();

    println!("Mesh: {}", path);
    println!("Triangles: {}", tris.len());
    println!("Bounds: {:?} - {:?}", bounds.min, bounds.max);
    println!();
    println!("BVH (leaf threshold {}):", settings.build_options().leaf_threshold);
    println!("  Nodes:     {} ({} internal, {} leaves)", stats.nodes, stats.internal, stats.leaves);
    println!("  Depth:     {}", stats.max_depth);
    println!("  Leaf size: max {}, avg {:.2}", stats.max_leaf_size, stats.avg_leaf_size);
    println!();
    println!("Upload:");
    println!(
        "  Nodes:     {} bytes ({}/{})",
        buffers.nodes_bytes().len(),
        buffers.node_count,
        settings.max_nodes
    );
    println!(
        "  Triangles: {} bytes ({}/{})",
        buffers.triangles_bytes().len(),
        buffers.tri_count,
        settings.max_triangles
    );
}

fn cmd_dump(path: &str, settings: &Settings) {
    let (_, bvh, buffers) = build_scene(path, settings);

    let nodes: Vec<serde_json::Value> = buffers
        .nodes
        .iter()
        .map(|n| {
            serde_json::json!({
                "left": n.left,
                "count": n.count,
                "aabb_min": n.aabb_min,
                "aabb_max": n.aabb_max,
            })
        })
        .collect();
    let doc = serde_json::json!({
        "node_count": buffers.node_count,
        "tri_count": buffers.tri_count,
        "stats": bvh.stats(),
        "nodes": nodes,
    });

    match serde_json::to_string_pretty(&doc) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Failed to serialize: {}", e);
            std::process::exit(1);
        }
    }
}
