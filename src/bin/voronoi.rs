use std::process::exit;

use log::info;

use voronoi_sweep::sites::parse_sites;
use voronoi_sweep::{compute_delaunay, compute_voronoi};

const USAGE: &str = "usage: voronoi [--voronoi] [--delaunay] [--animate] [-v|-vv] <site-file>";

fn main() {
    let mut want_voronoi = false;
    let mut want_delaunay = false;
    let mut animate = false;
    let mut verbosity = 1usize;
    let mut path: Option<String> = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--voronoi" => want_voronoi = true,
            "--delaunay" => want_delaunay = true,
            "--animate" => animate = true,
            "-v" => verbosity = 2,
            "-vv" => verbosity = 3,
            other if other.starts_with('-') => {
                eprintln!("ERROR: unknown flag {other}");
                eprintln!("{USAGE}");
                exit(1);
            }
            other => path = Some(other.to_string()),
        }
    }

    stderrlog::new()
        .modules([module_path!().to_string(), "voronoi_sweep".to_string()])
        .verbosity(verbosity)
        .init()
        .unwrap();

    let Some(path) = path else {
        eprintln!("{USAGE}");
        exit(1);
    };

    let sites = match parse_sites(&path) {
        Ok(sites) => sites,
        Err(err) => {
            eprintln!("ERROR: {err}");
            exit(1);
        }
    };
    for s in &sites {
        info!("{:?}", s);
    }

    if animate {
        eprintln!("animation lives in the viewer binary: cargo run --bin viewer -- {path}");
    }

    if !want_voronoi && !want_delaunay {
        want_voronoi = true;
    }

    let diagram = compute_voronoi(sites);
    info!(
        "V: {}, HE: {}, F: {}",
        diagram.dcel.num_vertices(),
        diagram.dcel.num_half_edges(),
        diagram.dcel.num_faces()
    );

    if want_voronoi {
        print!("{}", diagram.dcel.dump_voronoi());
    }
    if want_delaunay {
        let dual = compute_delaunay(&diagram);
        print!("{}", dual.dump_delaunay());
    }
}
