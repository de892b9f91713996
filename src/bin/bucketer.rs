//! Standalone k-means bucketer: clusters per-street equity/histogram
//! vectors into abstraction buckets (`spec.md`'s "Supporting tool" line,
//! `SPEC_FULL.md` §4.13). Output is a flat `gbd*num_hcp + hcp -> bucket`
//! table, little-endian `u32`s, matching the layout `crate::buckets`
//! expects to load.

use byteorder::{LittleEndian, WriteBytesExt};
use clap::Parser;
use robopoker_runtime::bucketer::{ElkanKMeans, Point};
use std::io::Write as _;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a flat binary file of f32 feature vectors, `num_points *
    /// dim` contiguous values.
    points_file: String,
    dim: usize,
    k: usize,
    output_file: String,

    #[arg(long, default_value_t = 100)]
    max_iters: usize,
    #[arg(long, default_value_t = 1e-4)]
    tolerance: f32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Worker threads for the rayon pool driving the assign phase
    /// (`SPEC_FULL.md` §5); defaults to all logical cores.
    #[arg(long)]
    threads: Option<usize>,
}

fn load_points(path: &str, dim: usize) -> anyhow::Result<Vec<Point>> {
    use byteorder::ReadBytesExt;
    let bytes = std::fs::read(path)?;
    let mut cursor = std::io::Cursor::new(bytes);
    let mut points = Vec::new();
    loop {
        let mut point = Vec::with_capacity(dim);
        let mut done = false;
        for _ in 0..dim {
            match cursor.read_f32::<LittleEndian>() {
                Ok(v) => point.push(v),
                Err(_) => {
                    done = true;
                    break;
                }
            }
        }
        if done {
            break;
        }
        points.push(point);
    }
    Ok(points)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let threads = args.threads.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .expect("global rayon pool can only be built once per process");

    let points = load_points(&args.points_file, args.dim)?;
    log::info!("loaded {} points of dim {}", points.len(), args.dim);

    let km = ElkanKMeans { k: args.k, max_iters: args.max_iters, tolerance: args.tolerance };
    let clustering = km.fit(&points, args.seed);
    log::info!("converged after {} iterations", clustering.iterations_run);

    let mut out = std::io::BufWriter::new(std::fs::File::create(&args.output_file)?);
    for &bucket in &clustering.assignments {
        out.write_u32::<LittleEndian>(bucket as u32)?;
    }
    out.flush()?;

    Ok(())
}
