// Example runner for the `waldo_search` library: indexes every decodable image in a
// directory, then prints the closest matches for a query image.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::warn;
use waldo_search::{Frame, PipelineConfig, RetrievalPipeline};

const DEFAULT_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // --- 1. Argument Parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: waldo_search <image_directory> <query_image> [limit]");
        return Ok(());
    }
    let directory = Path::new(&args[1]);
    let query_path = Path::new(&args[2]);
    let limit = match args.get(3) {
        Some(raw) => raw.parse().with_context(|| format!("invalid limit {raw:?}"))?,
        None => DEFAULT_LIMIT,
    };

    // --- 2. Index Construction ---
    let mut pipeline: RetrievalPipeline<PathBuf> = RetrievalPipeline::new(PipelineConfig::default())?;
    let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
        .with_context(|| format!("cannot read {}", directory.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    for path in paths {
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        if let Err(e) = pipeline.add_frame(path.clone(), &Frame::from(&image)) {
            warn!("skipping {}: {e}", path.display());
        }
    }
    println!("Indexed {} images from {}", pipeline.index().len(), directory.display());

    // --- 3. Query ---
    let query_image = image::open(query_path)
        .with_context(|| format!("cannot decode query {}", query_path.display()))?;
    let results = pipeline.query_parallel(&Frame::from(&query_image)).await?;

    for (rank, result) in results.iter().take(limit).enumerate() {
        println!("{:>3}. {:.6}  {}", rank + 1, result.distance, result.id.display());
    }
    Ok(())
}
