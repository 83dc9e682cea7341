//! Blob collage command.

use crate::CollageArgs;
use anyhow::{Context, Result};
use atmos_ops::collage::{collage, CollageOptions};
use tracing::info;

use super::{load_image, make_rng, save_image};

/// Runs the collage command.
pub fn run(args: CollageArgs) -> Result<()> {
    let source = load_image(&args.input)?;
    let opts = CollageOptions {
        blob_count: args.blobs,
        grain: args.grain,
        base: args.base,
        max_dimension: args.max_size,
    };
    info!(input = %args.input.display(), blobs = opts.blob_count, "Building collage");

    let mut rng = make_rng(args.seed);
    let output = collage(&source, &opts, &mut rng)
        .with_context(|| format!("Collage failed: {}", args.input.display()))?;
    save_image(&args.output, &output)
}
