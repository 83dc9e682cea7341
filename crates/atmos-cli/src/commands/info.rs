//! Image info command.

use crate::InfoArgs;
use anyhow::{Context, Result};
use std::fs;

/// Runs the info command, printing format and size of each input.
pub fn run(args: InfoArgs) -> Result<()> {
    for path in &args.input {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Failed to stat: {}", path.display()))?
            .len();
        let info = atmos_io::probe(path)
            .with_context(|| format!("Failed to load: {}", path.display()))?;

        println!("{}", path.display());
        println!("  Format:     {} ({})", info.format, info.format.mime_type());
        println!("  Resolution: {}x{}", info.width, info.height);
        println!("  Pixels:     {}", info.width as u64 * info.height as u64);
        println!("  Alpha:      {}", if info.opaque { "opaque" } else { "translucent" });
        println!("  File size:  {}", super::format_size(file_size));

        if args.input.len() > 1 {
            println!();
        }
    }

    Ok(())
}
