//! One-off asset tool: trims fully transparent borders from a PNG avatar
//! and overwrites the file in place.
//!
//! Usage: crop-avatar <path-to-png>

use anyhow::{bail, Context, Result};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: crop-avatar <path-to-png>")?;

    println!("Processing {path}...");
    let img = image::open(&path).with_context(|| format!("failed to open {path}"))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let Some((min_x, min_y, max_x, max_y)) = alpha_bounding_box(&rgba) else {
        println!("Image is fully transparent or empty. No crop needed.");
        return Ok(());
    };

    println!("Original Size: {width}x{height}");
    println!("Cropping to: ({min_x}, {min_y}) - ({max_x}, {max_y})");

    let cropped = image::imageops::crop_imm(&rgba, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
        .to_image();
    println!("New Size: {}x{}", cropped.width(), cropped.height());

    if cropped.width() == 0 || cropped.height() == 0 {
        bail!("crop produced an empty image, refusing to overwrite {path}");
    }

    cropped
        .save(&path)
        .with_context(|| format!("failed to overwrite {path}"))?;
    println!("Successfully cropped and overwritten.");
    Ok(())
}

/// Bounding box of pixels with non-zero alpha, or None if every pixel is
/// fully transparent.
fn alpha_bounding_box(img: &image::RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    bounds
}
