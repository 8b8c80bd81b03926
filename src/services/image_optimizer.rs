// src/services/image_optimizer.rs

use image::{codecs::jpeg::JpegEncoder, ColorType, DynamicImage, GenericImageView, Rgb, RgbImage};

pub const MAX_DIMENSION: u32 = 1920;
pub const MAX_BYTES: usize = 2 * 1024 * 1024;

const START_QUALITY: u8 = 85;
const MIN_QUALITY: u8 = 60;
const QUALITY_STEP: u8 = 5;

/// Reduz uma imagem de tecido/modelo antes de gravá-la: RGB sobre fundo
/// branco, no máximo 1920x1920, JPEG com qualidade decrescente (85 a 60)
/// até caber em 2 MB. `None` se os bytes não forem uma imagem legível.
pub fn optimize_image(bytes: &[u8]) -> Option<Vec<u8>> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("image illisible, conservée telle quelle: {e}");
            return None;
        }
    };

    let img = match img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        true => img.thumbnail(MAX_DIMENSION, MAX_DIMENSION),
        false => img,
    };
    let rgb = flatten(&img);

    let mut quality = START_QUALITY;
    loop {
        let encoded = encode_jpeg(&rgb, quality)?;
        if encoded.len() <= MAX_BYTES || quality <= MIN_QUALITY {
            tracing::debug!(
                avant = bytes.len(),
                apres = encoded.len(),
                qualite = quality,
                "image optimisée"
            );
            return Some(encoded);
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    }
}

// Transparência vira branco
fn flatten(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    match encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8) {
        Ok(()) => Some(out),
        Err(e) => {
            tracing::warn!("échec de l'encodage JPEG: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, ImageOutputFormat, Rgba, RgbaImage};

    fn png(img: DynamicImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out
    }

    #[test]
    fn oversized_image_is_shrunk_to_jpeg() {
        let big = RgbImage::from_fn(3000, 1500, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let optimized = optimize_image(&png(DynamicImage::ImageRgb8(big))).unwrap();

        assert_eq!(image::guess_format(&optimized).unwrap(), ImageFormat::Jpeg);
        assert!(optimized.len() <= MAX_BYTES);
        let decoded = image::load_from_memory(&optimized).unwrap();
        assert_eq!(decoded.dimensions(), (1920, 960));
    }

    #[test]
    fn small_image_keeps_its_size() {
        let small = RgbImage::from_pixel(200, 100, Rgb([10, 20, 30]));
        let optimized = optimize_image(&png(DynamicImage::ImageRgb8(small))).unwrap();
        assert_eq!(image::load_from_memory(&optimized).unwrap().dimensions(), (200, 100));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let clear = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let rgb = flatten(&DynamicImage::ImageRgba8(clear));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn unreadable_bytes_are_left_alone() {
        assert!(optimize_image(b"pas une image").is_none());
    }
}
