//! Lossy re-encoding of uploaded images.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView as _, codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::Result;

pub const JPEG_QUALITY: u8 = 70;

/// Longest edge, in pixels, of a stored image.
pub const MAX_EDGE: u32 = 2560;

/// Decode `bytes` in any supported format and re-encode as a JPEG, shrinking
/// the image first if either edge exceeds [`MAX_EDGE`].
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
  let img = image::load_from_memory(bytes)?;

  let (width, height) = img.dimensions();
  let img = if width > MAX_EDGE || height > MAX_EDGE {
    img.resize(MAX_EDGE, MAX_EDGE, FilterType::Triangle)
  } else {
    img
  };

  // JPEG has no alpha channel.
  let img = DynamicImage::ImageRgb8(img.to_rgb8());

  let mut buf = Cursor::new(Vec::new());
  let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
  img.write_with_encoder(encoder)?;
  Ok(buf.into_inner())
}

/// [`compress`] on the blocking thread pool.
pub async fn compress_in_background(bytes: Vec<u8>) -> Result<Vec<u8>> {
  tokio::task::spawn_blocking(move || compress(&bytes)).await?
}

#[cfg(test)]
mod tests {
  use image::{ImageBuffer, ImageFormat, Rgba};

  use super::*;

  fn png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
      Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
      .write_to(&mut buf, ImageFormat::Png)
      .unwrap();
    buf.into_inner()
  }

  #[test]
  fn output_is_a_decodable_jpeg() {
    let out = compress(&png(64, 48)).unwrap();
    assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);

    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!(decoded.dimensions(), (64, 48));
  }

  #[test]
  fn oversized_images_are_shrunk_to_max_edge() {
    let out = compress(&png(2600, 1300)).unwrap();
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!(decoded.dimensions(), (2560, 1280));
  }

  #[test]
  fn garbage_is_rejected() {
    assert!(matches!(
      compress(b"definitely not an image"),
      Err(crate::Error::Image(_))
    ));
  }

  #[tokio::test]
  async fn background_compression_matches() {
    let out = compress_in_background(png(10, 10)).await.unwrap();
    assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
  }
}
