use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageResult};

use crate::processor::{FitMode, Rendition, RenditionSpec, Renditions};

/// Produces all renditions from a single source image.
///
/// The source is decoded once, each rendition is then resized and re-encoded
/// on the rayon pool concurrently. Fails if the source bytes are not a
/// decodable raster image or if any encode fails, in which case nothing is
/// returned at all.
pub fn process_renditions(data: &[u8]) -> ImageResult<Renditions<Bytes>> {
    let original_image = Arc::new(image::load_from_memory(data)?);

    let (tx, rx) = crossbeam::channel::bounded(Rendition::ALL.len());
    for rendition in Rendition::ALL {
        let local_tx = tx.clone();
        let local = original_image.clone();
        rayon::spawn(move || {
            let result = render(rendition.spec(), &local);
            local_tx
                .send((rendition, result))
                .expect("Failed to respond to processing request. Receiver already closed.");
        });
    }

    // Needed to prevent deadlock.
    drop(tx);

    let mut produced = Vec::with_capacity(Rendition::ALL.len());
    while let Ok(rendered) = rx.recv() {
        produced.push(rendered);
    }

    let mut finished = Renditions::from_fn(|_| Bytes::new());
    for (rendition, result) in produced {
        finished.set(rendition, result?);
    }

    Ok(finished)
}

fn render(spec: RenditionSpec, img: &DynamicImage) -> ImageResult<Bytes> {
    let resized = match spec.fit {
        FitMode::Cover => img.resize_to_fill(spec.width, spec.height, FilterType::Lanczos3),
        FitMode::Inside => {
            let (width, height) = img.dimensions();
            if width <= spec.width && height <= spec.height {
                img.clone()
            } else {
                img.resize(spec.width, spec.height, FilterType::Lanczos3)
            }
        },
    };

    encode_jpeg(&resized, spec.quality)
}

#[inline]
fn encode_jpeg(img: &DynamicImage, quality: u8) -> ImageResult<Bytes> {
    // JPEG has no alpha channel, flatten before encoding.
    let rgb = img.to_rgb8();

    let mut buff = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buff, quality);
    encoder.encode_image(&rgb)?;

    Ok(Bytes::from(buff.into_inner()))
}
