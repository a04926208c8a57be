//! Image codec: upload decoding and PNG re-encoding for transport to the model.

use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub const PNG_MIME_TYPE: &str = "image/png";

/// Lossless PNG bytes of a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl EncodedImage {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Decodes an uploaded file. Only JPEG and PNG are accepted, checked against
/// the file extension when a name is known and against the content always.
pub fn decode_upload(bytes: &[u8], file_name: Option<&str>) -> Result<DynamicImage> {
    if let Some(name) = file_name {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::UnsupportedFormat(name.to_string()));
        }
    }

    if bytes.is_empty() {
        return Err(Error::image_decode("uploaded file is empty"));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| Error::image_decode(format!("unrecognised image data: {e}")))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| Error::image_decode(e.to_string()))?;

    debug!(
        "Decoded {:?} upload ({}x{})",
        format,
        decoded.width(),
        decoded.height()
    );
    Ok(decoded)
}

/// Encodes the image as PNG. Pure: the same image always yields the same bytes.
pub fn encode_png(image: &DynamicImage) -> Result<EncodedImage> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| Error::image_encode(e.to_string()))?;

    Ok(EncodedImage {
        bytes: buffer.into_inner(),
        mime_type: PNG_MIME_TYPE,
    })
}
