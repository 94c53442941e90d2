use image::{DynamicImage, ImageFormat};

use crate::{error::TiffError, TiffFile};

impl TiffFile {
    /// Saves into memory and decodes the result as an image.
    pub fn to_image(&mut self) -> Result<DynamicImage, TiffError> {
        let bytes = self.to_bytes()?;
        Ok(image::load_from_memory_with_format(&bytes, ImageFormat::Tiff)?)
    }
}
