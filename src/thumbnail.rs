use image::ImageReader;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub format: String,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.format, self.width, self.height)
    }
}

/// Sniff format and pixel size from the header without decoding the whole image.
pub fn probe(bytes: &[u8]) -> Option<ImageSummary> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    let format = reader.format()?;
    let (width, height) = reader.into_dimensions().ok()?;

    let name = format
        .extensions_str()
        .first()
        .map(|ext| ext.to_uppercase())
        .unwrap_or_else(|| format!("{:?}", format).to_uppercase());

    Some(ImageSummary { format: name, width, height })
}
