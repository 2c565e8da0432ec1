//! Processing directives sent as multipart text fields.

use crate::format::ImageFormat;
use crate::multipart::FormField;

/// Field names of the recognized directives.
pub mod fields {
    pub const QUALITY: &str = "quality";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const FORMAT: &str = "format";
    pub const PRESERVE_METADATA: &str = "preserveMetadata";
}

/// Instructions telling the service how to transform an image.
///
/// Unset directives are not sent. [`into_fields`](Self::into_fields) renders
/// them in a fixed order: quality, width, height, format, preserveMetadata.
///
/// # Example
///
/// ```
/// use shrinkix_client::{Directives, ImageFormat};
///
/// let fields = Directives::new()
///     .width(100)
///     .format(ImageFormat::Webp)
///     .into_fields();
///
/// assert_eq!(fields[0].name, "width");
/// assert_eq!(fields[0].value, "100");
/// assert_eq!(fields[1].value, "webp");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directives {
    quality: Option<u8>,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<ImageFormat>,
    preserve_metadata: Option<bool>,
}

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output quality, clamped to 1..=100.
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.clamp(1, 100));
        self
    }

    /// Target pixel width.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Target pixel height.
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Target output format.
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Ask the service to keep (or strip) image metadata.
    pub fn preserve_metadata(mut self, preserve: bool) -> Self {
        self.preserve_metadata = Some(preserve);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn into_fields(self) -> Vec<FormField> {
        let mut out = Vec::new();
        if let Some(quality) = self.quality {
            out.push(FormField::new(fields::QUALITY, quality.to_string()));
        }
        if let Some(width) = self.width {
            out.push(FormField::new(fields::WIDTH, width.to_string()));
        }
        if let Some(height) = self.height {
            out.push(FormField::new(fields::HEIGHT, height.to_string()));
        }
        if let Some(format) = self.format {
            out.push(FormField::new(fields::FORMAT, format.as_str()));
        }
        if let Some(preserve) = self.preserve_metadata {
            out.push(FormField::new(fields::PRESERVE_METADATA, preserve.to_string()));
        }
        out
    }
}

impl From<Directives> for Vec<FormField> {
    fn from(directives: Directives) -> Self {
        directives.into_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directives_send_nothing() {
        assert!(Directives::new().is_empty());
        assert!(Directives::new().into_fields().is_empty());
    }

    #[test]
    fn test_field_order_and_text() {
        let fields = Directives::new()
            .preserve_metadata(true)
            .format(ImageFormat::Jpeg)
            .height(50)
            .width(100)
            .quality(80)
            .into_fields();

        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("quality", "80"),
                ("width", "100"),
                ("height", "50"),
                ("format", "jpg"),
                ("preserveMetadata", "true"),
            ]
        );
    }

    #[test]
    fn test_quality_is_clamped() {
        let fields = Directives::new().quality(0).into_fields();
        assert_eq!(fields[0].value, "1");
        let fields = Directives::new().quality(255).into_fields();
        assert_eq!(fields[0].value, "100");
    }

    #[test]
    fn test_preserve_metadata_false_is_sent() {
        let fields: Vec<FormField> = Directives::new().preserve_metadata(false).into();
        assert_eq!(fields, vec![FormField::new("preserveMetadata", "false")]);
    }
}
