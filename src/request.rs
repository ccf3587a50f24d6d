use crate::types::{ActionType, ImageSource, UploadedFile};
use image::ImageFormat;

pub const FIELD_ACTION_TYPE: &str = "action_type";
pub const FIELD_IMAGE_FILE: &str = "image_file";
pub const FIELD_LABELED_IMAGE_NAME: &str = "labeled_image_name";

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum ValidationError {
    #[fail(display = "Harap unggah gambar atau pilih gambar terlabel.")]
    NoImageSource,
}

/// The image part of a submission. Exactly one is ever sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    ImageFile(UploadedFile),
    LabeledImage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub action: ActionType,
    pub payload: Payload,
}

pub fn build(action: ActionType, source: &ImageSource) -> Result<OutboundRequest, ValidationError> {
    let payload = match source {
        ImageSource::None => return Err(ValidationError::NoImageSource),
        ImageSource::Uploaded(file) => Payload::ImageFile(file.clone()),
        ImageSource::Labeled(path) => Payload::LabeledImage(path.clone()),
    };
    Ok(OutboundRequest { action, payload })
}

/// Content type for an uploaded image, sniffed from its leading bytes. The
/// backend only accepts JPEG, PNG and GIF; anything else goes out untyped
/// and is rejected server-side.
pub fn mime_type(file: &UploadedFile) -> &'static str {
    match image::guess_format(&file.bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => "application/octet-stream",
    }
}
