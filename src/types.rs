use bytes::Bytes;
use std::fmt;

/// Rendered in place of any value the backend did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    In,
    Out,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::In => "in",
            ActionType::Out => "out",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image picked from disk, read in full at selection time.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    None,
    Uploaded(UploadedFile),
    Labeled(String),
}

/// One entry of the backend's labeled image catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    /// Relative path, e.g. `choosenCar/car1.jpg`. Sent back as `labeled_image_name`.
    pub path: String,
    pub label: String,
}

impl LabeledImage {
    pub fn new(path: String) -> LabeledImage {
        let label = path.rsplit('/').next().unwrap_or(&path).to_string();
        LabeledImage { path, label }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_image_label_is_file_name() {
        let image = LabeledImage::new("choosenCar/car1.jpg".to_string());
        assert_eq!(image.label, "car1.jpg");
        assert_eq!(image.path, "choosenCar/car1.jpg");

        let flat = LabeledImage::new("car2.jpg".to_string());
        assert_eq!(flat.label, "car2.jpg");
    }
}
