use crate::types::{ImageSource, UploadedFile};
use log::debug;

/// Option value of the labeled image picker meaning "nothing chosen".
pub const NO_LABELED_IMAGE: &str = "none";

const UPLOAD_PROMPT: &str = "Pilih File Gambar Baru...";
const UPLOAD_PROMPT_LABELED: &str = "Pilih File Gambar Baru... (Gambar terlabel dipilih)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Hidden,
    /// Local preview of an uploaded file, by file name.
    File(String),
    /// Server-relative URL of a labeled image.
    Url(String),
}

/// What the image picker area shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorView {
    pub preview: Preview,
    pub upload_label: String,
    pub labeled_choice: String,
}

/// Holds the single active image source. Choosing one kind of source always
/// discards the other.
#[derive(Debug, Clone)]
pub struct ImageSourceSelector {
    source: ImageSource,
}

impl Default for ImageSourceSelector {
    fn default() -> Self {
        ImageSourceSelector {
            source: ImageSource::None,
        }
    }
}

impl ImageSourceSelector {
    pub fn select_upload(&mut self, file: UploadedFile) {
        debug!("Selected upload {:?}", file);
        self.source = ImageSource::Uploaded(file);
    }

    pub fn select_labeled(&mut self, path: &str) {
        if path == NO_LABELED_IMAGE {
            self.clear();
            return;
        }
        debug!("Selected labeled image {}", path);
        self.source = ImageSource::Labeled(path.to_string());
    }

    pub fn clear(&mut self) {
        self.source = ImageSource::None;
    }

    pub fn current(&self) -> &ImageSource {
        &self.source
    }

    pub fn view(&self) -> SelectorView {
        match &self.source {
            ImageSource::None => SelectorView {
                preview: Preview::Hidden,
                upload_label: UPLOAD_PROMPT.to_string(),
                labeled_choice: NO_LABELED_IMAGE.to_string(),
            },
            ImageSource::Uploaded(file) => SelectorView {
                preview: Preview::File(file.name.clone()),
                upload_label: file.name.clone(),
                labeled_choice: NO_LABELED_IMAGE.to_string(),
            },
            ImageSource::Labeled(path) => SelectorView {
                preview: Preview::Url(format!("/{}", path)),
                upload_label: UPLOAD_PROMPT_LABELED.to_string(),
                labeled_choice: path.clone(),
            },
        }
    }
}
