use crate::error::{Result, ScratchError};
use base64::Engine as _;
use std::path::Path;

/// An image ready to embed in a provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime: String,
    /// Standard base64, no line breaks.
    pub data: String,
}

impl ImagePayload {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Read and encode the image at `path`. The MIME type comes from the file
/// extension and must be `image/*`.
pub fn load(path: &Path) -> Result<ImagePayload> {
    let invalid = |reason: String| ScratchError::InvalidImage {
        path: path.display().to_string(),
        reason,
    };

    let mime = mime_guess::from_path(path)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .ok_or_else(|| invalid("not a recognized image type".to_string()))?;

    let bytes = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
    if bytes.is_empty() {
        return Err(invalid("file is empty".to_string()));
    }

    Ok(ImagePayload {
        mime: mime.essence_str().to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        let img = load(&path).unwrap();
        assert_eq!(img.mime, "image/png");
        assert_eq!(img.data, "iVBORw==");
        assert_eq!(img.data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn rejects_non_image_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ScratchError::InvalidImage { .. }));
    }

    #[test]
    fn missing_file_is_invalid_image() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("gone.jpg")).unwrap_err();
        assert!(matches!(err, ScratchError::InvalidImage { .. }));
    }
}
