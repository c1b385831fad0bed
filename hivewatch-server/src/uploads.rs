//! Upload handling for report images
//!
//! Multipart files land in `uploads/user_uploads/`, base64 camera
//! captures in `uploads/camera/`. Stored reports carry the served
//! `/uploads/...` path; the directory tree is exposed read-only by
//! the static file service.

use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hivewatch_common::{Error, Result};
use std::path::{Path, PathBuf};

const USER_UPLOADS_DIR: &str = "user_uploads";
const CAMERA_DIR: &str = "camera";

pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create the upload tree under `root` (typically `<data>/uploads`).
    pub fn new(root: PathBuf) -> Result<Self> {
        for dir in [USER_UPLOADS_DIR, CAMERA_DIR] {
            std::fs::create_dir_all(root.join(dir))?;
        }
        Ok(UploadStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded file, keeping the original extension when
    /// present and sniffing the content otherwise. Returns the served
    /// path.
    pub fn save_upload(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::Validation("Empty image upload".to_string()));
        }
        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .map(str::to_string)
            .or_else(|| infer::get(bytes).map(|kind| kind.extension().to_string()))
            .unwrap_or_else(|| "bin".to_string());
        let filename = format!("{}.{}", Utc::now().timestamp_millis(), ext);
        std::fs::write(self.root.join(USER_UPLOADS_DIR).join(&filename), bytes)?;
        Ok(format!("/uploads/{}/{}", USER_UPLOADS_DIR, filename))
    }

    /// Persist a base64 camera capture as JPEG. Returns the served
    /// path.
    pub fn save_capture(&self, data_url: &str) -> Result<String> {
        let bytes = decode_data_url(data_url)?;
        let filename = format!("capture-{}.jpg", Utc::now().timestamp_millis());
        std::fs::write(self.root.join(CAMERA_DIR).join(&filename), bytes)?;
        Ok(format!("/uploads/{}/{}", CAMERA_DIR, filename))
    }
}

/// Decode a `data:image/...;base64,...` payload (or bare base64) into
/// raw image bytes.
pub fn decode_data_url(data: &str) -> Result<Vec<u8>> {
    let encoded = match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Validation(format!("Invalid base64 image data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 px JPEG-ish payload; content only needs to round-trip
    const SAMPLE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn data_url_prefix_is_stripped() {
        let encoded = general_purpose::STANDARD.encode(SAMPLE);
        let url = format!("data:image/jpeg;base64,{}", encoded);
        assert_eq!(decode_data_url(&url).unwrap(), SAMPLE);
        // Bare base64 is accepted too
        assert_eq!(decode_data_url(&encoded).unwrap(), SAMPLE);
    }

    #[test]
    fn invalid_base64_is_validation_error() {
        let err = decode_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn upload_keeps_extension_and_capture_is_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf()).unwrap();

        let served = store.save_upload(Some("colony.png"), SAMPLE).unwrap();
        assert!(served.starts_with("/uploads/user_uploads/"));
        assert!(served.ends_with(".png"));

        let encoded = general_purpose::STANDARD.encode(SAMPLE);
        let served = store
            .save_capture(&format!("data:image/jpeg;base64,{}", encoded))
            .unwrap();
        assert!(served.starts_with("/uploads/camera/capture-"));
        assert!(served.ends_with(".jpg"));
    }

    #[test]
    fn empty_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            store.save_upload(Some("x.jpg"), &[]),
            Err(Error::Validation(_))
        ));
    }
}
