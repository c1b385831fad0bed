//! Media capture: image acquisition and geolocation
//!
//! Produces exactly one image per submission, from a file pick or a
//! live camera frame, and requests a location fix the moment an image
//! is acquired so a reporter never has to remember to grant location
//! access separately. A failed fix degrades to a fixed fallback
//! coordinate instead of blocking submission.

use async_trait::async_trait;
use hivewatch_common::models::Gps;
use hivewatch_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Coordinate used when the device cannot produce a fix
pub const FALLBACK_POSITION: Gps = Gps {
    lat: 12.9716,
    long: 77.5946,
};

/// One image ready for submission
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Picked from the device's files
    File(PathBuf),
    /// Frame captured live from a camera, JPEG-encoded
    Frame(Vec<u8>),
}

impl ImageSource {
    /// Encoded bytes for verification and upload
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::File(path) => std::fs::read(path).map_err(|e| {
                Error::Validation(format!("Cannot read image {}: {}", path.display(), e))
            }),
            ImageSource::Frame(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn file_name(&self) -> Option<String> {
        match self {
            ImageSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            ImageSource::Frame(_) => None,
        }
    }
}

/// Device geolocation source
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Gps>;
}

#[async_trait]
impl LocationProvider for Box<dyn LocationProvider> {
    async fn current_position(&self) -> Result<Gps> {
        self.as_ref().current_position().await
    }
}

/// Known coordinate, e.g. supplied on the command line
pub struct FixedLocation(pub Gps);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Gps> {
        Ok(self.0)
    }
}

/// No positioning hardware available
pub struct NoFix;

#[async_trait]
impl LocationProvider for NoFix {
    async fn current_position(&self) -> Result<Gps> {
        Err(Error::Unavailable("No positioning source".to_string()))
    }
}

/// Wraps a provider so a denied or failed fix degrades to the fixed
/// fallback coordinate. GPS failure is non-fatal for the workflow.
pub struct FallbackLocation<P>(pub P);

#[async_trait]
impl<P: LocationProvider> LocationProvider for FallbackLocation<P> {
    async fn current_position(&self) -> Result<Gps> {
        match self.0.current_position().await {
            Ok(gps) => Ok(gps),
            Err(e) => {
                warn!("GPS unavailable ({}), using fallback coordinate", e);
                Ok(FALLBACK_POSITION)
            }
        }
    }
}

/// Which device camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn opposite(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// Camera device abstraction. Platform shells implement this over the
/// real hardware stream.
#[async_trait]
pub trait Camera: Send {
    async fn open(&mut self, facing: Facing) -> Result<()>;
    async fn grab_frame(&mut self) -> Result<Vec<u8>>;
    fn release(&mut self);
}

/// Open camera session.
///
/// The underlying stream is released on every exit path: explicit
/// close, successful capture, and drop. Switching facing releases the
/// current stream before reopening.
pub struct CameraSession<C: Camera> {
    camera: C,
    facing: Facing,
    open: bool,
}

impl<C: Camera> CameraSession<C> {
    pub async fn start(mut camera: C, facing: Facing) -> Result<Self> {
        camera.open(facing).await?;
        Ok(CameraSession {
            camera,
            facing,
            open: true,
        })
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Swap front/back cameras
    pub async fn switch_facing(&mut self) -> Result<()> {
        self.camera.release();
        self.open = false;
        let next = self.facing.opposite();
        self.camera.open(next).await?;
        self.facing = next;
        self.open = true;
        Ok(())
    }

    /// Capture one frame and close the camera
    pub async fn capture(mut self) -> Result<Vec<u8>> {
        let frame = self.camera.grab_frame().await?;
        self.close_stream();
        Ok(frame)
    }

    /// Cancel without capturing
    pub fn close(mut self) {
        self.close_stream();
    }

    fn close_stream(&mut self) {
        if self.open {
            self.camera.release();
            self.open = false;
        }
    }
}

impl<C: Camera> Drop for CameraSession<C> {
    fn drop(&mut self) {
        self.close_stream();
    }
}

/// Capture pipeline tying image acquisition to an immediate location
/// fix, for both the upload and the camera path.
pub struct MediaCapture<L: LocationProvider> {
    location: L,
}

impl<L: LocationProvider> MediaCapture<L> {
    pub fn new(location: L) -> Self {
        MediaCapture { location }
    }

    /// File-upload path
    pub async fn from_file(&self, path: &Path) -> Result<(ImageSource, Gps)> {
        if !path.exists() {
            return Err(Error::Validation(format!(
                "Image file not found: {}",
                path.display()
            )));
        }
        let gps = self.location.current_position().await?;
        Ok((ImageSource::File(path.to_path_buf()), gps))
    }

    /// Live-camera path; the device is released once the frame is
    /// taken.
    pub async fn from_camera<C: Camera>(
        &self,
        camera: C,
        facing: Facing,
    ) -> Result<(ImageSource, Gps)> {
        let session = CameraSession::start(camera, facing).await?;
        let frame = session.capture().await?;
        let gps = self.location.current_position().await?;
        Ok((ImageSource::Frame(frame), gps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeCameraState {
        opens: AtomicUsize,
        releases: AtomicUsize,
    }

    struct FakeCamera {
        state: Arc<FakeCameraState>,
        fail_grab: bool,
    }

    #[async_trait]
    impl Camera for FakeCamera {
        async fn open(&mut self, _facing: Facing) -> Result<()> {
            self.state.opens.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn grab_frame(&mut self) -> Result<Vec<u8>> {
            if self.fail_grab {
                Err(Error::Unavailable("camera fault".to_string()))
            } else {
                Ok(vec![0xFF, 0xD8])
            }
        }

        fn release(&mut self) {
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn capture_releases_the_stream() {
        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state: state.clone(),
            fail_grab: false,
        };
        let session = CameraSession::start(camera, Facing::Back).await.unwrap();
        let frame = session.capture().await.unwrap();
        assert!(!frame.is_empty());
        assert_eq!(state.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_and_drop_release_exactly_once() {
        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state: state.clone(),
            fail_grab: false,
        };
        let session = CameraSession::start(camera, Facing::Back).await.unwrap();
        session.close();
        assert_eq!(state.releases.load(Ordering::SeqCst), 1);

        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state: state.clone(),
            fail_grab: false,
        };
        {
            let _session = CameraSession::start(camera, Facing::Back).await.unwrap();
            // dropped without capture
        }
        assert_eq!(state.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_grab_still_releases() {
        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state: state.clone(),
            fail_grab: true,
        };
        let session = CameraSession::start(camera, Facing::Back).await.unwrap();
        assert!(session.capture().await.is_err());
        assert_eq!(state.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn switch_facing_reopens_opposite_camera() {
        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state: state.clone(),
            fail_grab: false,
        };
        let mut session = CameraSession::start(camera, Facing::Back).await.unwrap();
        session.switch_facing().await.unwrap();
        assert_eq!(session.facing(), Facing::Front);
        assert_eq!(state.opens.load(Ordering::SeqCst), 2);
        assert_eq!(state.releases.load(Ordering::SeqCst), 1);
        session.close();
        assert_eq!(state.releases.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn denied_gps_degrades_to_fallback() {
        let provider = FallbackLocation(NoFix);
        let gps = provider.current_position().await.unwrap();
        assert_eq!(gps, FALLBACK_POSITION);
    }

    #[tokio::test]
    async fn camera_capture_triggers_location_fix() {
        let state = Arc::new(FakeCameraState::default());
        let camera = FakeCamera {
            state,
            fail_grab: false,
        };
        let capture = MediaCapture::new(FallbackLocation(NoFix));
        let (image, gps) = capture.from_camera(camera, Facing::Back).await.unwrap();
        assert!(matches!(image, ImageSource::Frame(_)));
        assert_eq!(gps, FALLBACK_POSITION);
    }

    #[tokio::test]
    async fn file_capture_triggers_location_fix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colony.jpg");
        std::fs::write(&path, [0xFFu8, 0xD8]).unwrap();

        let capture = MediaCapture::new(FixedLocation(Gps {
            lat: 13.0,
            long: 77.6,
        }));
        let (image, gps) = capture.from_file(&path).await.unwrap();
        assert_eq!(image.file_name().as_deref(), Some("colony.jpg"));
        assert_eq!(gps.lat, 13.0);

        let missing = capture.from_file(&dir.path().join("absent.jpg")).await;
        assert!(matches!(missing, Err(Error::Validation(_))));
    }
}
