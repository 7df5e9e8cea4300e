//! Capture source: camera ownership, frame grabbing, and JPEG encoding.
//!
//! The hardware-facing half wraps `nokhwa`; the pure half (mirroring and
//! encoding) is split out so it can be tested without a camera attached.

use image::{codecs::jpeg::JpegEncoder, RgbImage};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
    Camera, NokhwaError,
};
use shared::domain::{CameraPreferences, EncodedFrame, PreviewFrame, FRAME_MIME_JPEG};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open camera {index}: {source}")]
    Open { index: u32, source: NokhwaError },
    #[error("failed to start camera stream: {0}")]
    Stream(NokhwaError),
    #[error("camera enumeration failed: {0}")]
    Enumerate(NokhwaError),
    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Contract between the interaction controller and whatever owns the camera.
///
/// `disable` must be idempotent and safe to call on a source that was never
/// enabled; implementations release hardware on every exit path.
pub trait FrameSource {
    fn enable(&mut self) -> Result<(), CaptureError>;
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;

    /// Grab the current frame, mirrored and JPEG-encoded. `None` when the
    /// source is not enabled or no frame is ready yet.
    fn capture_frame(&mut self) -> Option<EncodedFrame>;

    /// Current frame as mirrored RGBA for the live preview texture.
    fn preview_frame(&mut self) -> Option<PreviewFrame>;
}

/// A camera visible to the local backend, for `--list-cameras`.
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    pub index: String,
    pub name: String,
    pub description: String,
}

pub fn enumerate_cameras() -> Result<Vec<CameraDescriptor>, CaptureError> {
    let infos = nokhwa::query(ApiBackend::Auto).map_err(CaptureError::Enumerate)?;
    Ok(infos
        .into_iter()
        .map(|info| CameraDescriptor {
            index: info.index().to_string(),
            name: info.human_name(),
            description: info.description().to_string(),
        })
        .collect())
}

/// The live camera. Owns the device exclusively between `enable` and
/// `disable`; dropping the source releases it as well.
pub struct CameraSource {
    prefs: CameraPreferences,
    camera: Option<Camera>,
}

impl CameraSource {
    pub fn new(prefs: CameraPreferences) -> Self {
        Self {
            prefs,
            camera: None,
        }
    }

    fn grab_rgb(&mut self) -> Option<RgbImage> {
        let camera = self.camera.as_mut()?;
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(err) => {
                warn!("camera frame grab failed: {err}");
                return None;
            }
        };
        match buffer.decode_image::<RgbFormat>() {
            Ok(rgb) => Some(rgb),
            Err(err) => {
                warn!("camera frame decode failed: {err}");
                None
            }
        }
    }
}

impl FrameSource for CameraSource {
    fn enable(&mut self) -> Result<(), CaptureError> {
        if self.camera.is_some() {
            return Ok(());
        }

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(self.prefs.capture_width, self.prefs.capture_height),
                FrameFormat::MJPEG,
                30,
            ),
        ));
        let mut camera = Camera::new(CameraIndex::Index(self.prefs.camera_index), requested)
            .map_err(|source| CaptureError::Open {
                index: self.prefs.camera_index,
                source,
            })?;
        camera.open_stream().map_err(CaptureError::Stream)?;

        let format = camera.camera_format();
        info!(
            camera_index = self.prefs.camera_index,
            negotiated = %format,
            "camera stream opened"
        );
        self.camera = Some(camera);
        Ok(())
    }

    fn disable(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(err) = camera.stop_stream() {
                warn!("camera stream stop failed: {err}");
            }
            debug!("camera released");
        }
    }

    fn is_enabled(&self) -> bool {
        self.camera.is_some()
    }

    fn capture_frame(&mut self) -> Option<EncodedFrame> {
        let rgb = self.grab_rgb()?;
        match encode_mirrored_jpeg(&rgb, self.prefs.jpeg_quality) {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!("capture encoding failed: {err}");
                None
            }
        }
    }

    fn preview_frame(&mut self) -> Option<PreviewFrame> {
        self.grab_rgb().map(|rgb| mirrored_preview(&rgb))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Mirror horizontally and encode as JPEG at the given quality.
pub fn encode_mirrored_jpeg(rgb: &RgbImage, quality: u8) -> Result<EncodedFrame, CaptureError> {
    let mirrored = image::imageops::flip_horizontal(rgb);
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(&mirrored)?;
    Ok(EncodedFrame {
        bytes,
        mime_type: FRAME_MIME_JPEG,
        width: mirrored.width(),
        height: mirrored.height(),
    })
}

/// Mirror horizontally and expand to RGBA for the preview texture.
pub fn mirrored_preview(rgb: &RgbImage) -> PreviewFrame {
    let mirrored = image::imageops::flip_horizontal(rgb);
    let (width, height) = mirrored.dimensions();
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for pixel in mirrored.pixels() {
        rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
    }
    PreviewFrame {
        width: width as usize,
        height: height as usize,
        rgba,
    }
}
