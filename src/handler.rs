//! Stateless upload handler: validate the request, then hand the clip to a
//! processing strategy and relay its result.
use log::{info, warn};

use crate::dsp::{VitalsError, VitalsPipeline};
use crate::types::{ClipRecording, ClipResult};

/// Uploads above this size are refused before any processing.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// An upload after transport decoding: declared metadata plus the per-frame
/// channel means extracted from the video.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub clip: Option<ClipRecording>,
}

/// Where clips get processed. The local pipeline is one strategy; a remote
/// service would be another.
pub trait ClipProcessor {
    fn process(&self, clip: &ClipRecording) -> Result<ClipResult, VitalsError>;
}

/// Runs the in-process pipeline.
#[derive(Clone, Debug, Default)]
pub struct LocalProcessor {
    pipeline: VitalsPipeline,
}

impl LocalProcessor {
    pub fn new(pipeline: VitalsPipeline) -> Self {
        Self { pipeline }
    }
}

impl ClipProcessor for LocalProcessor {
    fn process(&self, clip: &ClipRecording) -> Result<ClipResult, VitalsError> {
        Ok(self.pipeline.process(clip))
    }
}

pub struct ClipHandler<P: ClipProcessor> {
    processor: P,
    max_upload_bytes: u64,
}

impl<P: ClipProcessor> ClipHandler<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn handle(&self, request: &UploadRequest) -> Result<ClipResult, VitalsError> {
        let clip = self.validate(request).map_err(|e| {
            warn!("rejecting upload '{}': {e}", request.file_name);
            e
        })?;
        info!(
            "accepted upload '{}' ({} bytes)",
            request.file_name, request.size_bytes
        );
        self.processor.process(clip)
    }

    fn validate<'a>(&self, request: &'a UploadRequest) -> Result<&'a ClipRecording, VitalsError> {
        let clip = request
            .clip
            .as_ref()
            .ok_or_else(|| VitalsError::Upload("no video file was uploaded".into()))?;
        if !request.content_type.starts_with("video/") {
            return Err(VitalsError::Upload(format!(
                "invalid file type '{}', expected a video",
                request.content_type
            )));
        }
        if request.size_bytes > self.max_upload_bytes {
            return Err(VitalsError::Upload(format!(
                "file too large: {} bytes (limit {})",
                request.size_bytes, self.max_upload_bytes
            )));
        }
        Ok(clip)
    }
}
