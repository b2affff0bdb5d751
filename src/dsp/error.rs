use thiserror::Error;
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("channel length mismatch: red has {red} samples, green has {green}")]
    ChannelMismatch { red: usize, green: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed input at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("upload rejected: {0}")]
    Upload(String),
    #[error("frame {index} is {actual:?}, expected {expected:?}")]
    FrameSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("failed to load image: {0}")]
    Image(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for VitalsError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        VitalsError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for VitalsError {
    fn from(value: image::ImageError) -> Self {
        VitalsError::Image(value.to_string())
    }
}
