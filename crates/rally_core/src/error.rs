use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Court corners are collinear, coincident or non-finite, so no
    /// perspective transform exists.
    #[error("Invalid court calibration: {0}")]
    InvalidCalibration(String),

    #[error("No court calibration available for frame {frame_index}")]
    CalibrationUnavailable { frame_index: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed YAML or JSON config text.
    #[error("Config parse error ({format}): {message}")]
    ConfigParse { format: &'static str, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Fatal errors abort the pipeline; nothing downstream of a bad
    /// calibration is trustworthy.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::InvalidCalibration(_) => true,
            PipelineError::CalibrationUnavailable { .. } => true,
            PipelineError::InvalidConfig(_) => true,
            PipelineError::ConfigParse { .. } => false,
            PipelineError::Serialization(_) => false,
            PipelineError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_errors_are_fatal() {
        assert!(PipelineError::InvalidCalibration("collinear".to_string()).is_fatal());
        assert!(PipelineError::CalibrationUnavailable { frame_index: 3 }.is_fatal());
        let io = PipelineError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_fatal());
        let parse = PipelineError::ConfigParse { format: "json", message: "eof".to_string() };
        assert!(!parse.is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::CalibrationUnavailable { frame_index: 42 };
        assert_eq!(err.to_string(), "No court calibration available for frame 42");
    }
}
