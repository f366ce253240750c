use crate::error::FileValidationError;

/// Outcome of one inspection stage. A stage either fully passes or stops the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionVerdict {
    Safe,
    Unsafe(FileValidationError),
}

impl InspectionVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, InspectionVerdict::Safe)
    }

    pub fn into_result(self) -> Result<(), FileValidationError> {
        match self {
            InspectionVerdict::Safe => Ok(()),
            InspectionVerdict::Unsafe(err) => Err(err),
        }
    }
}

impl From<Result<(), FileValidationError>> for InspectionVerdict {
    fn from(result: Result<(), FileValidationError>) -> Self {
        match result {
            Ok(()) => InspectionVerdict::Safe,
            Err(err) => InspectionVerdict::Unsafe(err),
        }
    }
}
