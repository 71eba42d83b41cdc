use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape error: {0}")]
    ShapeError(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Incompatible shapes for operation {op}: {shape_a:?} and {shape_b:?}")]
    IncompatibleShapes {
        op: String,
        shape_a: Vec<usize>,
        shape_b: Vec<usize>,
    },

    #[error("Dimension mismatch: expected {0}, got {1}")]
    DimensionMismatch(usize, usize),

    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),

    #[error("Device mismatch for operation {op}: expected {expected:?}, got {actual:?}")]
    DeviceMismatch {
        op: String,
        expected: crate::Device,
        actual: crate::Device,
    },

    #[cfg(feature = "cuda")]
    #[error("CUDA error: {0}")]
    CudaError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Error during storage initialization")]
    InitializationError,

    #[error("Internal logic error: {0}")]
    InternalLogicError(String),
}

#[cfg(feature = "cuda")]
impl From<cust::error::CudaError> for Error {
    fn from(err: cust::error::CudaError) -> Self {
        Error::CudaError(err.to_string())
    }
}
