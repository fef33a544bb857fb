use std::{error, fmt, io};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainstorm.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    SampleError(String),
    ParameterError(String),
    OutputError(Box<dyn error::Error + Send + Sync>),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleError(str) => write!(f, "Invalid sample: {str}"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::OutputError(err) => err.fmt(f),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

#[cfg(feature = "wav-output")]
impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Error {
        match err {
            hound::Error::IoError(err) => Error::IoError(err),
            err => Error::OutputError(Box::new(err)),
        }
    }
}
