use std::fmt;

#[derive(Debug)]
pub enum SweepError {
    Io(std::io::Error),
    Serialization(Box<bincode::error::EncodeError>),
    Deserialization(Box<bincode::error::DecodeError>),
    MalformedRecord(String),
    SlabCoverage(String),
    Other(String),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Io(e) => write!(f, "IO error: {}", e),
            SweepError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SweepError::Deserialization(e) => write!(f, "Deserialization error: {}", e),
            SweepError::MalformedRecord(e) => write!(f, "Malformed record: {}", e),
            SweepError::SlabCoverage(e) => write!(f, "Slab coverage violation: {}", e),
            SweepError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for SweepError {}

impl From<Box<bincode::error::EncodeError>> for SweepError {
    fn from(err: Box<bincode::error::EncodeError>) -> Self {
        SweepError::Serialization(err)
    }
}

impl From<bincode::error::EncodeError> for SweepError {
    fn from(err: bincode::error::EncodeError) -> Self {
        SweepError::Serialization(Box::new(err))
    }
}

impl From<Box<bincode::error::DecodeError>> for SweepError {
    fn from(err: Box<bincode::error::DecodeError>) -> Self {
        SweepError::Deserialization(err)
    }
}

impl From<bincode::error::DecodeError> for SweepError {
    fn from(err: bincode::error::DecodeError) -> Self {
        SweepError::Deserialization(Box::new(err))
    }
}

impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        SweepError::Io(err)
    }
}

impl From<String> for SweepError {
    fn from(err: String) -> Self {
        SweepError::Other(err)
    }
}

impl From<&str> for SweepError {
    fn from(err: &str) -> Self {
        SweepError::Other(err.to_string())
    }
}
