use thiserror::Error;

/// Broad failure categories, coarse enough for a caller to decide whether
/// to retry, abort or treat absence as expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The dataset could not be downloaded.
    Network,
    /// A table or a zipcode that was asked for does not exist.
    NotFound,
    /// The archive or the table inside it is not what we expect.
    Malformed,
    /// Local filesystem failure.
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with status: {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("max retries exceeded for {url}")]
    RetriesExhausted {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no CSV file found in the archive")]
    TableNotFound,

    #[error("zipcode {0} not found")]
    ZipcodeNotFound(u32),

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("dataset file is empty")]
    EmptyFile,

    #[error("dataset header has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: u64, reason: String },

    #[error("dataset is not valid {0}")]
    Decoding(&'static str),

    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network { .. } | Error::HttpStatus { .. } | Error::RetriesExhausted { .. } => {
                ErrorKind::Network
            }
            Error::TableNotFound | Error::ZipcodeNotFound(_) => ErrorKind::NotFound,
            Error::InvalidArchive(_)
            | Error::EmptyFile
            | Error::MissingColumn(_)
            | Error::MalformedRow { .. }
            | Error::Decoding(_)
            | Error::UnknownEncoding(_)
            | Error::Csv(_) => ErrorKind::Malformed,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::TableNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::ZipcodeNotFound(1003).kind(), ErrorKind::NotFound);
        assert_eq!(Error::EmptyFile.kind(), ErrorKind::Malformed);
        assert_eq!(
            Error::MalformedRow {
                row: 2,
                reason: "bad".into()
            }
            .kind(),
            ErrorKind::Malformed
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::ZipcodeNotFound(42).to_string(), "zipcode 42 not found");
        assert_eq!(
            Error::MissingColumn("PLZ").to_string(),
            "dataset header has no `PLZ` column"
        );
    }
}
