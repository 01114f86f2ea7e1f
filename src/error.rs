//! Blueadv errors

/// The error type for advertisement decoding and scanning
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    message: String,
}

impl Error {
    /// Creates a new error. Hosts implementing [`ScanSource`][crate::ScanSource] or
    /// [`DeviceInfoSource`][crate::DeviceInfoSource] use this to report their own failures.
    pub fn new(
        kind: ErrorKind,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
        message: impl Into<String>,
    ) -> Self {
        Error {
            kind,
            source,
            message: message.into(),
        }
    }

    /// Returns the corresponding [ErrorKind] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message.is_empty(), &self.source) {
            (true, None) => write!(f, "{}", &self.kind),
            (false, None) => write!(f, "{}: {}", &self.kind, &self.message),
            (true, Some(err)) => write!(f, "{}: {}", &self.kind, err),
            (false, Some(err)) => write!(f, "{}: {} ({})", &self.kind, &self.message, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = &**x;
            x
        })
    }
}

/// A list of general categories of error.
#[non_exhaustive]
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[ignore_extra_doc_attributes]
pub enum ErrorKind {
    /// the host platform could not be identified
    UnknownPlatform,
    /// a scan is already in progress
    AlreadyScanning,
    /// the host failed to start or stop the scan
    ScanFailed,
    /// the host dropped the callback without answering
    Cancelled,
    /// invalid parameter
    ///
    /// For [`ScanSource`][crate::ScanSource] implementations whose plugin rejects the scan arguments.
    InvalidParameter,
    /// an internal error has occured
    ///
    /// For host integrations whose plugin bridge fails in a way unrelated to the request.
    Internal,
    /// error
    ///
    /// For host failures that fit no other kind.
    Other,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            source: None,
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_source() {
        let err: Error = ErrorKind::AlreadyScanning.into();
        assert_eq!(err.to_string(), "a scan is already in progress");

        let err = Error::new(ErrorKind::UnknownPlatform, None, "\"browser\"");
        assert_eq!(err.to_string(), "the host platform could not be identified: \"browser\"");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "plugin missing");
        let err = Error::new(ErrorKind::ScanFailed, Some(Box::new(io)), "");
        assert_eq!(err.to_string(), "the host failed to start or stop the scan: plugin missing");
        assert!(std::error::Error::source(&err).is_some());
    }
}
