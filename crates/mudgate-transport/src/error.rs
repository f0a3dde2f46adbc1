/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer sent more than the configured maximum without a newline.
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` if the peer is gone and further I/O is pointless.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed(_) => true,
            Self::SendFailed(e) | Self::ReceiveFailed(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::LineTooLong(_) | Self::AcceptFailed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_disconnect_broken_pipe_true() {
        let err = TransportError::SendFailed(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        ));
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_is_disconnect_line_too_long_false() {
        assert!(!TransportError::LineTooLong(16).is_disconnect());
    }
}
