/*! Error taxonomy for the protocol engine.

Every fallible operation in this crate returns [`Error`]. Parameter
validation errors are raised synchronously, before any byte reaches the
transport; protocol-layer errors are raised by the FSMs once a
transaction has reached a terminal failure state.
*/
use thiserror::Error;

/// Errors produced while building, transmitting, or interpreting a
/// protocol exchange.
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O number (SSR/opto/probe/push-button index, etc) fell
    /// outside the range the operation accepts.
    #[error("unexpected IO number: {0}")]
    UnexpectedIONum(u32),

    /// An I/O type letter did not match any of `C`/`D`/`P`.
    #[error("unexpected IO type: {0}")]
    UnexpectedIOType(char),

    /// A pulse count for `pulse_opto_output` fell outside `1..=9`.
    #[error("invalid pulse amount: {0}")]
    InvalidPulseAmount(u32),

    /// The transport did not deliver a byte within the configured
    /// timeout. Consumed internally by FSM retry logic; only ever
    /// surfaced wrapped in a [`Error::Protocol`] once retries are
    /// exhausted.
    #[error("transport timed out waiting for a byte")]
    TransportTimeout,

    /// The device opened could not be opened (missing device path,
    /// permission denied, UDP bind failure).
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    /// The device returned NAK (`0x15`) where ACK was expected.
    #[error("device replied with NAK")]
    NakReceived,

    /// A received byte did not match any value the current decode
    /// step is prepared to accept.
    #[error("unexpected byte on the wire: {0:#04x}")]
    UnexpectedByte(u8),

    /// The trailing CRC8 byte did not match the recomputed CRC8 over
    /// the preceding field bytes.
    #[error("CRC8 mismatch")]
    CrcMismatch,

    /// The post-set read-back did not match the expected value on the
    /// direct (non-verify) path.
    #[error("assertion failed: device state does not match the requested value")]
    AssertionFailure,

    /// An FSM reached a terminal failure state. Carries the terminal
    /// state's label, as given in the finite state machine tables.
    #[error("protocol failure, terminal state: {0}")]
    Protocol(&'static str),

    /// The settings file could not be read or did not deserialize into
    /// a configuration record.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from loading and interpreting the JSON settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be opened or read.
    #[error("could not read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file's contents did not parse as the expected
    /// configuration schema.
    #[error("could not parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    /// No serial device path was configured for the detected host OS.
    #[error("no serial device path configured for OS class {0:?}")]
    MissingSerialPath(crate::config::OsClass),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_terminal_state() {
        let e = Error::Protocol("comms_failure");
        assert_eq!(
            format!("{e}"),
            "protocol failure, terminal state: comms_failure"
        );
    }

    #[test]
    fn config_error_wraps_into_error() {
        let parse_err: serde_json::Error = serde_json::from_str::<u8>("not json").unwrap_err();
        let e: Error = ConfigError::Parse(parse_err).into();
        assert!(matches!(e, Error::Config(ConfigError::Parse(_))));
    }
}
