//! SCTP socket configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options shared by the packet codec and the socket plumbing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SctpOptions {
    /// Source port written into outgoing packets
    pub local_port: u16,
    /// Destination port written into outgoing packets
    pub remote_port: u16,
    /// Maximum packet size, including the common header (rounded down to 4)
    pub mtu: usize,
    /// Accept packets without checking their CRC32c (fuzzing, captured traces)
    pub disable_checksum_verification: bool,
    /// Upper bound for exponential timer backoff (ms); 24 hours when unset
    pub max_timer_backoff_duration_ms: Option<u64>,
}

impl Default for SctpOptions {
    fn default() -> Self {
        Self {
            local_port: crate::DEFAULT_SCTP_PORT,
            remote_port: crate::DEFAULT_SCTP_PORT,
            mtu: 1191, // Safe over IPv4/IPv6 with DTLS and TURN overhead
            disable_checksum_verification: false,
            max_timer_backoff_duration_ms: None,
        }
    }
}

impl SctpOptions {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self, crate::SctpError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::SctpError::Config(e.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| crate::SctpError::Config(e.to_string()))
    }

    /// Get the backoff cap as Duration
    pub fn max_timer_backoff_duration(&self) -> Option<Duration> {
        self.max_timer_backoff_duration_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: SctpOptions =
            serde_json::from_str(r#"{"mtu": 1200, "max_timer_backoff_duration_ms": 60000}"#)
                .unwrap();
        assert_eq!(options.mtu, 1200);
        assert_eq!(options.local_port, 5000);
        assert!(!options.disable_checksum_verification);
        assert_eq!(
            options.max_timer_backoff_duration(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_from_missing_file() {
        let err = SctpOptions::from_file("/nonexistent/sctp.json").unwrap_err();
        assert!(matches!(err, crate::SctpError::Config(_)));
    }
}
