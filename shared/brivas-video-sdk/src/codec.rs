//! Video codec types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Video codecs the encoder adaptation knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    #[default]
    Generic,
    VP8,
    VP9,
    H264,
    H265,
    AV1,
}

impl VideoCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::VP8 => "VP8",
            Self::VP9 => "VP9",
            Self::H264 => "H264",
            Self::H265 => "H265",
            Self::AV1 => "AV1",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_names() {
        assert_eq!(VideoCodec::default(), VideoCodec::Generic);
        assert_eq!(VideoCodec::H265.to_string(), "H265");
        let codec: VideoCodec = serde_json::from_str("\"VP9\"").unwrap();
        assert_eq!(codec, VideoCodec::VP9);
    }
}
