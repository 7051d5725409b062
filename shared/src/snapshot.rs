//! 图表快照载荷
//!
//! 快照是固定尺寸的 PNG，以不带前缀的 base64 字符串提交。
//! 构造时校验：base64 可解码、PNG 签名正确、IHDR 中的宽高与期望一致。

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use thiserror::Error;

use crate::SNAPSHOT_SIZE;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// 签名(8) + 长度(4) + "IHDR"(4) + 宽(4) + 高(4)
const PNG_HEADER_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// 图表尚未挂载或尚未完成首次渲染
    #[error("chart has not been rendered yet")]
    ChartNotRendered,
    #[error("canvas operation failed: {0}")]
    Canvas(String),
    #[error("expected a PNG data URL")]
    NotPngDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a PNG image")]
    NotPng,
    #[error("snapshot must be {expected}x{expected}, got {width}x{height}")]
    WrongSize { expected: u32, width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    base64_png: String,
}

impl Snapshot {
    /// 从 canvas 的 `toDataURL("image/png")` 结果构造
    pub fn from_data_url(data_url: &str) -> Result<Self, SnapshotError> {
        let payload = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or(SnapshotError::NotPngDataUrl)?;
        Self::from_base64(payload)
    }

    pub fn from_base64(payload: &str) -> Result<Self, SnapshotError> {
        let bytes = BASE64_STANDARD.decode(payload)?;
        check_png_header(&bytes)?;
        Ok(Self {
            base64_png: payload.to_string(),
        })
    }

    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        check_png_header(bytes)?;
        Ok(Self {
            base64_png: BASE64_STANDARD.encode(bytes),
        })
    }

    pub fn as_base64(&self) -> &str {
        &self.base64_png
    }

    pub fn into_base64(self) -> String {
        self.base64_png
    }
}

fn check_png_header(bytes: &[u8]) -> Result<(), SnapshotError> {
    if bytes.len() < PNG_HEADER_LEN || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return Err(SnapshotError::NotPng);
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    if width != SNAPSHOT_SIZE || height != SNAPSHOT_SIZE {
        return Err(SnapshotError::WrongSize {
            expected: SNAPSHOT_SIZE,
            width,
            height,
        });
    }
    Ok(())
}

/// 仅含 PNG 头部的测试数据
#[cfg(test)]
pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_url_strips_prefix() {
        let encoded = BASE64_STANDARD.encode(png_header(128, 128));
        let url = format!("data:image/png;base64,{encoded}");
        let snapshot = Snapshot::from_data_url(&url).unwrap();
        assert_eq!(snapshot.as_base64(), encoded);
        assert!(!snapshot.as_base64().starts_with("data:"));
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(matches!(
            Snapshot::from_data_url("data:image/jpeg;base64,AAAA"),
            Err(SnapshotError::NotPngDataUrl)
        ));
        assert!(matches!(
            Snapshot::from_base64("%%%"),
            Err(SnapshotError::Base64(_))
        ));
        assert!(matches!(
            Snapshot::from_png_bytes(b"GIF89a............................"),
            Err(SnapshotError::NotPng)
        ));
    }

    #[test]
    fn test_rejects_wrong_size() {
        let err = Snapshot::from_png_bytes(&png_header(640, 320)).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::WrongSize { expected: 128, width: 640, height: 320 }
        ));
    }
}
