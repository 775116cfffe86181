use std::io::{Read, Write};
use std::sync::Arc;

use bytes::Bytes;
use derive_more::Display;

use super::{DataFormat, DeserializeVisitor, Serializer};
use crate::{Error, Result};

/// Content coding applied on top of a serialized body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Compression {
    /// `gzip`
    #[display("gzip")]
    Gzip,
    /// `deflate`
    #[display("deflate")]
    Deflate,
    /// `br`
    #[display("br")]
    Brotli,
    /// `zstd`
    #[display("zstd")]
    Zstd,
}

impl Compression {
    /// Token used in `Content-Encoding` and `Accept-Encoding`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
            Self::Brotli => "br",
            Self::Zstd => "zstd",
        }
    }

    /// Parse a `Content-Encoding` token. `identity` and unknown codings yield `None`.
    #[must_use]
    pub fn from_encoding(encoding: &str) -> Option<Self> {
        match encoding.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            "br" => Some(Self::Brotli),
            "zstd" => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Compress `data`.
    pub fn compress(&self, data: &[u8]) -> Result<Bytes> {
        let compressed = match self {
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?
            }
            Self::Deflate => {
                let mut encoder =
                    flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?
            }
            Self::Brotli => {
                let mut compressed = Vec::new();
                let params = brotli::enc::BrotliEncoderParams {
                    quality: 5,
                    ..Default::default()
                };
                brotli::BrotliCompress(&mut &data[..], &mut compressed, &params)?;
                compressed
            }
            Self::Zstd => zstd::encode_all(data, 3)?,
        };
        Ok(Bytes::from(compressed))
    }

    /// Decompress `data`.
    pub fn decompress(&self, data: &[u8]) -> Result<Bytes> {
        let decompressed = match self {
            Self::Gzip => {
                let mut decoder = flate2::read::GzDecoder::new(data);
                let mut decompressed = Vec::new();
                decoder.read_to_end(&mut decompressed)?;
                decompressed
            }
            Self::Deflate => {
                let mut decoder = flate2::read::DeflateDecoder::new(data);
                let mut decompressed = Vec::new();
                decoder.read_to_end(&mut decompressed)?;
                decompressed
            }
            Self::Brotli => {
                let mut decompressed = Vec::new();
                brotli::BrotliDecompress(&mut &data[..], &mut decompressed)?;
                decompressed
            }
            Self::Zstd => zstd::decode_all(data)?,
        };
        Ok(Bytes::from(decompressed))
    }
}

/// Wraps another serializer and compresses its output.
///
/// The wrapped serializer's content type is kept and `Content-Encoding` is set
/// to the compression token. Output is always binary, so
/// [`Serializer::serialize`] fails with [`Error::UnsupportedOperation`].
///
/// # Example
///
/// ```
/// use courier_core::{ChainedSerializer, Compression, JsonSerializer, Serializer};
///
/// let gzip_json = ChainedSerializer::new(JsonSerializer::new(), Compression::Gzip);
/// assert_eq!(gzip_json.content_type(), "application/json");
/// assert_eq!(gzip_json.content_encoding(), Some("gzip"));
/// ```
#[derive(Debug, Clone)]
pub struct ChainedSerializer {
    inner: Arc<dyn Serializer>,
    compression: Compression,
}

impl ChainedSerializer {
    /// Wrap `inner` with `compression`.
    #[must_use]
    pub fn new(inner: impl Serializer + 'static, compression: Compression) -> Self {
        Self {
            inner: Arc::new(inner),
            compression,
        }
    }

    /// Wrap a shared serializer.
    #[must_use]
    pub fn from_shared(inner: Arc<dyn Serializer>, compression: Compression) -> Self {
        Self { inner, compression }
    }

    /// Compression applied by this serializer.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }
}

impl Serializer for ChainedSerializer {
    fn data_format(&self) -> DataFormat {
        self.inner.data_format()
    }

    fn content_type(&self) -> &str {
        self.inner.content_type()
    }

    fn supported_content_types(&self) -> &[&str] {
        self.inner.supported_content_types()
    }

    fn accepts(&self, content_type: &str) -> bool {
        self.inner.accepts(content_type)
    }

    fn is_binary(&self) -> bool {
        true
    }

    fn content_encoding(&self) -> Option<&str> {
        Some(self.compression.as_str())
    }

    fn serialize(&self, _value: &dyn erased_serde::Serialize) -> Result<String> {
        Err(Error::unsupported_operation(format!(
            "{} compressed output is binary, use serialize_bytes",
            self.compression
        )))
    }

    fn serialize_bytes(&self, value: &dyn erased_serde::Serialize) -> Result<Bytes> {
        let plain = self.inner.serialize_bytes(value)?;
        self.compression.compress(&plain)
    }

    fn deserialize(&self, content: &[u8], visitor: &mut DeserializeVisitor<'_>) -> Result<()> {
        let plain = self.compression.decompress(content).map_err(|e| {
            Error::deserialization(
                self.inner.data_format(),
                ".",
                format!("{} decompression failed: {e}", self.compression),
            )
        })?;
        self.inner.deserialize(&plain, visitor)
    }
}
