use crate::config::ReaderConfig;
use crate::source::LineRecordSource;
use crate::CsvResult;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::codec::Utf8Transcoder;

/// Describes a raw byte stream well enough to decode it.
#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// e.g. "application/gzip" or "text/csv"
    pub content_type: String,
    /// e.g. "gzip", "zstd", "gzip, identity" or empty
    pub content_encoding: String,
    /// file or object name, used for extension fallback
    pub name_hint: String,
    /// Which character encoding to expect (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Zstd,
    None,
}

impl SourceMeta {
    /// Metadata guessed from a path's extension only.
    pub fn from_path(path: &Path) -> Self {
        let name_hint = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let (content_type, content_encoding) =
            match path.extension().and_then(|s| s.to_str()).unwrap_or_default() {
                "gz" => ("application/gzip", "gzip"),
                "zst" => ("application/zstd", "zstd"),
                _ => ("text/csv", ""),
            };
        Self {
            content_type: content_type.into(),
            content_encoding: content_encoding.into(),
            name_hint,
            ..Default::default()
        }
    }

    /// Content-encoding first, then content-type, then the name's extension.
    fn compression(&self) -> Compression {
        let ce = self.content_encoding.to_ascii_lowercase();
        let ct = self.content_type.to_ascii_lowercase();
        let encoded = |token: &str| ce.split(',').any(|s| s.trim() == token);

        if encoded("gzip")
            || matches!(ct.as_str(), "application/gzip" | "application/x-gzip")
            || self.name_hint.ends_with(".gz")
        {
            Compression::Gzip
        } else if encoded("zstd")
            || ct == "application/zstd"
            || self.name_hint.ends_with(".zst")
        {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

/// Wraps `raw` with decompression and UTF-8 transcoding as `meta` requires.
pub fn decode_stream<R>(
    raw: R,
    meta: &SourceMeta,
    buffer_capacity: usize,
) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = BufReader::with_capacity(buffer_capacity, raw);
    let compression = meta.compression();
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = match compression {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    };

    debug!(
        name = %meta.name_hint,
        ?compression,
        charset = meta.charset.name(),
        "decoding source"
    );

    // transcoding only when charset != UTF-8 to avoid extra copies
    if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, Utf8Transcoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    }
}

/// Opens a local file as a [`LineRecordSource`], decompressing by extension.
pub async fn open_path(
    path: &Path,
    config: &ReaderConfig,
) -> CsvResult<LineRecordSource<BufReader<Box<dyn AsyncRead + Unpin + Send>>>> {
    let file = File::open(path).await?;
    let meta = SourceMeta::from_path(path);
    let decoded = decode_stream(file, &meta, config.buffer_capacity);
    Ok(LineRecordSource::new(
        BufReader::with_capacity(config.buffer_capacity, decoded),
        config,
    ))
}
