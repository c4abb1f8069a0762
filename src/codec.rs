use bytes::{Buf, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// Decodes a byte stream in some legacy charset into UTF-8 chunks.
pub struct Utf8Transcoder {
    decoder: encoding_rs::Decoder,
}

impl Utf8Transcoder {
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
        }
    }

    /// Decodes as much of `src` as possible. Incomplete trailing sequences
    /// stay in `src` unless `last` is set.
    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        if src.is_empty() {
            return None;
        }

        let capacity = if last {
            self.decoder.max_utf8_buffer_length(src.len())
        } else {
            self.decoder
                .max_utf8_buffer_length_without_replacement(src.len())
        };
        let mut out = vec![0; capacity.unwrap_or(src.len() * 2)];

        let (_result, read, written, _replaced) = self.decoder.decode_to_utf8(src, &mut out, last);
        if last {
            src.clear();
        } else {
            src.advance(read);
        }

        (written > 0).then(|| BytesMut::from(&out[..written]))
    }
}

impl Decoder for Utf8Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.transcode(src, false))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.transcode(buf, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_bytes_become_utf8() {
        let mut transcoder = Utf8Transcoder::new(encoding_rs::WINDOWS_1252);
        let mut src = BytesMut::from(&b"caf\xe9,na\xefve\n"[..]);
        let out = transcoder.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap(), "café,naïve\n");
        assert!(src.is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut transcoder = Utf8Transcoder::new(encoding_rs::WINDOWS_1252);
        let mut src = BytesMut::new();
        assert!(transcoder.decode(&mut src).unwrap().is_none());
    }
}
