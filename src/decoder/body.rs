//! ボディフレーミングのデコード

use crate::error::Error;
use crate::limits::DecoderLimits;

use super::phase::DecodePhase;

/// ボディの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Content-Length で指定された固定長
    ContentLength(usize),
    /// Transfer-Encoding: chunked
    Chunked,
    /// 接続が閉じるまでがボディ (close-delimited)
    ///
    /// RFC 9112: レスポンスで Transfer-Encoding も Content-Length もない場合、
    /// 接続が閉じられるまでをボディとして扱う
    CloseDelimited,
    /// ボディなし
    None,
}

/// ボディデコードの進捗
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyProgress {
    /// まだデータがある（続きを読む）
    Continue,
    /// 完了（トレーラーがある場合は含む）
    Complete { trailers: Vec<(String, String)> },
}

/// ボディデコーダー (内部用)
///
/// フレーミングを取り除いたボディのバイト列を、届いた分だけ取り出す
#[derive(Debug, Default)]
pub(crate) struct BodyDecoder {
    trailers: Vec<(String, String)>,
}

impl BodyDecoder {
    pub fn reset(&mut self) {
        self.trailers.clear();
    }

    /// バッファ内の利用可能なボディデータをすべて `out` に移す
    ///
    /// 状態機械は進められるところまで進める。データ不足なら `Continue`。
    pub fn take_body(
        &mut self,
        buf: &mut Vec<u8>,
        phase: &mut DecodePhase,
        out: &mut Vec<u8>,
        limits: &DecoderLimits,
    ) -> Result<BodyProgress, Error> {
        loop {
            match phase.clone() {
                DecodePhase::BodyContentLength { remaining } => {
                    let n = buf.len().min(remaining);
                    out.extend(buf.drain(..n));
                    if remaining == n {
                        *phase = DecodePhase::Complete;
                        continue;
                    }
                    *phase = DecodePhase::BodyContentLength {
                        remaining: remaining - n,
                    };
                    return Ok(BodyProgress::Continue);
                }
                DecodePhase::BodyChunkedSize => match parse_chunk_size(buf, limits)? {
                    Some(0) => *phase = DecodePhase::ChunkedTrailer,
                    Some(size) => *phase = DecodePhase::BodyChunkedData { remaining: size },
                    None => return Ok(BodyProgress::Continue),
                },
                DecodePhase::BodyChunkedData { remaining } => {
                    let n = buf.len().min(remaining);
                    out.extend(buf.drain(..n));
                    if remaining == n {
                        *phase = DecodePhase::BodyChunkedDataCrlf;
                        continue;
                    }
                    *phase = DecodePhase::BodyChunkedData {
                        remaining: remaining - n,
                    };
                    return Ok(BodyProgress::Continue);
                }
                DecodePhase::BodyChunkedDataCrlf => {
                    if buf.len() < 2 {
                        return Ok(BodyProgress::Continue);
                    }
                    if buf[..2] != *b"\r\n" {
                        return Err(Error::InvalidData(
                            "invalid chunked encoding: expected CRLF after chunk data".to_string(),
                        ));
                    }
                    buf.drain(..2);
                    *phase = DecodePhase::BodyChunkedSize;
                }
                DecodePhase::ChunkedTrailer => {
                    if !self.process_trailers(buf, phase, limits)? {
                        return Ok(BodyProgress::Continue);
                    }
                }
                DecodePhase::BodyCloseDelimited => {
                    // Complete への遷移は mark_eof() で行う
                    out.append(buf);
                    return Ok(BodyProgress::Continue);
                }
                DecodePhase::Complete => {
                    return Ok(BodyProgress::Complete {
                        trailers: std::mem::take(&mut self.trailers),
                    });
                }
                DecodePhase::StartLine | DecodePhase::Headers => {
                    return Err(Error::InvalidData(
                        "take_body called before decode_headers".to_string(),
                    ));
                }
            }
        }
    }

    /// トレーラーヘッダーを処理
    ///
    /// 終端の空行まで読めたら true
    fn process_trailers(
        &mut self,
        buf: &mut Vec<u8>,
        phase: &mut DecodePhase,
        limits: &DecoderLimits,
    ) -> Result<bool, Error> {
        while let Some(pos) = find_line(buf) {
            if pos == 0 {
                buf.drain(..2);
                *phase = DecodePhase::Complete;
                return Ok(true);
            }
            if pos > limits.max_header_line_size {
                return Err(Error::HeaderLineTooLong {
                    size: pos,
                    limit: limits.max_header_line_size,
                });
            }
            if self.trailers.len() >= limits.max_headers_count {
                return Err(Error::TooManyHeaders {
                    count: self.trailers.len() + 1,
                    limit: limits.max_headers_count,
                });
            }

            let line = String::from_utf8(buf[..pos].to_vec())
                .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))?;
            buf.drain(..pos + 2);
            self.trailers.push(parse_header_line(&line)?);
        }
        Ok(false)
    }
}

/// チャンクサイズ行をパース (拡張は無視)
fn parse_chunk_size(buf: &mut Vec<u8>, limits: &DecoderLimits) -> Result<Option<usize>, Error> {
    let Some(pos) = find_line(buf) else {
        if buf.len() > limits.max_chunk_line_size {
            return Err(Error::ChunkLineTooLong {
                size: buf.len(),
                limit: limits.max_chunk_line_size,
            });
        }
        return Ok(None);
    };
    if pos > limits.max_chunk_line_size {
        return Err(Error::ChunkLineTooLong {
            size: pos,
            limit: limits.max_chunk_line_size,
        });
    }

    let line = String::from_utf8(buf[..pos].to_vec())
        .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))?;
    buf.drain(..pos + 2);

    let size_str = line.split(';').next().unwrap_or(&line).trim();
    let size = usize::from_str_radix(size_str, 16)
        .map_err(|_| Error::InvalidData(format!("invalid chunk size: {}", size_str)))?;
    Ok(Some(size))
}

/// CRLF で終わる行を探す
pub(crate) fn find_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// ヘッダー行をパース
pub(crate) fn parse_header_line(line: &str) -> Result<(String, String), Error> {
    if line.starts_with(' ') || line.starts_with('\t') {
        return Err(Error::InvalidData(
            "invalid header line: obs-fold".to_string(),
        ));
    }

    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::InvalidData("invalid header line: missing colon".to_string()))?;
    if name.is_empty() || !name.bytes().all(is_token_char) {
        return Err(Error::InvalidData(
            "invalid header line: invalid name".to_string(),
        ));
    }

    // RFC 9110 Section 5.5: 制御文字を含む値は拒否する
    let value = value.trim();
    if !value
        .bytes()
        .all(|b| matches!(b, 0x09 | 0x20..=0x7E | 0x80..=0xFF))
    {
        return Err(Error::InvalidData(
            "invalid header line: invalid value (contains control characters)".to_string(),
        ));
    }

    Ok((name.to_string(), value.to_string()))
}

/// トークン文字か確認
fn is_token_char(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'0'..=b'9' | b'A'..=b'Z' | b'^' | b'_' | b'`' | b'a'..=b'z' | b'|' | b'~'
    )
}

/// ボディ関連ヘッダーからボディの種類を決める
///
/// RFC 9112 Section 6.3 の優先順位に従う:
/// 1. Transfer-Encoding: chunked
/// 2. Content-Length
/// 3. それ以外は close-delimited
pub(crate) fn resolve_body_kind(headers: &[(String, String)]) -> Result<BodyKind, Error> {
    let mut chunked = false;
    let mut content_length: Option<usize> = None;

    for (name, value) in headers {
        if name.eq_ignore_ascii_case("Transfer-Encoding") {
            for token in value.split(',').map(str::trim) {
                if !token.eq_ignore_ascii_case("chunked") {
                    return Err(Error::InvalidData(format!(
                        "invalid Transfer-Encoding: unsupported coding {:?}",
                        token
                    )));
                }
                if chunked {
                    return Err(Error::InvalidData(
                        "invalid Transfer-Encoding: duplicate chunked".to_string(),
                    ));
                }
                chunked = true;
            }
        } else if name.eq_ignore_ascii_case("Content-Length") {
            let value = value.trim();
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidData(
                    "invalid Content-Length: not a number".to_string(),
                ));
            }
            let parsed: usize = value
                .parse()
                .map_err(|_| Error::InvalidData("invalid Content-Length: overflow".to_string()))?;
            if content_length.is_some_and(|prev| prev != parsed) {
                return Err(Error::InvalidData(
                    "invalid Content-Length: mismatched values".to_string(),
                ));
            }
            content_length = Some(parsed);
        }
    }

    match (chunked, content_length) {
        (true, Some(_)) => Err(Error::InvalidData(
            "invalid message: both Transfer-Encoding and Content-Length".to_string(),
        )),
        (true, None) => Ok(BodyKind::Chunked),
        (false, Some(len)) => Ok(BodyKind::ContentLength(len)),
        (false, None) => Ok(BodyKind::CloseDelimited),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_body_kind() {
        assert_eq!(
            resolve_body_kind(&headers(&[("Transfer-Encoding", "chunked")])).unwrap(),
            BodyKind::Chunked
        );
        assert_eq!(
            resolve_body_kind(&headers(&[("content-length", "12")])).unwrap(),
            BodyKind::ContentLength(12)
        );
        assert_eq!(
            resolve_body_kind(&headers(&[("Content-Type", "text/plain")])).unwrap(),
            BodyKind::CloseDelimited
        );
    }

    #[test]
    fn test_resolve_body_kind_invalid() {
        assert!(resolve_body_kind(&headers(&[("Transfer-Encoding", "gzip")])).is_err());
        assert!(resolve_body_kind(&headers(&[("Content-Length", "-1")])).is_err());
        assert!(
            resolve_body_kind(&headers(&[
                ("Transfer-Encoding", "chunked"),
                ("Content-Length", "3")
            ]))
            .is_err()
        );
        assert!(
            resolve_body_kind(&headers(&[("Content-Length", "3"), ("Content-Length", "4")]))
                .is_err()
        );
    }

    #[test]
    fn test_parse_header_line() {
        assert_eq!(
            parse_header_line("Content-Type:  text/plain ").unwrap(),
            ("Content-Type".to_string(), "text/plain".to_string())
        );
        assert!(parse_header_line(" folded").is_err());
        assert!(parse_header_line("no colon").is_err());
        assert!(parse_header_line("bad name: x").is_err());
    }

    #[test]
    fn test_chunked_split_everywhere() {
        let encoded = b"5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\nX-Trailer: yes\r\n\r\n";
        for split in 1..encoded.len() {
            let mut decoder = BodyDecoder::default();
            let mut phase = DecodePhase::BodyChunkedSize;
            let mut buf = Vec::new();
            let mut out = Vec::new();
            let mut progress = BodyProgress::Continue;
            for part in encoded.chunks(split) {
                buf.extend_from_slice(part);
                progress = decoder
                    .take_body(&mut buf, &mut phase, &mut out, &DecoderLimits::default())
                    .unwrap();
            }
            assert_eq!(out, b"hello world");
            assert_eq!(
                progress,
                BodyProgress::Complete {
                    trailers: vec![("X-Trailer".to_string(), "yes".to_string())]
                }
            );
        }
    }

    #[test]
    fn test_chunk_line_too_long() {
        let mut decoder = BodyDecoder::default();
        let mut phase = DecodePhase::BodyChunkedSize;
        let mut buf = vec![b'f'; 100];
        let mut out = Vec::new();
        let result = decoder.take_body(&mut buf, &mut phase, &mut out, &DecoderLimits::default());
        assert!(matches!(result, Err(Error::ChunkLineTooLong { .. })));
    }
}
