//! HTTP レスポンスデコーダー

use crate::error::Error;
use crate::limits::DecoderLimits;

use super::body::{
    BodyDecoder, BodyKind, BodyProgress, find_line, parse_header_line, resolve_body_kind,
};
use super::head::ResponseHead;
use super::phase::DecodePhase;

/// HTTP レスポンスデコーダー (Sans I/O)
///
/// ボディ全体を溜め込まず、届いた分だけボディのバイト列を取り出す。
/// 長時間続くストリーミングレスポンスの受信に使う。
#[derive(Debug)]
pub struct ResponseDecoder {
    buf: Vec<u8>,
    phase: DecodePhase,
    status_line: Option<(String, u16, String)>,
    headers: Vec<(String, String)>,
    body_decoder: BodyDecoder,
    limits: DecoderLimits,
    /// HEAD リクエストへのレスポンスかどうか
    expect_no_body: bool,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDecoder {
    /// 新しいデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            buf: Vec::new(),
            phase: DecodePhase::StartLine,
            status_line: None,
            headers: Vec::new(),
            body_decoder: BodyDecoder::default(),
            limits,
            expect_no_body: false,
        }
    }

    /// HEAD リクエストへのレスポンスとしてデコード (ボディなし)
    pub fn set_expect_no_body(&mut self, expect_no_body: bool) {
        self.expect_no_body = expect_no_body;
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// バッファにデータを追加
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        let new_size = self.buf.len() + data.len();
        if new_size > self.limits.max_buffer_size {
            return Err(Error::BufferOverflow {
                size: new_size,
                limit: self.limits.max_buffer_size,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// バッファの残りデータを取得
    pub fn remaining(&self) -> &[u8] {
        &self.buf
    }

    /// 接続終了を通知 (close-delimited ボディ用)
    ///
    /// close-delimited ボディを読み取り中なら Complete に遷移する。
    /// それ以外の状態では何もしない。
    pub fn mark_eof(&mut self) {
        if matches!(self.phase, DecodePhase::BodyCloseDelimited) {
            self.phase = DecodePhase::Complete;
        }
    }

    /// ボディまで読み終えたかどうか
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, DecodePhase::Complete)
    }

    /// ヘッダーをデコード
    ///
    /// ヘッダーが完了したら `Some((ResponseHead, BodyKind))` を返す。
    /// データ不足の場合は `None` を返す。
    /// 1xx の中間レスポンス (101 を除く) は読み捨てて次のレスポンスを待つ。
    pub fn decode_headers(&mut self) -> Result<Option<(ResponseHead, BodyKind)>, Error> {
        loop {
            match self.phase {
                DecodePhase::StartLine => {
                    let Some(pos) = find_line(&self.buf) else {
                        return Ok(None);
                    };
                    if pos > self.limits.max_header_line_size {
                        return Err(Error::HeaderLineTooLong {
                            size: pos,
                            limit: self.limits.max_header_line_size,
                        });
                    }
                    let line = String::from_utf8(self.buf[..pos].to_vec())
                        .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))?;
                    self.buf.drain(..pos + 2);

                    self.status_line = Some(parse_status_line(&line)?);
                    self.phase = DecodePhase::Headers;
                }
                DecodePhase::Headers => {
                    let Some(pos) = find_line(&self.buf) else {
                        return Ok(None);
                    };
                    if pos > 0 {
                        if pos > self.limits.max_header_line_size {
                            return Err(Error::HeaderLineTooLong {
                                size: pos,
                                limit: self.limits.max_header_line_size,
                            });
                        }
                        if self.headers.len() >= self.limits.max_headers_count {
                            return Err(Error::TooManyHeaders {
                                count: self.headers.len() + 1,
                                limit: self.limits.max_headers_count,
                            });
                        }
                        let line = String::from_utf8(self.buf[..pos].to_vec())
                            .map_err(|e| Error::InvalidData(format!("invalid UTF-8: {e}")))?;
                        self.buf.drain(..pos + 2);
                        self.headers.push(parse_header_line(&line)?);
                        continue;
                    }

                    // 空行: ヘッダー終端
                    self.buf.drain(..2);
                    let (version, status_code, reason_phrase) = self
                        .status_line
                        .take()
                        .ok_or_else(|| Error::InvalidData("missing status line".to_string()))?;
                    let head = ResponseHead {
                        version,
                        status_code,
                        reason_phrase,
                        headers: std::mem::take(&mut self.headers),
                    };

                    if head.is_informational() && head.status_code != 101 {
                        self.phase = DecodePhase::StartLine;
                        continue;
                    }

                    let body_kind = self.determine_body_kind(&head)?;
                    self.phase = match body_kind {
                        BodyKind::ContentLength(0) | BodyKind::None => DecodePhase::Complete,
                        BodyKind::ContentLength(len) => {
                            DecodePhase::BodyContentLength { remaining: len }
                        }
                        BodyKind::Chunked => DecodePhase::BodyChunkedSize,
                        BodyKind::CloseDelimited => DecodePhase::BodyCloseDelimited,
                    };
                    self.body_decoder.reset();
                    return Ok(Some((head, body_kind)));
                }
                _ => {
                    return Err(Error::InvalidData(
                        "decode_headers called during body decoding".to_string(),
                    ));
                }
            }
        }
    }

    /// 利用可能なボディデータをすべて `out` の末尾に移す
    ///
    /// `decode_headers()` 成功後に呼ぶ。フレーミング (チャンクサイズ行など) は
    /// 取り除かれ、ボディのバイト列のみが `out` に追加される。
    pub fn take_body(&mut self, out: &mut Vec<u8>) -> Result<BodyProgress, Error> {
        self.body_decoder
            .take_body(&mut self.buf, &mut self.phase, out, &self.limits)
    }

    /// ボディモードを決定
    fn determine_body_kind(&self, head: &ResponseHead) -> Result<BodyKind, Error> {
        // 1xx/204/304 と HEAD へのレスポンスはボディなし
        if self.expect_no_body
            || head.is_informational()
            || head.status_code == 204
            || head.status_code == 304
        {
            return Ok(BodyKind::None);
        }
        resolve_body_kind(&head.headers)
    }
}

/// ステータスラインをパース
///
/// status-line = HTTP-version SP status-code SP [ reason-phrase ]
fn parse_status_line(line: &str) -> Result<(String, u16, String), Error> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().unwrap_or_default();
    let reason = parts.next().unwrap_or_default();

    if !matches!(version, "HTTP/1.0" | "HTTP/1.1") {
        return Err(Error::InvalidData(format!("invalid status line: {}", line)));
    }
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidData(format!("invalid status code: {}", code)));
    }
    let status_code: u16 = code
        .parse()
        .map_err(|_| Error::InvalidData(format!("invalid status code: {}", code)))?;
    if !(100..=599).contains(&status_code) {
        return Err(Error::InvalidData(format!("invalid status code: {}", code)));
    }

    Ok((version.to_string(), status_code, reason.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_chunked_stream() {
        let mut decoder = ResponseDecoder::new();
        decoder
            .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\nhej 0\r\n\r\n")
            .unwrap();

        let (head, body_kind) = decoder.decode_headers().unwrap().unwrap();
        assert_eq!(head.status_code, 200);
        assert_eq!(head.reason_phrase, "OK");
        assert_eq!(body_kind, BodyKind::Chunked);

        let mut body = Vec::new();
        assert_eq!(decoder.take_body(&mut body).unwrap(), BodyProgress::Continue);
        assert_eq!(body, b"hej 0\r\n");

        decoder.feed(b"3\r\nhej\r\n0\r\n\r\n").unwrap();
        assert!(matches!(
            decoder.take_body(&mut body).unwrap(),
            BodyProgress::Complete { .. }
        ));
        assert_eq!(body, b"hej 0\r\nhej");
        assert!(decoder.is_complete());
    }

    #[test]
    fn test_decode_content_length() {
        let mut decoder = ResponseDecoder::new();
        decoder
            .feed(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n1\r\n")
            .unwrap();
        let (_, body_kind) = decoder.decode_headers().unwrap().unwrap();
        assert_eq!(body_kind, BodyKind::ContentLength(4));

        let mut body = Vec::new();
        assert_eq!(decoder.take_body(&mut body).unwrap(), BodyProgress::Continue);
        decoder.feed(b"2").unwrap();
        assert!(matches!(
            decoder.take_body(&mut body).unwrap(),
            BodyProgress::Complete { .. }
        ));
        assert_eq!(body, b"1\r\n2");
    }

    #[test]
    fn test_decode_close_delimited() {
        let mut decoder = ResponseDecoder::new();
        decoder.feed(b"HTTP/1.0 200 OK\r\n\r\nabc").unwrap();
        let (_, body_kind) = decoder.decode_headers().unwrap().unwrap();
        assert_eq!(body_kind, BodyKind::CloseDelimited);

        let mut body = Vec::new();
        assert_eq!(decoder.take_body(&mut body).unwrap(), BodyProgress::Continue);
        decoder.mark_eof();
        assert!(matches!(
            decoder.take_body(&mut body).unwrap(),
            BodyProgress::Complete { .. }
        ));
        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_skip_informational() {
        let mut decoder = ResponseDecoder::new();
        decoder
            .feed(b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n")
            .unwrap();
        let (head, body_kind) = decoder.decode_headers().unwrap().unwrap();
        assert_eq!(head.status_code, 204);
        assert_eq!(body_kind, BodyKind::None);
        assert!(decoder.is_complete());
    }

    #[test]
    fn test_head_response() {
        let mut decoder = ResponseDecoder::new();
        decoder.set_expect_no_body(true);
        decoder
            .feed(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n")
            .unwrap();
        let (_, body_kind) = decoder.decode_headers().unwrap().unwrap();
        assert_eq!(body_kind, BodyKind::None);
    }

    #[test]
    fn test_incomplete_headers() {
        let mut decoder = ResponseDecoder::new();
        decoder.feed(b"HTTP/1.1 200 OK\r\nContent-").unwrap();
        assert_eq!(decoder.decode_headers().unwrap(), None);
        decoder.feed(b"Length: 0\r\n\r\n").unwrap();
        assert!(decoder.decode_headers().unwrap().is_some());
    }

    #[test]
    fn test_invalid_status_line() {
        for line in [
            "HTTP/2 200 OK\r\n\r\n",
            "HTTP/1.1 20 OK\r\n\r\n",
            "HTTP/1.1 abc OK\r\n\r\n",
            "HTTP/1.1 999 Odd\r\n\r\n",
        ] {
            let mut decoder = ResponseDecoder::new();
            decoder.feed(line.as_bytes()).unwrap();
            assert!(decoder.decode_headers().is_err(), "{}", line);
        }
    }

    #[test]
    fn test_buffer_overflow() {
        let limits = DecoderLimits {
            max_buffer_size: 8,
            ..DecoderLimits::default()
        };
        let mut decoder = ResponseDecoder::with_limits(limits);
        assert!(matches!(
            decoder.feed(b"HTTP/1.1 200 OK\r\n"),
            Err(Error::BufferOverflow { size: 17, limit: 8 })
        ));
    }
}
