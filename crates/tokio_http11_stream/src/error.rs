//! tokio-http11-stream エラー型
//!
//! 失敗はどのフェーズで起きたかで 2 種類に分かれる。
//!
//! - [`Error::Connect`]: 接続確立中の失敗。`StreamHandle` は作られない
//! - [`Error::Stream`]: `StreamHandle` 作成後、ボディ受信中の失敗。
//!   待機中およびそれ以降のすべての取得要求に同じ値が返る
//!
//! ストリーム終端はエラーではなく `Ok(None)` で表す。

use std::fmt;
use std::sync::Arc;

/// 失敗の原因
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// I/O エラー
    Io(Arc<std::io::Error>),
    /// HTTP パースエラー
    Http(shiguredo_http11_stream::Error),
    /// TLS エラー
    Tls(String),
    /// タイムアウト (接続タイムアウト、または無通信タイムアウト)
    Timeout,
    /// 接続拒否
    ConnectionRefused(String),
    /// DNS 解決エラー
    DnsResolution(String),
    /// ボディの途中で接続が閉じられた
    ConnectionClosed,
    /// 不正な URL
    InvalidUrl(String),
    /// 2xx 以外のステータスコード
    UnexpectedStatus {
        status_code: u16,
        reason_phrase: String,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io(e) => write!(f, "I/O error: {}", e),
            ErrorKind::Http(e) => write!(f, "HTTP error: {}", e),
            ErrorKind::Tls(e) => write!(f, "TLS error: {}", e),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::ConnectionRefused(addr) => write!(f, "connection refused: {}", addr),
            ErrorKind::DnsResolution(msg) => write!(f, "DNS resolution error: {}", msg),
            ErrorKind::ConnectionClosed => write!(f, "connection closed"),
            ErrorKind::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
            ErrorKind::UnexpectedStatus {
                status_code,
                reason_phrase,
            } => write!(f, "unexpected status: {} {}", status_code, reason_phrase),
        }
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::ConnectionRefused {
            return ErrorKind::ConnectionRefused(e.to_string());
        }
        ErrorKind::Io(Arc::new(e))
    }
}

impl From<shiguredo_http11_stream::Error> for ErrorKind {
    fn from(e: shiguredo_http11_stream::Error) -> Self {
        ErrorKind::Http(e)
    }
}

impl From<tokio::time::error::Elapsed> for ErrorKind {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ErrorKind::Timeout
    }
}

impl From<rustls_pki_types::InvalidDnsNameError> for ErrorKind {
    fn from(e: rustls_pki_types::InvalidDnsNameError) -> Self {
        ErrorKind::Tls(e.to_string())
    }
}

/// tokio-http11-stream エラー
#[derive(Debug, Clone)]
pub enum Error {
    /// 接続確立フェーズの失敗
    Connect(ErrorKind),
    /// ボディ受信フェーズの失敗
    Stream(ErrorKind),
}

impl Error {
    /// 失敗の原因を取得
    pub fn kind(&self) -> &ErrorKind {
        match self {
            Error::Connect(kind) | Error::Stream(kind) => kind,
        }
    }

    /// 接続確立フェーズの失敗かどうか
    pub fn is_connect(&self) -> bool {
        matches!(self, Error::Connect(_))
    }

    /// ボディ受信フェーズの失敗かどうか
    pub fn is_stream(&self) -> bool {
        matches!(self, Error::Stream(_))
    }

    /// タイムアウトかどうか
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connect(kind) => write!(f, "connect failed: {}", kind),
            Error::Stream(kind) => write!(f, "stream failed: {}", kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Io(e) => Some(e.as_ref()),
            ErrorKind::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
