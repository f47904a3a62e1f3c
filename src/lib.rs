//! # shiguredo_http11_stream
//!
//! 依存なしの HTTP/1.1 ストリーミングボディ受信ライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **依存なし**: 標準ライブラリのみ使用
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **ストリーミング**: ボディ全体を待たず、区切り文字ごとのチャンクとして取り出せる
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_stream::{BodyProgress, ChunkSplitter, Request, ResponseDecoder};
//!
//! // リクエストを作成してエンコード
//! let request = Request::new("GET", "/feed")
//!     .header("Host", "example.com")
//!     .header("Connection", "close");
//! let bytes = request.encode();
//! // bytes を送信...
//!
//! // レスポンスをデコードしてチャンクに分割
//! let mut decoder = ResponseDecoder::new();
//! let mut splitter = ChunkSplitter::new();
//! decoder
//!     .feed(b"HTTP/1.1 200 OK\r\nContent-Length: 14\r\n\r\nhej 0\r\nhej 1\r\n")
//!     .unwrap();
//! decoder.decode_headers().unwrap().unwrap();
//!
//! let mut body = Vec::new();
//! if let BodyProgress::Complete { .. } = decoder.take_body(&mut body).unwrap() {
//!     splitter.feed(&body).unwrap();
//!     splitter.finish();
//! }
//! assert_eq!(splitter.pop_ready(), Some(b"hej 0".to_vec()));
//! assert_eq!(splitter.pop_ready(), Some(b"hej 1".to_vec()));
//! assert_eq!(splitter.pop_ready(), None);
//! ```

mod decoder;
mod error;
mod limits;
mod request;
mod splitter;

pub use decoder::{BodyKind, BodyProgress, ResponseDecoder, ResponseHead};
pub use error::Error;
pub use limits::DecoderLimits;
pub use request::Request;
pub use splitter::{ChunkSplitter, DEFAULT_DELIMITER};
