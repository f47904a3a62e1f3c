//! HTTP/1.1 レスポンスデコーダーモジュール
//!
//! Sans I/O 設計に基づくストリーミングデコーダーを提供。
//! ボディは届いた分だけ取り出せるため、終わりのないレスポンスも扱える。
//!
//! ```rust
//! use shiguredo_http11_stream::{BodyKind, BodyProgress, ResponseDecoder};
//!
//! let mut decoder = ResponseDecoder::new();
//! decoder
//!     .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n")
//!     .unwrap();
//!
//! let (head, body_kind) = decoder.decode_headers().unwrap().unwrap();
//! assert_eq!(head.status_code, 200);
//! assert_eq!(body_kind, BodyKind::Chunked);
//!
//! let mut body = Vec::new();
//! assert_eq!(decoder.take_body(&mut body).unwrap(), BodyProgress::Continue);
//! assert_eq!(body, b"hello");
//! ```

mod body;
mod head;
mod phase;
mod response;

pub use body::{BodyKind, BodyProgress};
pub use head::ResponseHead;
pub use response::ResponseDecoder;
