//! tokio_http11_stream - Tokio integration for shiguredo_http11_stream
//!
//! tokio と tokio-rustls を使用して、HTTP/1.1 レスポンスボディを
//! 区切り文字ごとのチャンクとして受信するストリーミングクライアント。
//!
//! ## 特徴
//!
//! - **shiguredo_http11_stream ベース**: Sans I/O のデコーダーと分割器を使用
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **TLS 対応**: tokio-rustls による HTTPS 対応
//! - **失敗の区別**: 接続中の失敗 (`Error::Connect`) と受信中の失敗 (`Error::Stream`) を区別
//!
//! ## 遅延シーケンス
//!
//! ```ignore
//! use tokio_http11_stream::{Page, StreamOptions, get_streamed_pages};
//!
//! let mut page = get_streamed_pages("http://example.com/feed", StreamOptions::new()).await?;
//! while let Page::Chunk(chunk, next) = page {
//!     println!("{}", String::from_utf8_lossy(&chunk));
//!     page = next.await?;
//! }
//! ```
//!
//! ## 並行イテレーター
//!
//! ```ignore
//! use tokio_http11_stream::{StreamOptions, get_streamed_pages_iterator};
//!
//! let pages = get_streamed_pages_iterator("http://example.com/jobs", StreamOptions::new());
//! // クローンを複数のタスクに渡して同時に取り出せる
//! while let Some(chunk) = pages.next().await? {
//!     // ...
//! }
//! ```
//!
//! ## ハンドル
//!
//! ```ignore
//! use std::time::Duration;
//! use tokio_http11_stream::{StreamOptions, establish};
//!
//! let options = StreamOptions::new()
//!     .timeout(Duration::from_secs(10))
//!     .delimiter(b"\n");
//! let handle = establish("https://example.com/events", &options).await?;
//! while let Some(chunk) = handle.get_next_chunk().await? {
//!     // ...
//! }
//! ```

pub mod chunk_ext;
pub mod connect;
pub mod error;
pub mod handle;
pub mod iterator;
pub mod options;
pub mod pages;

pub use chunk_ext::{ChunkExt, JsonError};
pub use connect::{establish, parse_url};
pub use error::{Error, ErrorKind, Result};
pub use handle::StreamHandle;
pub use iterator::{PagesIterator, get_streamed_pages_iterator};
pub use options::StreamOptions;
pub use pages::{NextPage, Page, get_streamed_pages};

// shiguredo_http11_stream の型を re-export
pub use shiguredo_http11_stream::{ChunkSplitter, DecoderLimits};
