//! 遅延シーケンス
//!
//! チャンクと「次のページを取得する継続」の組を 1 つずつ辿る。
//! 継続は所有権ごと消費されるので、同じ位置から辿り直すことはできない。
//!
//! ```ignore
//! use tokio_http11_stream::{Page, StreamOptions, get_streamed_pages};
//!
//! let mut page = get_streamed_pages("http://localhost:8080/feed", StreamOptions::new()).await?;
//! while let Page::Chunk(chunk, next) = page {
//!     println!("{}", String::from_utf8_lossy(&chunk));
//!     page = next.await?;
//! }
//! ```

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use futures::Stream;
use futures::stream::{self, StreamExt};

use crate::connect::establish;
use crate::error::Result;
use crate::handle::StreamHandle;
use crate::options::StreamOptions;

/// 遅延シーケンスの 1 要素
#[derive(Debug)]
pub enum Page {
    /// チャンクと次のページへの継続
    Chunk(Vec<u8>, NextPage),
    /// ストリーム終端
    End,
}

impl Page {
    /// チャンクを取得 (終端なら None)
    pub fn chunk(&self) -> Option<&[u8]> {
        match self {
            Page::Chunk(chunk, _) => Some(chunk),
            Page::End => None,
        }
    }

    /// 終端かどうか
    pub fn is_end(&self) -> bool {
        matches!(self, Page::End)
    }

    /// このページ以降を `Stream` として扱う
    ///
    /// 失敗した場合はその失敗を最後の要素として終わる。
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<u8>>> + Send {
        let (first, handle) = match self {
            Page::Chunk(chunk, next) => (Some(Ok(chunk)), Some(next.handle)),
            Page::End => (None, None),
        };
        stream::iter(first).chain(chunks(handle))
    }
}

/// 次のページへの継続
///
/// `.await` すると次のチャンクを取得して `Page` を返す。
#[derive(Debug)]
pub struct NextPage {
    handle: StreamHandle,
}

impl NextPage {
    /// ハンドルの先頭から辿る継続を作成
    pub fn new(handle: StreamHandle) -> Self {
        Self { handle }
    }

    /// 残りを `Stream` として扱う
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<u8>>> + Send {
        chunks(Some(self.handle))
    }
}

impl IntoFuture for NextPage {
    type Output = Result<Page>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(produce(self.handle))
    }
}

async fn produce(handle: StreamHandle) -> Result<Page> {
    match handle.get_next_chunk().await? {
        Some(chunk) => Ok(Page::Chunk(chunk, NextPage { handle })),
        None => Ok(Page::End),
    }
}

fn chunks(handle: Option<StreamHandle>) -> impl Stream<Item = Result<Vec<u8>>> + Send {
    stream::unfold(handle, |handle| async move {
        let handle = handle?;
        match handle.get_next_chunk().await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(handle))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// URL のボディを遅延シーケンスとして取得
///
/// 接続を確立し、最初のページを取得して返す。
/// 接続フェーズの失敗は `Error::Connect`、その後の失敗は `Error::Stream` になる。
pub async fn get_streamed_pages(url: &str, options: StreamOptions) -> Result<Page> {
    let handle = establish(url, &options).await?;
    produce(handle).await
}
