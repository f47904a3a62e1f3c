//! 並行イテレーター
//!
//! 複数のワーカーから同時に `next()` を呼べるイテレーター。
//! 各チャンクはどれか 1 つの呼び出しにだけ返り、終端や失敗に達した後は
//! すべての呼び出しが同じ結果を受け取る。
//!
//! ```ignore
//! use tokio_http11_stream::{StreamOptions, get_streamed_pages_iterator};
//!
//! let pages = get_streamed_pages_iterator("http://localhost:8080/jobs", StreamOptions::new());
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let pages = pages.clone();
//!         tokio::spawn(async move {
//!             while let Some(job) = pages.next().await? {
//!                 process(job).await;
//!             }
//!             Ok::<_, tokio_http11_stream::Error>(())
//!         })
//!     })
//!     .collect();
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::connect::establish;
use crate::error::{Error, Result};
use crate::handle::StreamHandle;
use crate::options::StreamOptions;

#[derive(Debug, Clone)]
enum Terminal {
    Exhausted,
    Failed(Error),
}

impl Terminal {
    fn outcome(&self) -> Result<Option<Vec<u8>>> {
        match self {
            Terminal::Exhausted => Ok(None),
            Terminal::Failed(e) => Err(e.clone()),
        }
    }
}

#[derive(Debug)]
struct Inner {
    url: String,
    options: StreamOptions,
    handle: OnceCell<Result<StreamHandle>>,
    terminal: Mutex<Option<Terminal>>,
}

/// 並行イテレーター
///
/// クローンは同じストリームを共有する。
#[derive(Debug, Clone)]
pub struct PagesIterator {
    inner: Arc<Inner>,
}

impl PagesIterator {
    /// 確立済みのハンドルから作成
    pub fn from_handle(handle: StreamHandle) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: String::new(),
                options: StreamOptions::new(),
                handle: OnceCell::new_with(Some(Ok(handle))),
                terminal: Mutex::new(None),
            }),
        }
    }

    /// 次のチャンクを取得
    ///
    /// - チャンクがあれば `Ok(Some(chunk))`
    /// - 終端に達していれば `Ok(None)`
    /// - 失敗していれば `Err(_)`
    ///
    /// 最初の呼び出しで接続を確立する。確立中に呼ばれた他の呼び出しは
    /// 同じ確立を待ち、確立に失敗すればすべての呼び出しが `Error::Connect` を受け取る。
    pub async fn next(&self) -> Result<Option<Vec<u8>>> {
        let terminal = self.inner.terminal.lock().clone();
        if let Some(terminal) = terminal {
            return terminal.outcome();
        }

        let handle = self
            .inner
            .handle
            .get_or_init(|| async {
                tracing::debug!(url = %self.inner.url, "establishing stream on first pull");
                establish(&self.inner.url, &self.inner.options).await
            })
            .await;
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => return self.capture(Terminal::Failed(e.clone())),
        };

        match handle.get_next_chunk().await {
            Ok(Some(chunk)) => Ok(Some(chunk)),
            Ok(None) => self.capture(Terminal::Exhausted),
            Err(e) => self.capture(Terminal::Failed(e)),
        }
    }

    /// 終端または失敗に達しているかどうか
    pub fn is_terminated(&self) -> bool {
        self.inner.terminal.lock().is_some()
    }

    /// 最初に記録された終端の結果を返す
    fn capture(&self, terminal: Terminal) -> Result<Option<Vec<u8>>> {
        let mut slot = self.inner.terminal.lock();
        slot.get_or_insert(terminal).outcome()
    }
}

/// URL のボディを並行イテレーターとして取得
///
/// 接続は最初の `next()` 呼び出しまで確立しない。
pub fn get_streamed_pages_iterator(url: &str, options: StreamOptions) -> PagesIterator {
    PagesIterator {
        inner: Arc::new(Inner {
            url: url.to_string(),
            options,
            handle: OnceCell::new(),
            terminal: Mutex::new(None),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use shiguredo_http11_stream::ChunkSplitter;

    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_exhausted_repeats() {
        let handle = StreamHandle::new(ChunkSplitter::new());
        handle.on_data(b"a\r\nb");
        handle.on_body_end();

        let pages = PagesIterator::from_handle(handle);
        assert_eq!(pages.next().await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(pages.next().await.unwrap(), Some(b"b".to_vec()));
        assert!(!pages.is_terminated());
        assert_eq!(pages.next().await.unwrap(), None);
        assert!(pages.is_terminated());
        assert_eq!(pages.clone().next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_repeats() {
        let handle = StreamHandle::new(ChunkSplitter::new());
        handle.on_data(b"a\r\n");
        handle.on_error(ErrorKind::ConnectionClosed);

        let pages = PagesIterator::from_handle(handle);
        assert_eq!(pages.next().await.unwrap(), Some(b"a".to_vec()));
        for _ in 0..3 {
            let err = pages.next().await.unwrap_err();
            assert!(matches!(err, Error::Stream(ErrorKind::ConnectionClosed)));
        }
    }

    #[tokio::test]
    async fn test_invalid_url_fails_every_caller() {
        let pages = get_streamed_pages_iterator("ftp://example.com/", StreamOptions::new());
        assert!(!pages.is_terminated());
        for _ in 0..2 {
            let err = pages.next().await.unwrap_err();
            assert!(matches!(err, Error::Connect(ErrorKind::InvalidUrl(_))));
        }
        assert!(pages.is_terminated());
    }

    #[tokio::test]
    async fn test_workers_share_chunks() {
        let handle = StreamHandle::new(ChunkSplitter::new());
        let pages = PagesIterator::from_handle(handle.clone());

        let workers: Vec<_> = (0..5)
            .map(|_| {
                let pages = pages.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    while let Some(chunk) = pages.next().await.unwrap() {
                        seen.push(chunk);
                    }

                    // ワーカーごとに見ると、受け取った順序はストリーム上の順序と一致する
                    let numbers: Vec<u32> = seen
                        .iter()
                        .map(|c| std::str::from_utf8(c).unwrap().parse().unwrap())
                        .collect();
                    assert!(
                        numbers.windows(2).all(|w| w[0] < w[1]),
                        "out of order: {numbers:?}"
                    );
                    seen
                })
            })
            .collect();

        for i in 0..20 {
            handle.on_data(format!("{}\r\n", i).as_bytes());
            tokio::task::yield_now().await;
        }
        handle.on_body_end();

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        assert_eq!(all.len(), 20);
        let unique: HashSet<_> = all.into_iter().collect();
        assert_eq!(unique.len(), 20);
    }
}
