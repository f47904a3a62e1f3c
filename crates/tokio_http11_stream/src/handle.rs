//! ストリームハンドル
//!
//! 1 本の接続から届くボディをチャンク単位で取り出すためのハンドル。
//! トランスポート側は `on_data` / `on_body_end` / `on_error` で状態を進め、
//! 利用側は `get_next_chunk()` でチャンクを 1 つずつ取り出す。
//!
//! ```ignore
//! use shiguredo_http11_stream::ChunkSplitter;
//! use tokio_http11_stream::StreamHandle;
//!
//! let handle = StreamHandle::new(ChunkSplitter::new());
//! handle.on_data(b"hej 0\r\nhej");
//! handle.on_body_end();
//!
//! assert_eq!(handle.get_next_chunk().await?, Some(b"hej 0".to_vec()));
//! assert_eq!(handle.get_next_chunk().await?, Some(b"hej".to_vec()));
//! assert_eq!(handle.get_next_chunk().await?, None);
//! ```

use std::pin::pin;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shiguredo_http11_stream::ChunkSplitter;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{Error, ErrorKind, Result};

/// ハンドルが排他的に所有する状態
#[derive(Debug)]
struct State {
    splitter: ChunkSplitter,
    failure: Option<Error>,
}

impl State {
    fn is_terminal(&self) -> bool {
        self.failure.is_some() || self.splitter.is_finished()
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    /// 待機中の取得要求への通知
    ///
    /// `notify_waiters()` はその時点で登録済みの待機者だけを起こし、
    /// 以降の `notified()` は新しい通知を待つ。
    notify: Notify,
}

impl Shared {
    /// 続きのデータを受け付けるなら true を返す
    fn on_data(&self, data: &[u8]) -> bool {
        let mut state = self.state.lock();
        if state.is_terminal() {
            tracing::debug!(len = data.len(), "data after end of stream ignored");
            return false;
        }
        if let Err(e) = state.splitter.feed(data) {
            tracing::warn!(error = %e, "failed to split stream body");
            state.failure = Some(Error::Stream(ErrorKind::Http(e)));
        }
        tracing::trace!(
            len = data.len(),
            ready = state.splitter.ready_len(),
            "body data received"
        );
        let accepting = !state.is_terminal();
        drop(state);
        self.notify.notify_waiters();
        accepting
    }

    fn on_body_end(&self) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return;
        }
        state.splitter.finish();
        tracing::debug!(ready = state.splitter.ready_len(), "end of stream");
        drop(state);
        self.notify.notify_waiters();
    }

    fn on_error(&self, kind: ErrorKind) {
        let mut state = self.state.lock();
        if state.is_terminal() {
            tracing::debug!(error = %kind, "error after end of stream ignored");
            return;
        }
        tracing::debug!(error = %kind, "stream failed");
        state.failure = Some(Error::Stream(kind));
        drop(state);
        self.notify.notify_waiters();
    }

    /// 待たずに結果が決まるなら返す
    ///
    /// キューにチャンクがあれば、失敗や終端よりも先に返す。
    fn poll_chunk(&self) -> Option<Result<Option<Vec<u8>>>> {
        let mut state = self.state.lock();
        if let Some(chunk) = state.splitter.pop_ready() {
            return Some(Ok(Some(chunk)));
        }
        if let Some(e) = &state.failure {
            return Some(Err(e.clone()));
        }
        if state.splitter.is_finished() {
            return Some(Ok(None));
        }
        None
    }
}

/// 受信タスクを止めるためのガード
///
/// 最後の `StreamHandle` が破棄されたら受信タスクを中断し、接続を閉じる。
#[derive(Debug)]
struct TransportGuard(JoinHandle<()>);

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// ストリームハンドル
///
/// クローンは同じストリームを共有する。チャンクはどのクローンから取り出しても
/// 到着順に 1 回だけ返る。
#[derive(Debug, Clone)]
pub struct StreamHandle {
    shared: Arc<Shared>,
    transport: Option<Arc<TransportGuard>>,
}

impl StreamHandle {
    /// 分割器を指定してハンドルを作成
    ///
    /// トランスポートは接続されていないので、`on_data` などで直接状態を進める。
    pub fn new(splitter: ChunkSplitter) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    splitter,
                    failure: None,
                }),
                notify: Notify::new(),
            }),
            transport: None,
        }
    }

    /// 次のチャンクを取得
    ///
    /// - チャンクがあれば `Ok(Some(chunk))`
    /// - ストリームが終端に達していれば `Ok(None)`
    /// - ストリームが失敗していれば `Err(Error::Stream(_))`
    ///
    /// どれにも当てはまらなければ、トランスポートから通知が来るまで待つ。
    /// 待機中の Future を破棄すると、その待機だけが取り消される。
    pub async fn get_next_chunk(&self) -> Result<Option<Vec<u8>>> {
        loop {
            // 状態を確認する前に待機を登録して、通知の取りこぼしを防ぐ
            let mut notified = pin!(self.shared.notify.notified());
            notified.as_mut().enable();

            if let Some(outcome) = self.shared.poll_chunk() {
                return outcome;
            }
            notified.await;
        }
    }

    /// ボディの断片を受信した
    pub fn on_data(&self, data: &[u8]) {
        self.shared.on_data(data);
    }

    /// ボディの終端に達した
    pub fn on_body_end(&self) {
        self.shared.on_body_end();
    }

    /// ボディ受信中に失敗した
    pub fn on_error(&self, kind: ErrorKind) {
        self.shared.on_error(kind);
    }

    /// 終端または失敗に達しているかどうか (未取得のチャンクが残っていても true)
    pub fn is_terminated(&self) -> bool {
        self.shared.state.lock().is_terminal()
    }

    /// 取り出し待ちのチャンク数
    pub fn ready_len(&self) -> usize {
        self.shared.state.lock().splitter.ready_len()
    }

    pub(crate) fn feeder(&self) -> StreamFeeder {
        StreamFeeder {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub(crate) fn attach_transport(&mut self, task: JoinHandle<()>) {
        self.transport = Some(Arc::new(TransportGuard(task)));
    }
}

/// トランスポート側からハンドルへ通知するための弱参照
///
/// 利用側がハンドルをすべて破棄していれば、各メソッドは false を返す。
/// `on_data` と `wants_data` は、ストリームが終端または失敗に達した後も false を返す。
#[derive(Debug)]
pub(crate) struct StreamFeeder {
    shared: Weak<Shared>,
}

impl StreamFeeder {
    pub fn on_data(&self, data: &[u8]) -> bool {
        self.shared.upgrade().is_some_and(|s| s.on_data(data))
    }

    pub fn on_body_end(&self) -> bool {
        self.shared.upgrade().map(|s| s.on_body_end()).is_some()
    }

    pub fn on_error(&self, kind: ErrorKind) -> bool {
        self.shared.upgrade().map(|s| s.on_error(kind)).is_some()
    }

    /// 受信を続ける必要があるかどうか
    pub fn wants_data(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|s| !s.state.lock().is_terminal())
    }
}
