//! 区切り文字によるチャンク分割
//!
//! ネットワークから任意の粒度で届くボディ断片を、区切り文字で区切られた
//! 論理チャンクの列に変換する。
//!
//! ```rust
//! use shiguredo_http11_stream::ChunkSplitter;
//!
//! let mut splitter = ChunkSplitter::new();
//! splitter.feed(b"hej 0\r\nhe").unwrap();
//! splitter.feed(b"j 1\r\nhej 2").unwrap();
//! splitter.finish();
//!
//! assert_eq!(splitter.pop_ready().as_deref(), Some(&b"hej 0"[..]));
//! assert_eq!(splitter.pop_ready().as_deref(), Some(&b"hej 1"[..]));
//! assert_eq!(splitter.pop_ready().as_deref(), Some(&b"hej 2"[..]));
//! assert_eq!(splitter.pop_ready(), None);
//! ```

use std::collections::VecDeque;

use crate::error::Error;
use crate::limits::DecoderLimits;

/// デフォルトの区切り文字
pub const DEFAULT_DELIMITER: &[u8] = b"\r\n";

/// チャンク分割器 (Sans I/O)
///
/// 区切り文字が見つかるまでのバイト列は未確定データとして保持し、
/// 区切り文字が見つかった時点、またはストリーム終端 (`finish()`) で
/// チャンクとして確定する。確定したチャンクは到着順に取り出される。
///
/// 区切り文字が連続する場合は空のチャンクになる (読み飛ばさない)。
#[derive(Debug)]
pub struct ChunkSplitter {
    delimiter: Vec<u8>,
    tail: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
    finished: bool,
    max_chunk_size: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSplitter {
    /// デフォルトの区切り文字 (`\r\n`) で分割器を作成
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_vec(),
            tail: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
            max_chunk_size: DecoderLimits::default().max_chunk_size,
        }
    }

    /// 区切り文字を指定して分割器を作成
    ///
    /// 空の区切り文字はエラー
    pub fn with_delimiter(delimiter: &[u8]) -> Result<Self, Error> {
        Self::with_limits(delimiter, &DecoderLimits::default())
    }

    /// 区切り文字と制限を指定して分割器を作成
    pub fn with_limits(delimiter: &[u8], limits: &DecoderLimits) -> Result<Self, Error> {
        if delimiter.is_empty() {
            return Err(Error::InvalidData("empty delimiter".to_string()));
        }
        Ok(Self {
            delimiter: delimiter.to_vec(),
            tail: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
            max_chunk_size: limits.max_chunk_size,
        })
    }

    /// 区切り文字を取得
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    /// 受信した断片を投入
    ///
    /// 前回の未確定データに続けて区切り文字を探し、見つかった分だけ
    /// チャンクを確定する。断片の末尾がちょうど区切り文字で終わる場合、
    /// 未確定データは空になる。
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.finished {
            return Err(Error::InvalidData("feed called after finish".to_string()));
        }

        // 区切り文字が前回の断片との境界をまたぐ場合があるので、少し手前から探す
        let mut search_from = self
            .tail
            .len()
            .saturating_sub(self.delimiter.len() - 1);
        self.tail.extend_from_slice(data);

        let mut start = 0;
        while let Some(pos) = find_delimiter(&self.tail[search_from..], &self.delimiter) {
            let end = search_from + pos;
            self.ready.push_back(self.tail[start..end].to_vec());
            start = end + self.delimiter.len();
            search_from = start;
        }
        self.tail.drain(..start);

        if self.tail.len() > self.max_chunk_size {
            return Err(Error::ChunkTooLarge {
                size: self.tail.len(),
                limit: self.max_chunk_size,
            });
        }
        Ok(())
    }

    /// ストリーム終端を通知
    ///
    /// 未確定データがあれば区切り文字なしの最後のチャンクとして確定する。
    /// 2 回目以降の呼び出しは何もしない。
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        if !self.tail.is_empty() {
            self.ready.push_back(std::mem::take(&mut self.tail));
        }
        self.finished = true;
    }

    /// 最も古い確定済みチャンクを取り出す
    pub fn pop_ready(&mut self) -> Option<Vec<u8>> {
        self.ready.pop_front()
    }

    /// 確定済みチャンク数を取得
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// 未確定データを取得
    pub fn pending(&self) -> &[u8] {
        &self.tail
    }

    /// ストリーム終端が通知済みかどうか
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 終端が通知済みで、取り出していないチャンクも残っていないかどうか
    pub fn is_drained(&self) -> bool {
        self.finished && self.ready.is_empty()
    }
}

fn find_delimiter(haystack: &[u8], delimiter: &[u8]) -> Option<usize> {
    haystack.windows(delimiter.len()).position(|w| w == delimiter)
}
