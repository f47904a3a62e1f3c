//! ストリーム取得のオプション

use std::sync::Arc;
use std::time::Duration;

use rustls::ClientConfig;
use shiguredo_http11_stream::{DEFAULT_DELIMITER, DecoderLimits};

/// ストリーム取得のオプション
///
/// ```ignore
/// use std::time::Duration;
/// use tokio_http11_stream::StreamOptions;
///
/// let options = StreamOptions::new()
///     .timeout(Duration::from_secs(5))
///     .delimiter(b"\n")
///     .header("Accept", "application/x-ndjson");
/// ```
#[derive(Clone)]
pub struct StreamOptions {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) delimiter: Vec<u8>,
    pub(crate) method: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) tls_config: Option<Arc<ClientConfig>>,
    pub(crate) limits: DecoderLimits,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("delimiter", &String::from_utf8_lossy(&self.delimiter))
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("tls_config", &self.tls_config.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

impl StreamOptions {
    /// デフォルト設定を作成
    ///
    /// - 接続タイムアウト: 30 秒
    /// - 無通信タイムアウト: なし
    /// - 区切り文字: `\r\n`
    /// - メソッド: GET
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            delimiter: DEFAULT_DELIMITER.to_vec(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            tls_config: None,
            limits: DecoderLimits::default(),
        }
    }

    /// 接続タイムアウトと無通信タイムアウトをまとめて設定
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.read_timeout = Some(timeout);
        self
    }

    /// 接続タイムアウトを設定
    ///
    /// DNS 解決、TCP 接続、TLS ハンドシェイク、リクエスト送信までの合計時間
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 無通信タイムアウトを設定
    ///
    /// 接続後、受信が途絶えてからこの時間が経つとストリームを失敗させる
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// チャンクの区切り文字を設定
    pub fn delimiter(mut self, delimiter: impl Into<Vec<u8>>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// メソッドを設定
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// ヘッダーを追加
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// リクエストボディを設定
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// TLS 設定を指定 (HTTPS 用)
    ///
    /// 指定しない場合は OS のルート証明書ストアを使用する
    pub fn tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// デコーダーの制限を設定
    pub fn limits(mut self, limits: DecoderLimits) -> Self {
        self.limits = limits;
        self
    }
}
