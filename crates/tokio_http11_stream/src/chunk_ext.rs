//! チャンク拡張トレイト
//!
//! 区切られたチャンクをテキストや JSON として読むためのメソッドを追加する。
//! NDJSON のように 1 行 1 ドキュメントのストリームで使う。

use std::str::Utf8Error;

/// チャンク拡張トレイト
pub trait ChunkExt {
    /// チャンクを UTF-8 文字列として取得
    fn text(&self) -> Result<&str, Utf8Error>;

    /// チャンクを JSON としてパースして型 T に変換
    ///
    /// 前後の空白は無視する。
    fn json<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>;
}

impl ChunkExt for [u8] {
    fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self)
    }

    fn json<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>,
    {
        let text = std::str::from_utf8(self).map_err(JsonError::Utf8)?;
        let raw = nojson::RawJson::parse(text.trim()).map_err(JsonError::Parse)?;
        let value: T = raw.value().try_into().map_err(JsonError::Parse)?;
        Ok(value)
    }
}

/// チャンクを JSON として読めなかった
#[derive(Debug)]
pub enum JsonError {
    /// チャンクが UTF-8 として不正
    Utf8(Utf8Error),
    /// チャンクが JSON として不正、または型 T に変換できない
    Parse(nojson::JsonParseError),
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonError::Utf8(e) => write!(f, "chunk is not valid UTF-8: {}", e),
            JsonError::Parse(e) => write!(f, "chunk is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JsonError::Utf8(e) => Some(e),
            JsonError::Parse(e) => Some(e),
        }
    }
}
