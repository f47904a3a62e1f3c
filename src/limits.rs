/// デコーダーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    /// 最大バッファサイズ (デフォルト: 64KB)
    ///
    /// 未処理の受信データ (レスポンスヘッダー、チャンクサイズ行など) の上限。
    pub max_buffer_size: usize,
    /// 最大ヘッダー数 (デフォルト: 100)
    pub max_headers_count: usize,
    /// 最大ヘッダー行長 (デフォルト: 8KB)
    pub max_header_line_size: usize,
    /// 最大チャンクサイズ行長 (デフォルト: 64バイト)
    ///
    /// chunked 転送エンコーディングのチャンクサイズ行の最大長。
    pub max_chunk_line_size: usize,
    /// 区切り文字で分割される 1 チャンクの最大長 (デフォルト: 1MB)
    ///
    /// ストリーミングボディ自体の長さは無制限だが、区切り文字が現れないまま
    /// 溜め込めるバイト数はこの値で制限する。
    pub max_chunk_size: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 64 * 1024, // 64KB
            max_headers_count: 100,
            max_header_line_size: 8 * 1024, // 8KB
            max_chunk_line_size: 64,        // 64 bytes
            max_chunk_size: 1024 * 1024,    // 1MB
        }
    }
}

impl DecoderLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_headers_count: usize::MAX,
            max_header_line_size: usize::MAX,
            max_chunk_line_size: usize::MAX,
            max_chunk_size: usize::MAX,
        }
    }
}
