//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// ボディ生成
// ========================================

/// 区切り文字を含まない 1 行分のバイト列
pub fn line(delimiter: &[u8], max_len: usize) -> impl Strategy<Value = Vec<u8>> + use<> {
    let delimiter = delimiter.to_vec();
    proptest::collection::vec(any::<u8>(), 0..=max_len)
        .prop_filter("line must not contain delimiter", move |line| {
            !line.windows(delimiter.len()).any(|w| w == delimiter.as_slice())
        })
}

/// 区切り文字: 1-4 バイト
pub fn delimiter() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(b"\r\n".to_vec()),
        Just(b"\n".to_vec()),
        Just(b"--".to_vec()),
        proptest::collection::vec(any::<u8>(), 1..=4),
    ]
}

/// 分割位置のヒント
///
/// `split_points` でボディの長さに合わせた分割位置に変換する。
pub fn split_hints() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(any::<usize>(), 0..16)
}

/// ヒントから昇順で重複のない分割位置を作る
pub fn split_points(hints: &[usize], len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let mut points: Vec<usize> = hints.iter().map(|h| h % (len + 1)).collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// 分割位置でバイト列を断片に分ける
pub fn fragments<'a>(data: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut result = Vec::with_capacity(points.len() + 1);
    let mut start = 0;
    for &point in points {
        result.push(&data[start..point]);
        start = point;
    }
    result.push(&data[start..]);
    result
}

/// チャンクを区切り文字で連結する (末尾に区切り文字は付けない)
pub fn join(chunks: &[Vec<u8>], delimiter: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            body.extend_from_slice(delimiter);
        }
        body.extend_from_slice(chunk);
    }
    body
}

/// chunked 転送符号化でエンコードする
pub fn encode_chunked(pieces: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for piece in pieces.iter().filter(|p| !p.is_empty()) {
        out.extend_from_slice(format!("{:x}\r\n", piece.len()).as_bytes());
        out.extend_from_slice(piece);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}
