//! ResponseDecoder と ChunkSplitter を組み合わせたプロパティテスト

use pbt::{encode_chunked, fragments, join, line, split_hints, split_points};
use proptest::prelude::*;
use shiguredo_http11_stream::{BodyProgress, ChunkSplitter, DecoderLimits, Error, ResponseDecoder};

/// レスポンス全体を断片ごとに流し込み、得られたチャンクを返す
///
/// 受信ループと同じ手順でヘッダー、ボディ、分割器の順に進める。
fn receive(response: &[u8], points: &[usize]) -> (Vec<Vec<u8>>, bool) {
    let mut decoder = ResponseDecoder::new();
    let mut splitter = ChunkSplitter::with_delimiter(b"\n").unwrap();
    let mut head_decoded = false;
    let mut complete = false;

    for part in fragments(response, points) {
        decoder.feed(part).unwrap();
        if !head_decoded {
            if decoder.decode_headers().unwrap().is_none() {
                continue;
            }
            head_decoded = true;
        }
        let mut body = Vec::new();
        let progress = decoder.take_body(&mut body).unwrap();
        splitter.feed(&body).unwrap();
        if let BodyProgress::Complete { .. } = progress {
            complete = true;
            break;
        }
    }

    splitter.finish();
    let mut chunks = Vec::new();
    while let Some(chunk) = splitter.pop_ready() {
        chunks.push(chunk);
    }
    (chunks, complete)
}

fn expected_chunks(lines: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut expected = lines.to_vec();
    if expected.last().is_some_and(|l| l.is_empty()) {
        expected.pop();
    }
    expected
}

proptest! {
    #[test]
    fn chunked_body_yields_lines(
        lines in proptest::collection::vec(line(b"\n", 32), 0..16),
        chunk_hints in split_hints(),
        fragment_hints in split_hints(),
    ) {
        let body = join(&lines, b"\n");
        let chunk_points = split_points(&chunk_hints, body.len());
        let encoded_body = encode_chunked(&fragments(&body, &chunk_points));

        let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
        response.extend_from_slice(&encoded_body);

        let points = split_points(&fragment_hints, response.len());
        let (chunks, complete) = receive(&response, &points);
        prop_assert!(complete);
        prop_assert_eq!(chunks, expected_chunks(&lines));
    }
}

proptest! {
    #[test]
    fn content_length_body_yields_lines(
        lines in proptest::collection::vec(line(b"\n", 32), 0..16),
        fragment_hints in split_hints(),
    ) {
        let body = join(&lines, b"\n");
        let mut response =
            format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        response.extend_from_slice(&body);

        let points = split_points(&fragment_hints, response.len());
        let (chunks, complete) = receive(&response, &points);
        prop_assert!(complete);
        prop_assert_eq!(chunks, expected_chunks(&lines));
    }
}

proptest! {
    #[test]
    fn truncated_chunked_body_never_completes(
        lines in proptest::collection::vec(line(b"\n", 32), 1..16),
        cut in any::<prop::sample::Index>(),
    ) {
        let body = join(&lines, b"\n");
        let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
        let header_len = response.len();
        response.extend_from_slice(&encode_chunked(&[&body]));

        // 終端チャンクの手前までのどこかで切る
        let body_len = response.len() - header_len - b"0\r\n\r\n".len();
        let truncated = &response[..header_len + cut.index(body_len + 1)];
        let (_, complete) = receive(truncated, &[]);
        prop_assert!(!complete);
    }
}

proptest! {
    #[test]
    fn informational_responses_are_skipped(code in 100u16..200, count in 1usize..4) {
        prop_assume!(code != 101);
        let mut response = Vec::new();
        for _ in 0..count {
            response.extend_from_slice(format!("HTTP/1.1 {} Info\r\n\r\n", code).as_bytes());
        }
        response.extend_from_slice(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\na\nb");

        let mut decoder = ResponseDecoder::new();
        decoder.feed(&response).unwrap();
        let (head, _) = decoder.decode_headers().unwrap().unwrap();
        prop_assert_eq!(head.status_code, 200);
    }
}

proptest! {
    #[test]
    fn buffer_overflow(max_buffer_size in 64usize..4096) {
        let limits = DecoderLimits {
            max_buffer_size,
            ..Default::default()
        };
        let mut decoder = ResponseDecoder::with_limits(limits);
        let data = vec![b'a'; max_buffer_size + 1];
        let result = decoder.feed(&data);
        prop_assert!(matches!(result, Err(Error::BufferOverflow { .. })), "{:?}", result);
    }
}
