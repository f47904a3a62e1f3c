#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_stream::ChunkSplitter;

#[derive(Arbitrary, Debug)]
struct FuzzSplitter {
    delimiter: Vec<u8>,
    fragments: Vec<Vec<u8>>,
}

fn split(delimiter: &[u8], fragments: &[&[u8]]) -> Option<Vec<Vec<u8>>> {
    let mut splitter = ChunkSplitter::with_delimiter(delimiter).ok()?;
    for fragment in fragments {
        splitter.feed(fragment).ok()?;
    }
    splitter.finish();
    splitter.finish();
    let mut chunks = Vec::new();
    while let Some(chunk) = splitter.pop_ready() {
        chunks.push(chunk);
    }
    assert!(splitter.is_drained());
    Some(chunks)
}

fuzz_target!(|input: FuzzSplitter| {
    if input.delimiter.is_empty() {
        assert!(ChunkSplitter::with_delimiter(&input.delimiter).is_err());
        return;
    }

    let fragments: Vec<&[u8]> = input.fragments.iter().map(Vec::as_slice).collect();
    let body = input.fragments.concat();

    // 分割位置によらず同じチャンク列になる
    let Some(fragmented) = split(&input.delimiter, &fragments) else {
        return;
    };
    let Some(whole) = split(&input.delimiter, &[&body]) else {
        return;
    };
    assert_eq!(fragmented, whole);

    // チャンクと区切り文字を連結すると元のボディ (または末尾に区切り文字を足したもの) になる
    let mut reconstructed = Vec::new();
    for chunk in &whole {
        reconstructed.extend_from_slice(chunk);
        reconstructed.extend_from_slice(&input.delimiter);
    }
    let mut with_trailing = body.clone();
    with_trailing.extend_from_slice(&input.delimiter);
    assert!(reconstructed == body || reconstructed == with_trailing);
});
