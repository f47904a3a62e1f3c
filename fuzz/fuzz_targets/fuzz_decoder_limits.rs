#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_stream::{ChunkSplitter, DecoderLimits, ResponseDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzLimits {
    max_buffer_size: u16,
    max_headers_count: u16,
    max_header_line_size: u16,
    max_chunk_line_size: u8,
    max_chunk_size: u16,
    data: Vec<u8>,
}

fn build_limits(input: &FuzzLimits) -> DecoderLimits {
    DecoderLimits {
        max_buffer_size: input.max_buffer_size as usize,
        max_headers_count: input.max_headers_count as usize,
        max_header_line_size: input.max_header_line_size as usize,
        max_chunk_line_size: input.max_chunk_line_size as usize,
        max_chunk_size: input.max_chunk_size as usize,
    }
}

fuzz_target!(|input: FuzzLimits| {
    let limits = build_limits(&input);

    let mut decoder = ResponseDecoder::with_limits(limits.clone());
    if decoder.feed(&input.data).is_ok() && matches!(decoder.decode_headers(), Ok(Some(_))) {
        let mut body = Vec::new();
        let _ = decoder.take_body(&mut body);
    }

    if let Ok(mut splitter) = ChunkSplitter::with_limits(b"\r\n", &limits) {
        if splitter.feed(&input.data).is_ok() {
            assert!(splitter.pending().len() <= limits.max_chunk_size);
        }
    }
});
