#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_http11_stream::{BodyProgress, ChunkSplitter, ResponseDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzResponse {
    data: Vec<u8>,
    split_hint: u8,
    expect_no_body: bool,
    eof: bool,
}

fuzz_target!(|input: FuzzResponse| {
    let split_size = (input.split_hint as usize).max(1);
    let mut decoder = ResponseDecoder::new();
    decoder.set_expect_no_body(input.expect_no_body);
    let mut splitter = ChunkSplitter::new();
    let mut head_decoded = false;

    for part in input.data.chunks(split_size) {
        if decoder.feed(part).is_err() {
            return;
        }
        if !head_decoded {
            match decoder.decode_headers() {
                Ok(Some(_)) => head_decoded = true,
                Ok(None) => continue,
                Err(_) => return,
            }
        }
        let mut body = Vec::new();
        match decoder.take_body(&mut body) {
            Ok(BodyProgress::Complete { .. }) => {
                let _ = splitter.feed(&body);
                assert!(decoder.is_complete());
                return;
            }
            Ok(BodyProgress::Continue) => {
                if splitter.feed(&body).is_err() {
                    return;
                }
            }
            Err(_) => return,
        }
    }

    if input.eof && head_decoded {
        decoder.mark_eof();
        let mut body = Vec::new();
        let _ = decoder.take_body(&mut body);
        splitter.finish();
    }
});
