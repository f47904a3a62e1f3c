//! ストリーミングボディを区切り文字ごとに表示する例
//!
//! 使い方:
//!   cargo run -p http11_stream_tail -- http://localhost:8080/feed
//!   cargo run -p http11_stream_tail -- --delimiter '\n' --timeout 10 https://example.com/events
//!   cargo run -p http11_stream_tail -- --workers 4 http://localhost:8080/jobs

use std::time::Duration;

use tokio_http11_stream::{
    ChunkExt, Page, StreamOptions, get_streamed_pages, get_streamed_pages_iterator,
};
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "http11_stream_tail";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --debug フラグ
    let debug: bool = noargs::flag("debug")
        .doc("Enable debug logging")
        .take(&mut args)
        .is_present();

    // --delimiter オプション
    let delimiter: String = noargs::opt("delimiter")
        .short('d')
        .doc("Chunk delimiter, \\r and \\n are unescaped (default: \\r\\n)")
        .default("\\r\\n")
        .take(&mut args)
        .then(|o| Ok::<_, &str>(unescape(o.value())))
        .map_err(|e| format!("{:?}", e))?;

    // --timeout オプション
    let timeout: Option<u64> = noargs::opt("timeout")
        .short('t')
        .doc("Connect and inactivity timeout in seconds")
        .take(&mut args)
        .present_and_then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --workers オプション
    let workers: usize = noargs::opt("workers")
        .short('w')
        .doc("Number of concurrent consumers (default: 1)")
        .default("1")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 位置引数: URL
    let url: String = noargs::arg("<URL>")
        .doc("URL to stream (e.g., http://localhost:8080/feed)")
        .take(&mut args)
        .then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        return Ok(());
    }

    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut options = StreamOptions::new().delimiter(delimiter.into_bytes());
    if let Some(secs) = timeout {
        options = options.timeout(Duration::from_secs(secs));
    }

    if workers <= 1 {
        tail(&url, options).await?;
    } else {
        tail_concurrently(&url, options, workers).await?;
    }
    Ok(())
}

fn unescape(value: &str) -> String {
    value.replace("\\r", "\r").replace("\\n", "\n")
}

fn print_chunk(prefix: &str, chunk: &[u8]) {
    match chunk.text() {
        Ok(text) => println!("{}{}", prefix, text),
        Err(_) => println!("{}{:?}", prefix, chunk),
    }
}

/// 遅延シーケンスで 1 チャンクずつ表示する
async fn tail(url: &str, options: StreamOptions) -> Result<(), tokio_http11_stream::Error> {
    let mut count = 0usize;
    let mut page = get_streamed_pages(url, options).await?;
    while let Page::Chunk(chunk, next) = page {
        print_chunk("", &chunk);
        count += 1;
        page = next.await?;
    }
    tracing::info!(count, "end of stream");
    Ok(())
}

/// 並行イテレーターを複数のタスクで共有して表示する
async fn tail_concurrently(
    url: &str,
    options: StreamOptions,
    workers: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let pages = get_streamed_pages_iterator(url, options);
    let tasks: Vec<_> = (0..workers)
        .map(|id| {
            let pages = pages.clone();
            tokio::spawn(async move {
                let prefix = format!("[{}] ", id);
                let mut count = 0usize;
                while let Some(chunk) = pages.next().await? {
                    print_chunk(&prefix, &chunk);
                    count += 1;
                }
                tracing::debug!(worker = id, count, "worker finished");
                Ok::<_, tokio_http11_stream::Error>(count)
            })
        })
        .collect();

    let mut total = 0;
    for task in tasks {
        total += task.await??;
    }
    tracing::info!(count = total, workers, "end of stream");
    Ok(())
}
