/// Binlog 트랜잭션 스트리머 사용 예제
///
/// 이 프로그램은 binlog 파일을 읽어 커밋된 트랜잭션을 JSON 한 줄씩 출력합니다.
use binlog_streamer::binlog_file::stream_file;
use binlog_streamer::{
    BinlogStreamer, BinlogTransaction, Delivery, ReplicationPosition, StreamEnd, StreamerConfig,
};
use std::env;
use tracing::{error, info};

fn print_transaction(trans: &BinlogTransaction) -> Delivery {
    match trans.to_json() {
        Ok(json) => {
            println!("{}", json);
            Delivery::Delivered
        }
        Err(e) => Delivery::failed(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 초기화
    tracing_subscriber::fmt::init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("BINLOG_FILE").ok())
        .unwrap_or_else(|| "mysql-bin.000001".to_string());

    // 스트리머 설정
    let config = StreamerConfig {
        database: env::var("DB_NAME").ok().filter(|db| !db.is_empty()),
        start_position: ReplicationPosition::from_file_name(&path).unwrap_or_default(),
        verify_checksum: env::var("BINLOG_VERIFY_CHECKSUM")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        channel_capacity: env::var("BINLOG_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| "1024".to_string())
            .parse()
            .unwrap_or(1024),
    };

    info!("Streaming binlog file {}", path);
    let events = stream_file(&path, config.channel_capacity).await?;

    let streamer = BinlogStreamer::new(config);
    if !streamer.start(events, print_transaction) {
        return Err("binlog streamer is already running".into());
    }

    let outcome = tokio::select! {
        outcome = streamer.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping streamer");
            streamer.stop().await;
            streamer.wait().await
        }
    };

    match outcome {
        Some(Ok(StreamEnd::InputClosed)) => info!("Reached end of binlog file"),
        Some(Ok(end)) => info!("Streaming stopped: {:?}", end),
        Some(Err(e)) => {
            error!("Streaming failed: {}", e);
            return Err(e.into());
        }
        None => info!("Streamer exited without a result"),
    }

    Ok(())
}
