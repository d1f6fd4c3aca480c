//! Binlog 이벤트 채널을 트랜잭션 스트림으로 바꾸는 스트리머
//!
//! 처리 흐름:
//! 1. 입력 채널에서 RawEvent 수신 (정지 신호와 경쟁)
//! 2. EventDecoder로 디코딩
//! 3. TransactionAssembler로 트랜잭션 조립
//! 4. 완성된 트랜잭션을 전달 콜백으로 넘김

use crate::assembler::TransactionAssembler;
use crate::binlog::EventDecoder;
use crate::error::{BinlogError, Result};
use crate::events::RawEvent;
use crate::gtid::ReplicationPosition;
use crate::service::ServiceManager;
use crate::transaction::BinlogTransaction;
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// 스트리머 설정
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// 이 데이터베이스의 문장만 전달 (None이면 전체)
    pub database: Option<String>,
    /// rotate 이벤트를 보기 전까지 사용할 위치
    pub start_position: ReplicationPosition,
    /// CRC32 체크섬 검증 여부
    pub verify_checksum: bool,
    /// 입력 채널 버퍼 크기
    pub channel_capacity: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        StreamerConfig {
            database: None,
            start_position: ReplicationPosition::default(),
            verify_checksum: true,
            channel_capacity: 1024,
        }
    }
}

/// 전달 콜백의 결과
#[derive(Debug)]
pub enum Delivery {
    Delivered,
    /// 소비자가 스트림 종료를 요청함 (에러 아님)
    StopRequested,
    Failed(Box<dyn Error + Send + Sync>),
}

impl Delivery {
    pub fn failed(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Delivery::Failed(err.into())
    }
}

/// 에러 없이 끝난 실행의 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// 입력 채널이 닫힘
    InputClosed,
    /// 전달 콜백이 종료를 요청함
    StopRequested,
    /// stop()으로 취소됨
    Cancelled,
}

pub type StreamOutcome = Result<StreamEnd>;

/// 입력 채널을 끝까지 (또는 정지/에러까지) 처리한다.
///
/// 정지 신호가 오면 더 이상 입력을 처리하지 않고, 아직 커밋되지 않은
/// 트랜잭션은 전달하지 않고 버린다.
pub async fn parse_events<F>(
    svm: &ServiceManager,
    config: &StreamerConfig,
    mut events: mpsc::Receiver<RawEvent>,
    mut deliver: F,
) -> StreamOutcome
where
    F: FnMut(&BinlogTransaction) -> Delivery,
{
    let mut decoder = EventDecoder::new(config.verify_checksum);
    let mut assembler =
        TransactionAssembler::new(config.start_position).with_database(config.database.clone());
    let mut shutdown = svm.shutting_down();

    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.wait() => {
                if assembler.is_open() {
                    debug!(
                        "Dropping {} uncommitted statements on shutdown",
                        assembler.pending_statements()
                    );
                }
                return Ok(StreamEnd::Cancelled);
            }
            event = events.recv() => event,
        };

        let Some(event) = event else {
            return Ok(StreamEnd::InputClosed);
        };

        let decoded = decoder.decode(&event)?;
        let Some(trans) = assembler.push(decoded) else {
            continue;
        };

        debug!(
            "Delivering transaction: {} statements at {}",
            trans.statements.len(),
            trans.position
        );
        match deliver(&trans) {
            Delivery::Delivered => {}
            Delivery::StopRequested => return Ok(StreamEnd::StopRequested),
            Delivery::Failed(err) => return Err(BinlogError::SendReply(err)),
        }
    }
}

/// ServiceManager 아래에서 parse_events를 실행하는 스트리머
pub struct BinlogStreamer {
    config: StreamerConfig,
    svm: ServiceManager,
    outcome: Arc<Mutex<Option<StreamOutcome>>>,
}

impl BinlogStreamer {
    pub fn new(config: StreamerConfig) -> Self {
        BinlogStreamer {
            config,
            svm: ServiceManager::new(),
            outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// 스트리밍 시작. 이미 실행 중이면 false.
    pub fn start<F>(&self, events: mpsc::Receiver<RawEvent>, deliver: F) -> bool
    where
        F: FnMut(&BinlogTransaction) -> Delivery + Send + 'static,
    {
        let config = self.config.clone();
        let outcome = self.outcome.clone();

        self.svm.go(move |svm| async move {
            outcome.lock().take();
            info!("Binlog streaming started at position {}", config.start_position);

            let result = parse_events(&svm, &config, events, deliver).await;
            match &result {
                Ok(end) => info!("Binlog streaming ended: {:?}", end),
                Err(e) => error!("Binlog streaming error: {}", e),
            }
            *outcome.lock() = Some(result);
        })
    }

    /// 실행 중인 스트림을 취소하고 종료를 기다린다
    pub async fn stop(&self) -> bool {
        info!("Stopping binlog streamer");
        self.svm.stop().await
    }

    /// 현재 (또는 가장 최근) 실행이 끝날 때까지 기다린 뒤 그 결과를 꺼낸다.
    ///
    /// 결과는 한 번만 꺼낼 수 있다.
    pub async fn wait(&self) -> Option<StreamOutcome> {
        self.svm.wait().await;
        self.outcome.lock().take()
    }

    pub fn is_running(&self) -> bool {
        self.svm.is_running()
    }

    pub fn state_name(&self) -> &'static str {
        self.svm.state_name()
    }
}
