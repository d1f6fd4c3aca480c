//! MySQL Binlog 트랜잭션 스트리머 핵심 구현
//!
//! 이 라이브러리는 MySQL 바이너리 로그 이벤트를 논리 트랜잭션으로 묶어 전달합니다.
//! 주요 기능:
//! - Binlog 이벤트 디코딩 (FORMAT_DESCRIPTION, ROTATE, QUERY, XID 등)
//! - 트랜잭션 경계 조립 (BEGIN/COMMIT/ROLLBACK/XID)
//! - 복제 위치 (GTID 대응값) 관리
//! - 취소 가능한 스트리밍 생명주기 관리

pub mod assembler;
pub mod binlog;
pub mod binlog_file;
pub mod error;
pub mod events;
pub mod gtid;
pub mod service;
pub mod streamer;
pub mod transaction;

#[cfg(test)]
mod testdata;

pub use assembler::TransactionAssembler;
pub use binlog::EventDecoder;
pub use error::{BinlogError, Result};
pub use events::{BinlogEvent, EventType, RawEvent};
pub use gtid::{Gtid, ReplicationPosition};
pub use service::{ServiceManager, ServiceState};
pub use streamer::{BinlogStreamer, Delivery, StreamEnd, StreamerConfig};
pub use transaction::{BinlogTransaction, Statement, StatementCategory};
