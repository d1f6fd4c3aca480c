//! 디스크의 binlog 파일을 RawEvent 스트림으로 바꾸는 입력 소스
//!
//! 파일 구조: 매직 넘버 (4 bytes) + 이벤트들.
//! 각 이벤트의 길이는 공통 헤더의 event length 필드로 정해진다.

use crate::binlog::BinlogParser;
use crate::error::{BinlogError, Result};
use crate::events::{RawEvent, EVENT_HEADER_SIZE};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info};

const MAGIC_LEN: usize = 4;
const EVENT_LENGTH_OFFSET: usize = 9;

/// 파일 내용을 이벤트 단위로 자른다
pub fn split_events(data: impl Into<Bytes>) -> Result<Vec<RawEvent>> {
    let data: Bytes = data.into();
    BinlogParser::verify_magic(&data)?;

    let mut events = Vec::new();
    let mut offset = MAGIC_LEN;
    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < EVENT_HEADER_SIZE {
            return Err(BinlogError::BinlogParseError(format!(
                "truncated event header at offset {}: {} bytes left",
                offset, remaining
            )));
        }

        let length = LittleEndian::read_u32(
            &data[offset + EVENT_LENGTH_OFFSET..offset + EVENT_LENGTH_OFFSET + 4],
        ) as usize;
        if length < EVENT_HEADER_SIZE {
            return Err(BinlogError::BinlogParseError(format!(
                "invalid event length {} at offset {}",
                length, offset
            )));
        }
        if length > remaining {
            return Err(BinlogError::BinlogParseError(format!(
                "truncated event at offset {}: length {}, {} bytes left",
                offset, length, remaining
            )));
        }

        events.push(RawEvent::new(data.slice(offset..offset + length)));
        offset += length;
    }

    debug!("Split {} events from {} bytes", events.len(), data.len());
    Ok(events)
}

/// 파일을 읽어 이벤트를 채널로 흘려보낸다.
///
/// 모든 이벤트를 보내면 (또는 수신자가 사라지면) 채널이 닫힌다.
pub async fn stream_file(
    path: impl AsRef<Path>,
    capacity: usize,
) -> Result<mpsc::Receiver<RawEvent>> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let events = split_events(data)?;
    info!("Read {} events from {}", events.len(), path.display());

    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        for event in events {
            if tx.send(event).await.is_err() {
                debug!("Event receiver dropped, stop feeding binlog file");
                break;
            }
        }
    });

    Ok(rx)
}
