//! Binlog 스트리밍 관련 에러 타입

use crate::events::{EventType, RawEvent};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinlogError {
    #[error("can't parse binlog event, invalid data: {0}")]
    InvalidEvent(RawEvent),

    #[error("got a real event before FORMAT_DESCRIPTION_EVENT: {0}")]
    EventBeforeFormat(RawEvent),

    #[error(
        "can't parse FORMAT_DESCRIPTION_EVENT: invalid header length = {header_length}, event data: {event}"
    )]
    InvalidHeaderLength { header_length: u8, event: RawEvent },

    #[error("can't parse FORMAT_DESCRIPTION_EVENT: {reason}, event data: {event}")]
    InvalidFormat { reason: String, event: RawEvent },

    #[error(
        "can't get query from binlog event: SQL query position = {offset}, which is outside buffer of length {length}, event data: {event}"
    )]
    InvalidQueryOffset {
        offset: usize,
        length: usize,
        event: RawEvent,
    },

    #[error("can't parse ROTATE_EVENT: invalid file name {name:?}, event data: {event}")]
    InvalidRotate { name: String, event: RawEvent },

    #[error(
        "binlog event checksum mismatch: stored {stored:#010x}, computed {computed:#010x}, event data: {event}"
    )]
    ChecksumMismatch {
        stored: u32,
        computed: u32,
        event: RawEvent,
    },

    #[error("can't parse {kind}: {reason}, event data: {event}")]
    Malformed {
        kind: EventType,
        reason: String,
        event: RawEvent,
    },

    #[error("send reply error: {0}")]
    SendReply(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Binlog 파싱 에러: {0}")]
    BinlogParseError(String),

    #[error("I/O 에러: {0}")]
    IoError(String),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<io::Error> for BinlogError {
    fn from(err: io::Error) -> Self {
        BinlogError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BinlogError>;
