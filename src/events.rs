//! Binlog 이벤트 타입 및 데이터 구조 정의

use crate::gtid::Gtid;
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 모든 이벤트가 공유하는 공통 헤더 크기
pub const EVENT_HEADER_SIZE: usize = 19;

/// Google MySQL 확장 헤더 크기 (공통 헤더 + 8바이트 group id)
pub const GOOGLE_EVENT_HEADER_SIZE: usize = 27;

/// MySQL Binlog 이벤트 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    /// 알 수 없는 이벤트 (무시됨)
    Unknown = 0,
    /// 쿼리 이벤트 (BEGIN, COMMIT, ROLLBACK, DDL, DML)
    QueryEvent = 2,
    /// 로테이션 이벤트 (새 binlog 파일)
    RotateEvent = 4,
    /// INSERT_ID / LAST_INSERT_ID 세션 변수
    IntVarEvent = 5,
    /// RAND() 시드
    RandEvent = 13,
    /// 포맷 디스크립터 이벤트
    FormatDescriptionEvent = 15,
    /// 스토리지 엔진 커밋 마커
    XidEvent = 16,
    /// GTID 이벤트 (MySQL 5.6+)
    GtidEvent = 33,
    /// 익명 GTID 이벤트
    AnonymousGtidEvent = 34,
}

impl EventType {
    pub fn from_u8(val: u8) -> Self {
        match val {
            2 => EventType::QueryEvent,
            4 => EventType::RotateEvent,
            5 => EventType::IntVarEvent,
            13 => EventType::RandEvent,
            15 => EventType::FormatDescriptionEvent,
            16 => EventType::XidEvent,
            33 => EventType::GtidEvent,
            34 => EventType::AnonymousGtidEvent,
            _ => EventType::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventType::Unknown => "UNKNOWN_EVENT",
            EventType::QueryEvent => "QUERY_EVENT",
            EventType::RotateEvent => "ROTATE_EVENT",
            EventType::IntVarEvent => "INTVAR_EVENT",
            EventType::RandEvent => "RAND_EVENT",
            EventType::FormatDescriptionEvent => "FORMAT_DESCRIPTION_EVENT",
            EventType::XidEvent => "XID_EVENT",
            EventType::GtidEvent => "GTID_EVENT",
            EventType::AnonymousGtidEvent => "ANONYMOUS_GTID_EVENT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binlog 이벤트 헤더
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// 이벤트 타임스탬프 (초 단위)
    pub timestamp: u32,
    /// 이벤트 타입
    pub event_type: EventType,
    /// 원시 타입 코드
    pub type_code: u8,
    /// MySQL 서버 ID
    pub server_id: u32,
    /// 이벤트 길이 (바이트)
    pub event_length: u32,
    /// 다음 이벤트 위치
    pub next_pos: u32,
    /// 이벤트 플래그
    pub flags: u16,
}

/// 전송 계층에서 넘어온 가공되지 않은 이벤트 한 개.
///
/// 생성된 뒤에는 변경되지 않으며, 디코더가 한 번 읽고 버린다.
#[derive(Clone, PartialEq, Eq)]
pub struct RawEvent {
    data: Bytes,
}

impl RawEvent {
    pub fn new(data: impl Into<Bytes>) -> Self {
        RawEvent { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 공통 헤더를 담을 수 있고, 길이 필드가 실제 버퍼 길이와 일치하는지 확인
    pub fn is_valid(&self) -> bool {
        self.data.len() >= EVENT_HEADER_SIZE && self.data.len() == self.event_length() as usize
    }

    pub fn timestamp(&self) -> u32 {
        self.read_u32(0)
    }

    pub fn type_code(&self) -> u8 {
        self.data.get(4).copied().unwrap_or(0)
    }

    pub fn event_type(&self) -> EventType {
        EventType::from_u8(self.type_code())
    }

    pub fn server_id(&self) -> u32 {
        self.read_u32(5)
    }

    pub fn event_length(&self) -> u32 {
        self.read_u32(9)
    }

    pub fn next_position(&self) -> u32 {
        self.read_u32(13)
    }

    pub fn flags(&self) -> u16 {
        self.data
            .get(17..19)
            .map(LittleEndian::read_u16)
            .unwrap_or(0)
    }

    pub fn is_format_description(&self) -> bool {
        self.event_type() == EventType::FormatDescriptionEvent
    }

    pub fn is_rotate(&self) -> bool {
        self.event_type() == EventType::RotateEvent
    }

    // 헤더보다 짧은 버퍼에서는 0을 돌려준다; 유효성은 is_valid()가 판단
    fn read_u32(&self, offset: usize) -> u32 {
        self.data
            .get(offset..offset + 4)
            .map(LittleEndian::read_u32)
            .unwrap_or(0)
    }
}

impl fmt::Debug for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawEvent({:02x?})", &self.data[..])
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", &self.data[..])
    }
}

impl From<Vec<u8>> for RawEvent {
    fn from(data: Vec<u8>) -> Self {
        RawEvent::new(data)
    }
}

impl From<&'static [u8]> for RawEvent {
    fn from(data: &'static [u8]) -> Self {
        RawEvent::new(Bytes::from_static(data))
    }
}

/// Binlog 체크섬 알고리즘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    /// 체크섬을 지원하지 않는 서버 (5.6.1 미만)
    Absent,
    /// 체크섬 지원 서버이지만 비활성화됨
    Off,
    /// zlib CRC32
    Crc32,
    /// 알 수 없는 알고리즘
    Unknown(u8),
}

impl ChecksumAlgorithm {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => ChecksumAlgorithm::Off,
            1 => ChecksumAlgorithm::Crc32,
            other => ChecksumAlgorithm::Unknown(other),
        }
    }
}

/// 포맷 디스크립터 (스트림마다 한 번 디코딩)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// binlog 포맷 버전 (보통 4)
    pub binlog_version: u16,
    /// 서버 버전 문자열 (e.g., "5.7.30-log")
    pub server_version: String,
    /// 생성 타임스탬프
    pub create_timestamp: u32,
    /// 이후 모든 이벤트의 헤더 길이
    pub header_length: u8,
    /// 이벤트 타입별 post-header 길이 (index = type code - 1)
    pub post_header_lengths: Vec<u8>,
    /// 체크섬 알고리즘
    pub checksum_alg: ChecksumAlgorithm,
}

impl FormatDescriptor {
    pub fn post_header_len(&self, event_type: EventType) -> Option<u8> {
        (event_type as usize)
            .checked_sub(1)
            .and_then(|idx| self.post_header_lengths.get(idx).copied())
    }

    /// 이벤트 끝에 붙는 체크섬 길이
    pub fn checksum_len(&self) -> usize {
        match self.checksum_alg {
            ChecksumAlgorithm::Crc32 => 4,
            _ => 0,
        }
    }

    /// Google MySQL 확장 헤더 사용 여부
    pub fn has_group_id(&self) -> bool {
        self.header_length as usize >= GOOGLE_EVENT_HEADER_SIZE
    }
}

/// 회전 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateEventData {
    /// 새 바이너리 로그 파일명
    pub next_binlog_name: String,
    /// 새 파일의 시작 위치
    pub position: u64,
    /// 파일명의 숫자 접미사 (e.g., "mysql-bin.000003" → 3)
    pub file_sequence: u64,
}

/// 쿼리 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEventData {
    /// 스레드 ID
    pub thread_id: u32,
    /// 실행 시간 (초)
    pub exec_time: u32,
    /// 에러 코드
    pub error_code: u16,
    /// 기본 데이터베이스명
    pub database: String,
    /// SQL 텍스트
    pub sql: Vec<u8>,
}

/// INTVAR 이벤트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntVarKind {
    LastInsertId,
    InsertId,
}

impl IntVarKind {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            1 => Some(IntVarKind::LastInsertId),
            2 => Some(IntVarKind::InsertId),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntVarKind::LastInsertId => "LAST_INSERT_ID",
            IntVarKind::InsertId => "INSERT_ID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntVarData {
    pub kind: IntVarKind,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandData {
    pub seed1: u64,
    pub seed2: u64,
}

/// 디코딩된 이벤트 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinlogEventData {
    Rotate(RotateEventData),
    FormatDescription(FormatDescriptor),
    Query(QueryEventData),
    Xid(u64),
    IntVar(IntVarData),
    Rand(RandData),
    /// GTID 이벤트 자체 (GTID 값은 BinlogEvent::gtid에 담김)
    Gtid,
    Unknown,
}

/// 완성된 Binlog 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogEvent {
    /// 이벤트 헤더
    pub header: EventHeader,
    /// 이 이벤트가 전달하는 GTID (Google group id 또는 GTID_EVENT)
    pub gtid: Option<Gtid>,
    /// 이벤트 데이터
    pub data: BinlogEventData,
}
