//! 테스트용 이벤트 픽스처와 빌더
//!
//! 상수들은 Google MySQL 5.1 서버에서 캡처한 실제 이벤트 (27바이트 헤더).
//! 빌더는 표준 19바이트 헤더 이벤트를 만들며, 필요하면 CRC32 체크섬을 붙인다.

use crate::events::RawEvent;

/// 캡처된 이벤트들의 타임스탬프
pub(crate) const TIMESTAMP: u32 = 1407805592;

pub(crate) const ROTATE_EVENT: &[u8] = &[
    0x00, 0x00, 0x00, 0x00, 0x04, 0x88, 0xf3, 0x00, 0x00, 0x33, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x20, 0x00, 0x23, 0x03, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x76, 0x74, 0x2d, 0x30, 0x30, 0x30, 0x30, 0x30, 0x36,
    0x32, 0x33, 0x34, 0x34, 0x2d, 0x62, 0x69, 0x6e, 0x2e, 0x30, 0x30, 0x30,
    0x30, 0x30, 0x31,
];

pub(crate) const FORMAT_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x0f, 0x88, 0xf3, 0x00, 0x00, 0x66, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x35, 0x2e, 0x31,
    0x2e, 0x36, 0x33, 0x2d, 0x67, 0x6f, 0x6f, 0x67, 0x6c, 0x65, 0x2d, 0x6c,
    0x6f, 0x67, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x1b, 0x38, 0x0d, 0x00, 0x08, 0x00, 0x12, 0x00, 0x04,
    0x04, 0x04, 0x04, 0x12, 0x00, 0x00, 0x53, 0x00, 0x04, 0x1a, 0x08, 0x00,
    0x00, 0x00, 0x08, 0x08, 0x08, 0x02,
];

pub(crate) const BEGIN_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x02, 0x88, 0xf3, 0x00, 0x00, 0x58, 0x00, 0x00,
    0x00, 0xc2, 0x00, 0x00, 0x00, 0x08, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x03, 0x73, 0x74, 0x64, 0x04,
    0x21, 0x00, 0x21, 0x00, 0x21, 0x00, 0x76, 0x74, 0x5f, 0x74, 0x65, 0x73,
    0x74, 0x5f, 0x6b, 0x65, 0x79, 0x73, 0x70, 0x61, 0x63, 0x65, 0x00, 0x42,
    0x45, 0x47, 0x49, 0x4e,
];

pub(crate) const COMMIT_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x02, 0x88, 0xf3, 0x00, 0x00, 0x59, 0x00, 0x00,
    0x00, 0xc2, 0x00, 0x00, 0x00, 0x08, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x03, 0x73, 0x74, 0x64, 0x04,
    0x21, 0x00, 0x21, 0x00, 0x21, 0x00, 0x76, 0x74, 0x5f, 0x74, 0x65, 0x73,
    0x74, 0x5f, 0x6b, 0x65, 0x79, 0x73, 0x70, 0x61, 0x63, 0x65, 0x00, 0x43,
    0x4f, 0x4d, 0x4d, 0x49, 0x54,
];

pub(crate) const ROLLBACK_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x02, 0x88, 0xf3, 0x00, 0x00, 0x5b, 0x00, 0x00,
    0x00, 0xc2, 0x00, 0x00, 0x00, 0x08, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x03, 0x73, 0x74, 0x64, 0x04,
    0x21, 0x00, 0x21, 0x00, 0x21, 0x00, 0x76, 0x74, 0x5f, 0x74, 0x65, 0x73,
    0x74, 0x5f, 0x6b, 0x65, 0x79, 0x73, 0x70, 0x61, 0x63, 0x65, 0x00, 0x52,
    0x4f, 0x4c, 0x4c, 0x42, 0x41, 0x43, 0x4b,
];

pub(crate) const INSERT_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x02, 0x88, 0xf3, 0x00, 0x00, 0x9f, 0x00, 0x00,
    0x00, 0x61, 0x01, 0x00, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x03, 0x73, 0x74, 0x64, 0x04,
    0x21, 0x00, 0x21, 0x00, 0x21, 0x00, 0x76, 0x74, 0x5f, 0x74, 0x65, 0x73,
    0x74, 0x5f, 0x6b, 0x65, 0x79, 0x73, 0x70, 0x61, 0x63, 0x65, 0x00, 0x69,
    0x6e, 0x73, 0x65, 0x72, 0x74, 0x20, 0x69, 0x6e, 0x74, 0x6f, 0x20, 0x76,
    0x74, 0x5f, 0x61, 0x28, 0x65, 0x69, 0x64, 0x2c, 0x20, 0x69, 0x64, 0x29,
    0x20, 0x76, 0x61, 0x6c, 0x75, 0x65, 0x73, 0x20, 0x28, 0x31, 0x2c, 0x20,
    0x31, 0x29, 0x20, 0x2f, 0x2a, 0x20, 0x5f, 0x73, 0x74, 0x72, 0x65, 0x61,
    0x6d, 0x20, 0x76, 0x74, 0x5f, 0x61, 0x20, 0x28, 0x65, 0x69, 0x64, 0x20,
    0x69, 0x64, 0x20, 0x29, 0x20, 0x28, 0x31, 0x20, 0x31, 0x20, 0x29, 0x3b,
    0x20, 0x2a, 0x2f,
];

pub(crate) const CREATE_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x02, 0x88, 0xf3, 0x00, 0x00, 0xca, 0x00, 0x00,
    0x00, 0xed, 0x03, 0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0x00, 0x00, 0x1a, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x01, 0x00, 0x00,
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x03, 0x73, 0x74, 0x64, 0x04,
    0x08, 0x00, 0x08, 0x00, 0x21, 0x00, 0x76, 0x74, 0x5f, 0x74, 0x65, 0x73,
    0x74, 0x5f, 0x6b, 0x65, 0x79, 0x73, 0x70, 0x61, 0x63, 0x65, 0x00, 0x63,
    0x72, 0x65, 0x61, 0x74, 0x65, 0x20, 0x74, 0x61, 0x62, 0x6c, 0x65, 0x20,
    0x69, 0x66, 0x20, 0x6e, 0x6f, 0x74, 0x20, 0x65, 0x78, 0x69, 0x73, 0x74,
    0x73, 0x20, 0x76, 0x74, 0x5f, 0x69, 0x6e, 0x73, 0x65, 0x72, 0x74, 0x5f,
    0x74, 0x65, 0x73, 0x74, 0x20, 0x28, 0x0a, 0x69, 0x64, 0x20, 0x62, 0x69,
    0x67, 0x69, 0x6e, 0x74, 0x20, 0x61, 0x75, 0x74, 0x6f, 0x5f, 0x69, 0x6e,
    0x63, 0x72, 0x65, 0x6d, 0x65, 0x6e, 0x74, 0x2c, 0x0a, 0x6d, 0x73, 0x67,
    0x20, 0x76, 0x61, 0x72, 0x63, 0x68, 0x61, 0x72, 0x28, 0x36, 0x34, 0x29,
    0x2c, 0x0a, 0x70, 0x72, 0x69, 0x6d, 0x61, 0x72, 0x79, 0x20, 0x6b, 0x65,
    0x79, 0x20, 0x28, 0x69, 0x64, 0x29, 0x0a, 0x29, 0x20, 0x45, 0x6e, 0x67,
    0x69, 0x6e, 0x65, 0x3d, 0x49, 0x6e, 0x6e, 0x6f, 0x44, 0x42,
];

pub(crate) const XID_EVENT: &[u8] = &[
    0x98, 0x68, 0xe9, 0x53, 0x10, 0x88, 0xf3, 0x00, 0x00, 0x23, 0x00, 0x00,
    0x00, 0x4e, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x78, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// FORMAT_DESCRIPTION_EVENT의 header length 필드 오프셋
pub(crate) const FORMAT_HEADER_LENGTH_OFFSET: usize = 19 + 2 + 50 + 4;

/// 27바이트 헤더 쿼리 이벤트의 db name length 필드 오프셋
pub(crate) const QUERY_DB_LEN_OFFSET: usize = 27 + 8;

/// 캡처된 FORMAT_DESCRIPTION_EVENT의 post-header 길이 표
pub(crate) const POST_HEADER_LENGTHS: &[u8] = &[
    56, 13, 0, 8, 0, 18, 0, 4, 4, 4, 4, 18, 0, 0, 83, 0, 4, 26, 8, 0, 0, 0, 8, 8, 8, 2,
];

pub(crate) fn raw(data: &'static [u8]) -> RawEvent {
    RawEvent::from(data)
}

pub(crate) fn raw_all(events: &[&'static [u8]]) -> Vec<RawEvent> {
    events.iter().map(|ev| raw(ev)).collect()
}

/// 표준 19바이트 헤더 이벤트 생성
pub(crate) fn event(event_type: u8, timestamp: u32, payload: &[u8], checksum: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(19 + payload.len() + 4);
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.push(event_type);
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(payload);

    let length = buf.len() + if checksum { 4 } else { 0 };
    buf[9..13].copy_from_slice(&(length as u32).to_le_bytes());
    if checksum {
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
    }
    buf
}

/// FORMAT_DESCRIPTION_EVENT 생성.
///
/// `checksum`이 Some이면 5.6.1 이상 서버처럼 알고리즘 바이트와 체크섬을 붙인다.
pub(crate) fn format_event(server_version: &str, checksum: Option<bool>) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&4u16.to_le_bytes());
    let mut version = [0u8; 50];
    version[..server_version.len()].copy_from_slice(server_version.as_bytes());
    payload.extend_from_slice(&version);
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.push(19);
    payload.extend_from_slice(POST_HEADER_LENGTHS);

    match checksum {
        Some(crc) => {
            payload.push(if crc { 1 } else { 0 });
            // 5.6.1 이상에서는 FDE 자체가 항상 체크섬 자리를 가진다
            event(15, TIMESTAMP, &payload, true)
        }
        None => event(15, TIMESTAMP, &payload, false),
    }
}

pub(crate) fn rotate_event(filename: &str, checksum: bool) -> Vec<u8> {
    let mut payload = 4u64.to_le_bytes().to_vec();
    payload.extend_from_slice(filename.as_bytes());
    event(4, 0, &payload, checksum)
}

pub(crate) fn query_event(timestamp: u32, database: &str, sql: &str, checksum: bool) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&7u32.to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.push(database.len() as u8);
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.extend_from_slice(database.as_bytes());
    payload.push(0);
    payload.extend_from_slice(sql.as_bytes());
    event(2, timestamp, &payload, checksum)
}

pub(crate) fn xid_event(timestamp: u32, xid: u64, checksum: bool) -> Vec<u8> {
    event(16, timestamp, &xid.to_le_bytes(), checksum)
}

pub(crate) fn intvar_event(kind: u8, value: u64) -> Vec<u8> {
    let mut payload = vec![kind];
    payload.extend_from_slice(&value.to_le_bytes());
    event(5, TIMESTAMP, &payload, false)
}

pub(crate) fn rand_event(seed1: u64, seed2: u64) -> Vec<u8> {
    let mut payload = seed1.to_le_bytes().to_vec();
    payload.extend_from_slice(&seed2.to_le_bytes());
    event(13, TIMESTAMP, &payload, false)
}

pub(crate) fn gtid_event(sid: [u8; 16], gno: u64) -> Vec<u8> {
    let mut payload = vec![1u8];
    payload.extend_from_slice(&sid);
    payload.extend_from_slice(&gno.to_le_bytes());
    event(33, TIMESTAMP, &payload, false)
}
