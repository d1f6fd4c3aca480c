//! MySQL Binlog 이벤트 디코딩
//!
//! 각 이벤트의 공통 헤더 (19 bytes):
//!   - Timestamp (4 bytes)
//!   - Type (1 byte)
//!   - Server ID (4 bytes)
//!   - Event Length (4 bytes)
//!   - Next Position (4 bytes)
//!   - Flags (2 bytes)
//!
//! FORMAT_DESCRIPTION_EVENT가 이후 이벤트들의 헤더 길이와 체크섬 여부를 정한다.
//! Google MySQL은 헤더 길이가 27이며, 추가 8바이트는 group id이다.

use crate::error::{BinlogError, Result};
use crate::events::*;
use crate::gtid::{self, Gtid};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use tracing::debug;
use uuid::Uuid;

const BINLOG_MAGIC: &[u8] = &[0xfe, 0x62, 0x69, 0x6e]; // ".bin" in ASCII

const SERVER_VERSION_LEN: usize = 50;
/// binlog version (2) + server version (50) + create timestamp (4) + header length (1)
const FORMAT_FIXED_LEN: usize = 2 + SERVER_VERSION_LEN + 4 + 1;

const CHECKSUM_ALG_DESC_LEN: usize = 1;
const CHECKSUM_LEN: usize = 4;
/// 체크섬을 지원하는 최소 서버 버전
const CHECKSUM_VERSION_PRODUCT: (u32, u32, u32) = (5, 6, 1);

const QUERY_POST_HEADER_LEN: usize = 13;
const ROTATE_POST_HEADER_LEN: usize = 8;
const GTID_BODY_LEN: usize = 1 + 16 + 8;

/// 바이트 슬라이스 단위의 상태 없는 파서
pub struct BinlogParser;

impl BinlogParser {
    /// Binlog 파일 헤더 검증
    pub fn verify_magic(data: &[u8]) -> Result<()> {
        if data.len() < 4 {
            return Err(BinlogError::BinlogParseError(
                "Invalid binlog: too short".to_string(),
            ));
        }

        if data[0..4] == BINLOG_MAGIC[..] {
            Ok(())
        } else {
            Err(BinlogError::BinlogParseError(
                "Invalid binlog magic number".to_string(),
            ))
        }
    }

    /// 이벤트 헤더 파싱
    pub fn parse_header(data: &[u8]) -> Result<EventHeader> {
        if data.len() < EVENT_HEADER_SIZE {
            return Err(BinlogError::BinlogParseError(
                "Invalid event header: too short".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let timestamp = cursor.read_u32::<LittleEndian>()?;
        let type_code = cursor.read_u8()?;
        let server_id = cursor.read_u32::<LittleEndian>()?;
        let event_length = cursor.read_u32::<LittleEndian>()?;
        let next_pos = cursor.read_u32::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;

        Ok(EventHeader {
            timestamp,
            event_type: EventType::from_u8(type_code),
            type_code,
            server_id,
            event_length,
            next_pos,
            flags,
        })
    }

    /// FORMAT_DESCRIPTION 이벤트 파싱 (15)
    ///
    /// FDE 자체는 항상 19바이트 헤더를 사용한다. 5.6.1 이상 서버라면
    /// 끝의 5바이트는 체크섬 알고리즘 (1) + 체크섬 (4)이다.
    pub fn parse_format_description(event: &RawEvent) -> Result<FormatDescriptor> {
        let data = event.as_bytes();
        if data.len() < EVENT_HEADER_SIZE + FORMAT_FIXED_LEN {
            return Err(BinlogError::InvalidFormat {
                reason: format!("event too short ({} bytes)", data.len()),
                event: event.clone(),
            });
        }

        let mut cursor = Cursor::new(&data[EVENT_HEADER_SIZE..]);

        let binlog_version = cursor.read_u16::<LittleEndian>()?;
        let mut version_bytes = [0u8; SERVER_VERSION_LEN];
        cursor.read_exact(&mut version_bytes)?;
        let version_end = version_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SERVER_VERSION_LEN);
        let server_version = String::from_utf8_lossy(&version_bytes[..version_end]).to_string();
        let create_timestamp = cursor.read_u32::<LittleEndian>()?;
        let header_length = cursor.read_u8()?;

        if (header_length as usize) < EVENT_HEADER_SIZE {
            return Err(BinlogError::InvalidHeaderLength {
                header_length,
                event: event.clone(),
            });
        }

        let rest = &data[EVENT_HEADER_SIZE + FORMAT_FIXED_LEN..];
        let (post_header_lengths, checksum_alg) = if supports_checksum(&server_version) {
            if rest.len() < CHECKSUM_ALG_DESC_LEN + CHECKSUM_LEN {
                return Err(BinlogError::InvalidFormat {
                    reason: "missing checksum footer".to_string(),
                    event: event.clone(),
                });
            }
            let footer = rest.len() - (CHECKSUM_ALG_DESC_LEN + CHECKSUM_LEN);
            (
                rest[..footer].to_vec(),
                ChecksumAlgorithm::from_u8(rest[footer]),
            )
        } else {
            (rest.to_vec(), ChecksumAlgorithm::Absent)
        };

        Ok(FormatDescriptor {
            binlog_version,
            server_version,
            create_timestamp,
            header_length,
            post_header_lengths,
            checksum_alg,
        })
    }

    /// ROTATE 이벤트 파싱 (4)
    pub fn parse_rotate(event: &RawEvent, body: &[u8], header_len: usize) -> Result<RotateEventData> {
        let payload = body.get(header_len..).unwrap_or_default();
        if payload.len() < ROTATE_POST_HEADER_LEN {
            return Err(malformed(event, "payload shorter than 8 bytes"));
        }

        let position = LittleEndian::read_u64(&payload[..ROTATE_POST_HEADER_LEN]);
        let name = String::from_utf8_lossy(&payload[ROTATE_POST_HEADER_LEN..]).to_string();
        let file_sequence = match gtid::file_sequence(&name) {
            Some(seq) => seq,
            None => {
                return Err(BinlogError::InvalidRotate {
                    name,
                    event: event.clone(),
                })
            }
        };

        Ok(RotateEventData {
            next_binlog_name: name,
            position,
            file_sequence,
        })
    }

    /// QUERY 이벤트 파싱 (2)
    ///
    /// SQL 텍스트 시작 위치 =
    /// 헤더 + post-header + status vars 길이 + db name 길이 + NUL 1바이트.
    pub fn parse_query(
        event: &RawEvent,
        body: &[u8],
        header_len: usize,
        post_header_len: usize,
    ) -> Result<QueryEventData> {
        let length = body.len();
        if post_header_len < QUERY_POST_HEADER_LEN {
            return Err(malformed(
                event,
                &format!("post-header length {} is too small", post_header_len),
            ));
        }

        let fixed_end = header_len + post_header_len;
        if fixed_end > length {
            return Err(BinlogError::InvalidQueryOffset {
                offset: fixed_end,
                length,
                event: event.clone(),
            });
        }

        let mut cursor = Cursor::new(&body[header_len..]);
        let thread_id = cursor.read_u32::<LittleEndian>()?;
        let exec_time = cursor.read_u32::<LittleEndian>()?;
        let db_len = cursor.read_u8()? as usize;
        let error_code = cursor.read_u16::<LittleEndian>()?;
        let status_len = cursor.read_u16::<LittleEndian>()? as usize;

        let db_start = fixed_end + status_len;
        let sql_start = db_start + db_len + 1;
        if sql_start > length {
            return Err(BinlogError::InvalidQueryOffset {
                offset: sql_start,
                length,
                event: event.clone(),
            });
        }

        let database = String::from_utf8_lossy(&body[db_start..db_start + db_len]).to_string();

        Ok(QueryEventData {
            thread_id,
            exec_time,
            error_code,
            database,
            sql: body[sql_start..].to_vec(),
        })
    }

    /// XID 이벤트 파싱 (16)
    pub fn parse_xid(event: &RawEvent, payload: &[u8]) -> Result<u64> {
        if payload.len() < 8 {
            return Err(malformed(event, "payload shorter than 8 bytes"));
        }
        Ok(LittleEndian::read_u64(&payload[..8]))
    }

    /// INTVAR 이벤트 파싱 (5)
    pub fn parse_intvar(event: &RawEvent, payload: &[u8]) -> Result<IntVarData> {
        if payload.len() < 9 {
            return Err(malformed(event, "payload shorter than 9 bytes"));
        }
        let kind = IntVarKind::from_u8(payload[0])
            .ok_or_else(|| malformed(event, &format!("unknown variable type {}", payload[0])))?;
        Ok(IntVarData {
            kind,
            value: LittleEndian::read_u64(&payload[1..9]),
        })
    }

    /// RAND 이벤트 파싱 (13)
    pub fn parse_rand(event: &RawEvent, payload: &[u8]) -> Result<RandData> {
        if payload.len() < 16 {
            return Err(malformed(event, "payload shorter than 16 bytes"));
        }
        Ok(RandData {
            seed1: LittleEndian::read_u64(&payload[..8]),
            seed2: LittleEndian::read_u64(&payload[8..16]),
        })
    }

    /// GTID 이벤트 파싱 (33)
    pub fn parse_gtid(event: &RawEvent, payload: &[u8]) -> Result<Gtid> {
        if payload.len() < GTID_BODY_LEN {
            return Err(malformed(event, "payload shorter than 25 bytes"));
        }

        let mut cursor = Cursor::new(payload);
        let _flags = cursor.read_u8()?;
        let mut sid = [0u8; 16];
        cursor.read_exact(&mut sid)?;
        let gno = cursor.read_u64::<LittleEndian>()?;

        Ok(Gtid::Mysql56 {
            sid: Uuid::from_bytes(sid),
            gno,
        })
    }
}

fn malformed(event: &RawEvent, reason: &str) -> BinlogError {
    BinlogError::Malformed {
        kind: event.event_type(),
        reason: reason.to_string(),
        event: event.clone(),
    }
}

/// 서버 버전이 5.6.1 이상인지 확인
fn supports_checksum(server_version: &str) -> bool {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    let re = VERSION.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)").expect("server version pattern is valid")
    });

    let Some(caps) = re.captures(server_version) else {
        return false;
    };
    let part = |i: usize| caps[i].parse::<u32>().unwrap_or(0);
    (part(1), part(2), part(3)) >= CHECKSUM_VERSION_PRODUCT
}

fn verify_checksum(event: &RawEvent) -> Result<()> {
    let data = event.as_bytes();
    let split = data.len() - CHECKSUM_LEN;
    let stored = LittleEndian::read_u32(&data[split..]);
    let computed = crc32fast::hash(&data[..split]);
    if stored != computed {
        return Err(BinlogError::ChecksumMismatch {
            stored,
            computed,
            event: event.clone(),
        });
    }
    Ok(())
}

/// 디스크립터 전에 온 ROTATE 파싱.
///
/// 체크섬 사용 여부를 아직 모르므로, 파일명이 해석되지 않을 때
/// 끝 4바이트가 올바른 CRC32라면 잘라내고 다시 시도한다.
fn parse_leading_rotate(event: &RawEvent) -> Result<RotateEventData> {
    let data = event.as_bytes();
    match BinlogParser::parse_rotate(event, data, EVENT_HEADER_SIZE) {
        Err(BinlogError::InvalidRotate { name, event: raw })
            if data.len() >= EVENT_HEADER_SIZE + ROTATE_POST_HEADER_LEN + CHECKSUM_LEN =>
        {
            if verify_checksum(event).is_err() {
                return Err(BinlogError::InvalidRotate { name, event: raw });
            }
            BinlogParser::parse_rotate(event, &data[..data.len() - CHECKSUM_LEN], EVENT_HEADER_SIZE)
        }
        other => other,
    }
}

/// 스트림 하나의 포맷 디스크립터를 기억하며 이벤트를 해석하는 디코더
#[derive(Debug, Default)]
pub struct EventDecoder {
    format: Option<FormatDescriptor>,
    verify_checksum: bool,
}

impl EventDecoder {
    pub fn new(verify_checksum: bool) -> Self {
        EventDecoder {
            format: None,
            verify_checksum,
        }
    }

    /// 현재 스트림의 포맷 디스크립터
    pub fn format(&self) -> Option<&FormatDescriptor> {
        self.format.as_ref()
    }

    /// 이벤트 하나를 검증하고 해석한다.
    ///
    /// FORMAT_DESCRIPTION_EVENT는 언제든 다시 올 수 있으며 (e.g. 로그 회전),
    /// 그때마다 디스크립터를 교체한다. 디스크립터 전에는 ROTATE만 허용된다.
    pub fn decode(&mut self, event: &RawEvent) -> Result<BinlogEvent> {
        if !event.is_valid() {
            return Err(BinlogError::InvalidEvent(event.clone()));
        }
        let header = BinlogParser::parse_header(event.as_bytes())?;

        if header.event_type == EventType::FormatDescriptionEvent {
            let format = BinlogParser::parse_format_description(event)?;
            if self.verify_checksum && format.checksum_alg == ChecksumAlgorithm::Crc32 {
                verify_checksum(event)?;
            }
            debug!(
                "Format descriptor: server={}, header_length={}, checksum={:?}",
                format.server_version, format.header_length, format.checksum_alg
            );
            self.format = Some(format.clone());
            return Ok(BinlogEvent {
                header,
                gtid: None,
                data: BinlogEventData::FormatDescription(format),
            });
        }

        let Some(format) = self.format.as_ref() else {
            // 디스크립터 전에 올 수 있는 것은 마스터가 보내는 가짜 ROTATE뿐
            if event.is_rotate() {
                let rotate = parse_leading_rotate(event)?;
                return Ok(BinlogEvent {
                    header,
                    gtid: None,
                    data: BinlogEventData::Rotate(rotate),
                });
            }
            return Err(BinlogError::EventBeforeFormat(event.clone()));
        };

        let header_len = format.header_length as usize;
        let checksum_len = format.checksum_len();
        let data = event.as_bytes();
        if data.len() < header_len + checksum_len {
            return Err(BinlogError::InvalidEvent(event.clone()));
        }
        if checksum_len > 0 && self.verify_checksum {
            verify_checksum(event)?;
        }
        let body = &data[..data.len() - checksum_len];
        let payload = &body[header_len..];

        let mut gtid = None;
        if format.has_group_id() {
            let group_id = LittleEndian::read_u64(&body[EVENT_HEADER_SIZE..GOOGLE_EVENT_HEADER_SIZE]);
            if group_id != 0 {
                gtid = Some(Gtid::Google { group_id });
            }
        }

        let data = match header.event_type {
            EventType::RotateEvent => {
                BinlogEventData::Rotate(BinlogParser::parse_rotate(event, body, header_len)?)
            }
            EventType::QueryEvent => {
                let post_header_len = format
                    .post_header_len(EventType::QueryEvent)
                    .map(usize::from)
                    .unwrap_or(QUERY_POST_HEADER_LEN);
                BinlogEventData::Query(BinlogParser::parse_query(
                    event,
                    body,
                    header_len,
                    post_header_len,
                )?)
            }
            EventType::XidEvent => BinlogEventData::Xid(BinlogParser::parse_xid(event, payload)?),
            EventType::IntVarEvent => {
                BinlogEventData::IntVar(BinlogParser::parse_intvar(event, payload)?)
            }
            EventType::RandEvent => BinlogEventData::Rand(BinlogParser::parse_rand(event, payload)?),
            EventType::GtidEvent => {
                gtid = Some(BinlogParser::parse_gtid(event, payload)?);
                BinlogEventData::Gtid
            }
            _ => BinlogEventData::Unknown,
        };

        Ok(BinlogEvent { header, gtid, data })
    }
}
