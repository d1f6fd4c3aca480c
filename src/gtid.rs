//! 복제 위치 (GTID 대응값) 관리
//!
//! 위치는 두 부분으로 구성됩니다:
//! - rotate 이벤트 파일명의 숫자 접미사 (e.g., "mysql-bin.000003" → 3)
//! - 스트림이 제공하는 경우 이벤트 단위 GTID
//!   (Google MySQL 확장 헤더의 group id, 또는 MySQL 5.6 GTID_EVENT)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 이벤트 단위 GTID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gtid {
    /// Google MySQL group id
    Google { group_id: u64 },
    /// MySQL 5.6 GTID (format: uuid:sequence-number)
    Mysql56 { sid: Uuid, gno: u64 },
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gtid::Google { group_id } => write!(f, "{}", group_id),
            Gtid::Mysql56 { sid, gno } => write!(f, "{}:{}", sid, gno),
        }
    }
}

/// 트랜잭션에 붙는 복제 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicationPosition {
    /// 가장 최근 rotate 파일명의 숫자 접미사
    pub file_sequence: u64,
    /// 가장 최근에 관측된 GTID
    pub gtid: Option<Gtid>,
}

impl ReplicationPosition {
    pub fn new(file_sequence: u64) -> Self {
        ReplicationPosition {
            file_sequence,
            gtid: None,
        }
    }

    /// 파일명으로부터 시작 위치 생성 (접미사가 숫자가 아니면 None)
    pub fn from_file_name(filename: &str) -> Option<Self> {
        file_sequence(filename).map(ReplicationPosition::new)
    }
}

impl fmt::Display for ReplicationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gtid {
            Some(gtid) => write!(f, "{}/{}", self.file_sequence, gtid),
            None => write!(f, "{}", self.file_sequence),
        }
    }
}

/// 파일명에서 시퀀스 번호 추출
pub fn file_sequence(filename: &str) -> Option<u64> {
    let (_, suffix) = filename.rsplit_once('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}
