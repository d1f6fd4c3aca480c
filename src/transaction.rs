//! 논리 트랜잭션과 SQL 문장 분류

use crate::error::Result;
use crate::gtid::ReplicationPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 문장 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementCategory {
    /// 세션/타임스탬프 설정
    Set,
    /// 데이터 변경
    Dml,
    /// 스키마 변경
    Ddl,
    /// 빈 문장
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub category: StatementCategory,
    pub sql: Vec<u8>,
}

impl Statement {
    pub fn new(category: StatementCategory, sql: impl Into<Vec<u8>>) -> Self {
        Statement {
            category,
            sql: sql.into(),
        }
    }

    /// 트랜잭션 맨 앞에 붙는 `SET TIMESTAMP=<ts>` 문장
    pub fn set_timestamp(timestamp: u32) -> Self {
        Statement::new(
            StatementCategory::Set,
            format!("SET TIMESTAMP={}", timestamp),
        )
    }

    pub fn sql_lossy(&self) -> String {
        String::from_utf8_lossy(&self.sql).into_owned()
    }
}

/// 완성된 트랜잭션
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogTransaction {
    pub statements: Vec<Statement>,
    /// 커밋 이벤트 타임스탬프 (초)
    pub timestamp: i64,
    pub position: ReplicationPosition,
}

impl BinlogTransaction {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// JSON 직렬화 (한 줄)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON 역직렬화. 알 수 없는 필드는 무시한다.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 쿼리 이벤트 텍스트의 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Begin,
    Commit,
    Rollback,
    Statement(StatementCategory),
}

const DDL_KEYWORDS: &[&str] = &["create", "alter", "drop", "truncate", "rename"];

/// 쿼리 텍스트 분류.
///
/// BEGIN/COMMIT/ROLLBACK은 전체 텍스트가 정확히 일치해야 하고 (대소문자 무시),
/// 나머지는 첫 키워드로 판단한다. 알 수 없는 문장은 DML로 취급한다.
pub fn classify(sql: &[u8]) -> QueryKind {
    let text = sql.trim_ascii();

    if text.eq_ignore_ascii_case(b"BEGIN") {
        return QueryKind::Begin;
    }
    if text.eq_ignore_ascii_case(b"COMMIT") {
        return QueryKind::Commit;
    }
    if text.eq_ignore_ascii_case(b"ROLLBACK") {
        return QueryKind::Rollback;
    }

    let keyword_len = text
        .iter()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let keyword = &text[..keyword_len];

    let category = if text.is_empty() {
        StatementCategory::Other
    } else if keyword.eq_ignore_ascii_case(b"set") {
        StatementCategory::Set
    } else if DDL_KEYWORDS
        .iter()
        .any(|kw| keyword.eq_ignore_ascii_case(kw.as_bytes()))
    {
        StatementCategory::Ddl
    } else {
        StatementCategory::Dml
    };

    QueryKind::Statement(category)
}
