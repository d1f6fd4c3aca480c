//! 디코딩된 이벤트를 논리 트랜잭션으로 묶는 상태 기계
//!
//! 상태: Idle (열린 트랜잭션 없음) → Open (문장 누적) → Idle (flush 또는 폐기)
//!
//! 트랜잭션 종료 방식:
//! 1. COMMIT 쿼리 이벤트
//! 2. XID 이벤트 (스토리지 엔진 커밋)
//! 3. ROLLBACK 쿼리 이벤트 (방출 없이 폐기)

use crate::events::{BinlogEvent, BinlogEventData, IntVarData, QueryEventData, RandData};
use crate::gtid::ReplicationPosition;
use crate::transaction::{classify, BinlogTransaction, QueryKind, Statement, StatementCategory};
use tracing::{debug, warn};

/// 현재 열린 트랜잭션
#[derive(Debug)]
struct OpenTransaction {
    statements: Vec<Statement>,
    /// BEGIN 없이 첫 문장으로 열린 경우
    implicit: bool,
}

#[derive(Debug, Default)]
pub struct TransactionAssembler {
    open: Option<OpenTransaction>,
    position: ReplicationPosition,
    database: Option<String>,
}

impl TransactionAssembler {
    pub fn new(start_position: ReplicationPosition) -> Self {
        TransactionAssembler {
            open: None,
            position: start_position,
            database: None,
        }
    }

    /// 다른 기본 데이터베이스를 가진 문장은 건너뛴다
    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database.filter(|db| !db.is_empty());
        self
    }

    /// 가장 최근에 관측된 복제 위치
    pub fn position(&self) -> &ReplicationPosition {
        &self.position
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// 열린 트랜잭션에 쌓인 문장 수 (SET TIMESTAMP 포함)
    pub fn pending_statements(&self) -> usize {
        self.open.as_ref().map_or(0, |open| open.statements.len())
    }

    /// 이벤트 하나를 반영하고, 트랜잭션이 완성되면 돌려준다
    pub fn push(&mut self, event: BinlogEvent) -> Option<BinlogTransaction> {
        if let Some(gtid) = event.gtid {
            self.position.gtid = Some(gtid);
        }
        let timestamp = event.header.timestamp;

        match event.data {
            BinlogEventData::Rotate(rotate) => {
                debug!(
                    "Rotate to {} (sequence {})",
                    rotate.next_binlog_name, rotate.file_sequence
                );
                self.position.file_sequence = rotate.file_sequence;
                None
            }
            BinlogEventData::Query(query) => self.push_query(timestamp, query),
            BinlogEventData::Xid(_) => self.commit(timestamp),
            BinlogEventData::IntVar(IntVarData { kind, value }) => {
                let sql = format!("SET {}={}", kind.as_str(), value);
                self.append(timestamp, Statement::new(StatementCategory::Set, sql));
                None
            }
            BinlogEventData::Rand(RandData { seed1, seed2 }) => {
                let sql = format!("SET @@RAND_SEED1={}, @@RAND_SEED2={}", seed1, seed2);
                self.append(timestamp, Statement::new(StatementCategory::Set, sql));
                None
            }
            BinlogEventData::FormatDescription(_)
            | BinlogEventData::Gtid
            | BinlogEventData::Unknown => None,
        }
    }

    fn push_query(&mut self, timestamp: u32, query: QueryEventData) -> Option<BinlogTransaction> {
        match classify(&query.sql) {
            QueryKind::Begin => {
                self.begin(timestamp, false);
                None
            }
            QueryKind::Commit => self.commit(timestamp),
            QueryKind::Rollback => {
                self.rollback();
                None
            }
            QueryKind::Statement(category) => {
                if let Some(ref database) = self.database {
                    if !query.database.is_empty() && &query.database != database {
                        debug!("Skipping statement for database {}", query.database);
                        return None;
                    }
                }

                let implicit = self.append(timestamp, Statement::new(category, query.sql));
                // DDL은 MySQL이 암묵적으로 커밋하며 XID를 남기지 않는다
                if implicit && category == StatementCategory::Ddl {
                    return self.commit(timestamp);
                }
                None
            }
        }
    }

    /// 새 트랜잭션 시작. 이미 열려 있다면 쌓인 문장을 버리고 다시 시작한다.
    fn begin(&mut self, timestamp: u32, implicit: bool) {
        if let Some(open) = self.open.take() {
            warn!(
                "BEGIN in binlog stream while still in another transaction; dropping {} statements",
                open.statements.len()
            );
        }
        self.open = Some(OpenTransaction {
            statements: vec![Statement::set_timestamp(timestamp)],
            implicit,
        });
    }

    /// 문장 추가. Idle이면 암묵적 트랜잭션을 연다.
    /// 추가된 트랜잭션이 암묵적으로 열린 것인지 돌려준다.
    fn append(&mut self, timestamp: u32, statement: Statement) -> bool {
        if self.open.is_none() {
            self.begin(timestamp, true);
        }
        match self.open.as_mut() {
            Some(open) => {
                open.statements.push(statement);
                open.implicit
            }
            None => false,
        }
    }

    fn commit(&mut self, timestamp: u32) -> Option<BinlogTransaction> {
        let Some(open) = self.open.take() else {
            debug!("Commit without an open transaction at {}", self.position);
            return None;
        };

        Some(BinlogTransaction {
            statements: open.statements,
            timestamp: i64::from(timestamp),
            position: self.position,
        })
    }

    fn rollback(&mut self) {
        if let Some(open) = self.open.take() {
            debug!("Rollback discarded {} statements", open.statements.len());
        }
    }
}
