//! 审计日志服务
//!
//! 写入在业务事务内进行（savepoint 隔离）：审计失败只记录 warn，
//! 不影响业务提交。查询直接读取连接池。

use sqlx::{Connection, SqliteConnection, SqlitePool};

use super::storage::{self, AuditInsert, AuditStorageResult};
use super::types::*;
use crate::auth::CurrentUser;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 审计日志服务
#[derive(Clone)]
pub struct AuditService {
    pool: SqlitePool,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService").finish_non_exhaustive()
    }
}

impl AuditService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 在调用方已开启的事务中写入一条审计日志
    ///
    /// 失败时回滚 savepoint 并记录 warn，错误不会传给调用方。
    pub async fn record(&self, conn: &mut SqliteConnection, record: AuditRecord<'_>) {
        let action = record.action;
        let entity_id = record.entity_id;
        if let Err(e) = Self::append_in_savepoint(conn, &record).await {
            tracing::warn!(
                action = %action,
                entity_id = ?entity_id,
                error = %e,
                "Audit entry dropped"
            );
        }
    }

    async fn append_in_savepoint(
        conn: &mut SqliteConnection,
        record: &AuditRecord<'_>,
    ) -> AuditStorageResult<i64> {
        let row = AuditInsert {
            actor_id: record.actor.map(|a| a.id),
            action: record.action.as_str(),
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            branch_id: record.effective_branch(),
            details: record.details.as_ref(),
            created_at: shared::util::now_millis(),
        };

        // 嵌套 begin → SAVEPOINT
        let mut savepoint = conn.begin().await?;
        match storage::append(&mut savepoint, &row).await {
            Ok(id) => {
                savepoint.commit().await?;
                Ok(id)
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e)
            }
        }
    }

    /// 最近的审计记录
    ///
    /// 管理员看到全部；其他角色只看到本分店或本人的操作。
    pub async fn recent(&self, caller: &CurrentUser, limit: i64) -> AppResult<Vec<AuditEntry>> {
        let visible_to = if caller.is_admin() {
            None
        } else {
            Some((caller.branch_id, caller.id))
        };
        Ok(storage::recent(&self.pool, visible_to, limit).await?)
    }

    /// 分页查询（仅管理员）
    pub async fn query(&self, caller: &CurrentUser, q: &AuditQuery) -> AppResult<AuditListResponse> {
        if !caller.is_admin() {
            return Err(AppError::with_message(
                ErrorCode::AdminRequired,
                "Audit log is restricted to administrators",
            ));
        }
        let (items, total) = storage::query(&self.pool, q).await?;
        Ok(AuditListResponse { items, total })
    }
}
