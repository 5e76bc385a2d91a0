//! 审计日志 SQLite 存储层
//!
//! Append-only 设计，没有任何删除/更新接口。

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use thiserror::Error;

use super::types::{AuditEntry, AuditQuery};

/// 单次查询最多返回条数
pub const MAX_QUERY_LIMIT: i64 = 200;

/// 存储错误
#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AuditStorageError {
    fn from(err: sqlx::Error) -> Self {
        AuditStorageError::Database(err.to_string())
    }
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

impl From<AuditStorageError> for shared::error::AppError {
    fn from(err: AuditStorageError) -> Self {
        shared::error::AppError::internal(err.to_string())
    }
}

const AUDIT_COLUMNS: &str =
    "id, actor_id, action, entity_type, entity_id, branch_id, details, created_at";

/// 行结构（details 以 JSON 文本存储）
#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i64,
    actor_id: Option<i64>,
    action: String,
    entity_type: String,
    entity_id: Option<i64>,
    branch_id: Option<i64>,
    details: Option<String>,
    created_at: i64,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = AuditStorageError;

    fn try_from(r: AuditRow) -> Result<Self, Self::Error> {
        let details = r
            .details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(AuditEntry {
            id: r.id,
            actor_id: r.actor_id,
            action: r.action,
            entity_type: r.entity_type,
            entity_id: r.entity_id,
            branch_id: r.branch_id,
            details,
            created_at: r.created_at,
        })
    }
}

/// 插入用结构
#[derive(Debug)]
pub struct AuditInsert<'a> {
    pub actor_id: Option<i64>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub details: Option<&'a serde_json::Value>,
    pub created_at: i64,
}

/// 追加一条审计日志，运行在调用方的连接/事务上
pub async fn append(conn: &mut SqliteConnection, row: &AuditInsert<'_>) -> AuditStorageResult<i64> {
    let details = row.details.map(serde_json::to_string).transpose()?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO audit_log (actor_id, action, entity_type, entity_id, branch_id, details, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(row.actor_id)
    .bind(row.action)
    .bind(row.entity_type)
    .bind(row.entity_id)
    .bind(row.branch_id)
    .bind(details)
    .bind(row.created_at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

fn push_conditions<'a>(qb: &mut QueryBuilder<'a, Sqlite>, q: &'a AuditQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(from) = q.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = q.to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
    if let Some(action) = q.action.as_deref() {
        qb.push(" AND action = ").push_bind(action);
    }
    if let Some(entity_type) = q.entity_type.as_deref() {
        qb.push(" AND entity_type = ").push_bind(entity_type);
    }
    if let Some(entity_id) = q.entity_id {
        qb.push(" AND entity_id = ").push_bind(entity_id);
    }
}

/// 查询审计日志（倒序），返回 (条目, 总数)
pub async fn query(pool: &SqlitePool, q: &AuditQuery) -> AuditStorageResult<(Vec<AuditEntry>, i64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_log");
    push_conditions(&mut count_qb, q);
    let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_log"));
    push_conditions(&mut qb, q);
    qb.push(" ORDER BY id DESC LIMIT ")
        .push_bind(q.limit.clamp(1, MAX_QUERY_LIMIT))
        .push(" OFFSET ")
        .push_bind(q.offset.max(0));

    let rows: Vec<AuditRow> = qb.build_query_as().fetch_all(pool).await?;
    let entries = rows
        .into_iter()
        .map(AuditEntry::try_from)
        .collect::<AuditStorageResult<Vec<_>>>()?;

    Ok((entries, total))
}

/// 最近 N 条审计日志（倒序）
///
/// `visible_to = Some((branch, actor))` 时只返回该分店或该操作人的记录。
pub async fn recent(
    pool: &SqlitePool,
    visible_to: Option<(Option<i64>, i64)>,
    limit: i64,
) -> AuditStorageResult<Vec<AuditEntry>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_log"));
    if let Some((branch, actor)) = visible_to {
        qb.push(" WHERE (actor_id = ").push_bind(actor);
        if let Some(branch) = branch {
            qb.push(" OR branch_id = ").push_bind(branch);
        }
        qb.push(")");
    }
    qb.push(" ORDER BY id DESC LIMIT ")
        .push_bind(limit.clamp(1, MAX_QUERY_LIMIT));

    let rows: Vec<AuditRow> = qb.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(AuditEntry::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn seed(pool: &SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let details = serde_json::json!({ "amount": "200.00" });
        for (actor, action, branch, ts) in [
            (Some(1), "payment.create", Some(2), 100),
            (Some(2), "payment.create", Some(3), 200),
            (Some(1), "order.delete", Some(2), 300),
            (None, "payment.reconcile", None, 400),
        ] {
            let row = AuditInsert {
                actor_id: actor,
                action,
                entity_type: "order",
                entity_id: Some(10),
                branch_id: branch,
                details: Some(&details),
                created_at: ts,
            };
            append(&mut conn, &row).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_query_filters() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;

        let (items, total) = query(&db.pool, &AuditQuery { limit: 50, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(items[0].action, "payment.reconcile");
        assert_eq!(items[3].details.as_ref().unwrap()["amount"], "200.00");

        let q = AuditQuery {
            action: Some("payment.create".into()),
            from: Some(150),
            limit: 50,
            ..Default::default()
        };
        let (items, total) = query(&db.pool, &q).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].actor_id, Some(2));

        let q = AuditQuery { limit: 1, offset: 1, ..Default::default() };
        let (items, total) = query(&db.pool, &q).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].action, "order.delete");
    }

    #[tokio::test]
    async fn test_recent_visibility() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;

        assert_eq!(recent(&db.pool, None, 10).await.unwrap().len(), 4);

        // branch 3 manager (actor 2) sees only their branch
        let items = recent(&db.pool, Some((Some(3), 2)), 10).await.unwrap();
        assert_eq!(items.len(), 1);

        // no branch: own actions only
        let items = recent(&db.pool, Some((None, 1)), 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|e| e.actor_id == Some(1)));
    }
}
