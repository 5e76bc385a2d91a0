//! Reference data: branches, employees, clients
//!
//! 由其他模块维护，本服务只读取 (以及测试/初始化时写入)

use super::RepoResult;
use serde::Serialize;
use shared::models::Role;
use sqlx::{SqliteExecutor, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BranchRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ManagerRef {
    pub id: i64,
    pub display_name: String,
    pub branch_id: Option<i64>,
}

pub async fn create_branch(pool: &SqlitePool, name: &str) -> RepoResult<i64> {
    let id = sqlx::query_scalar("INSERT INTO branch (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn create_employee(
    pool: &SqlitePool,
    username: &str,
    display_name: &str,
    role: Role,
    branch_id: Option<i64>,
) -> RepoResult<i64> {
    let id = sqlx::query_scalar(
        "INSERT INTO employee (username, display_name, role, branch_id) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(display_name)
    .bind(role.as_str())
    .bind(branch_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn create_client(pool: &SqlitePool, full_name: &str, phone: Option<&str>) -> RepoResult<i64> {
    let id = sqlx::query_scalar("INSERT INTO client (full_name, phone) VALUES (?, ?) RETURNING id")
        .bind(full_name)
        .bind(phone)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Active branches; `only` restricts to a single branch
pub async fn list_branches(
    db: impl SqliteExecutor<'_>,
    only: Option<i64>,
) -> RepoResult<Vec<BranchRef>> {
    let rows = sqlx::query_as::<_, BranchRef>(
        "SELECT id, name FROM branch WHERE is_active = 1 AND (?1 IS NULL OR id = ?1) ORDER BY name, id",
    )
    .bind(only)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Active employees with the manager role; `branch` restricts to one branch
pub async fn list_managers(
    db: impl SqliteExecutor<'_>,
    branch: Option<i64>,
) -> RepoResult<Vec<ManagerRef>> {
    let rows = sqlx::query_as::<_, ManagerRef>(
        "SELECT id, display_name, branch_id FROM employee WHERE is_active = 1 AND role = 'manager' AND (?1 IS NULL OR branch_id = ?1) ORDER BY display_name, id",
    )
    .bind(branch)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
