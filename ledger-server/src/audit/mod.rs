//! 审计日志模块 - 账本写入的追加式审计追踪
//!
//! # 架构
//!
//! ```text
//! Ledger Core (事务内)
//!   └─ AuditService::record() → SAVEPOINT → audit_log 表
//!        失败 → ROLLBACK TO SAVEPOINT + warn，业务事务继续
//!
//! 读取: AuditService::recent() / AuditService::query()
//! ```
//!
//! # 保证
//!
//! - **Append-only**: 无删除/更新接口
//! - **同事务**: 与账本写入一起提交或一起回滚

pub mod service;
pub mod storage;
pub mod types;

pub use service::AuditService;
pub use storage::AuditStorageError;
pub use types::{AuditAction, AuditEntry, AuditListResponse, AuditQuery, AuditRecord};
