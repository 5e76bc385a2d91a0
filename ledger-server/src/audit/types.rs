//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除。

use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;

/// 审计操作类型（枚举，非自由文本）
///
/// 存储为点分标签，如 `payment.create`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// 登记收款
    #[serde(rename = "payment.create")]
    PaymentCreate,
    /// 手动覆盖支付状态
    #[serde(rename = "payment_state.override")]
    PaymentStateOverride,
    /// 重新汇总账本
    #[serde(rename = "payment.reconcile")]
    PaymentReconcile,
    /// 订单软删除
    #[serde(rename = "order.delete")]
    OrderDelete,
    /// 订单状态变更
    #[serde(rename = "order.status")]
    OrderStatus,
}

impl AuditAction {
    pub const ALL: [AuditAction; 5] = [
        Self::PaymentCreate,
        Self::PaymentStateOverride,
        Self::PaymentReconcile,
        Self::OrderDelete,
        Self::OrderStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentCreate => "payment.create",
            Self::PaymentStateOverride => "payment_state.override",
            Self::PaymentReconcile => "payment.reconcile",
            Self::OrderDelete => "order.delete",
            Self::OrderStatus => "order.status",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == tag)
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待写入的审计记录
///
/// `branch_id` 未指定时取操作人的分店；显式指定的 `None` 保持为 `None`。
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub actor: Option<&'a CurrentUser>,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: Option<i64>,
    /// `None`: not supplied; `Some(None)`: entity has no branch
    pub branch_id: Option<Option<i64>>,
    pub details: Option<serde_json::Value>,
}

impl<'a> AuditRecord<'a> {
    pub fn new(action: AuditAction, entity_type: &'static str, entity_id: Option<i64>) -> Self {
        Self {
            actor: None,
            action,
            entity_type,
            entity_id,
            branch_id: None,
            details: None,
        }
    }

    pub fn actor(mut self, actor: &'a CurrentUser) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn branch(mut self, branch_id: Option<i64>) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Branch the entry is attributed to
    pub fn effective_branch(&self) -> Option<i64> {
        match self.branch_id {
            Some(branch_id) => branch_id,
            None => self.actor.and_then(|a| a.branch_id),
        }
    }
}

/// 审计日志条目（不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    /// 操作人 ID（系统事件为 None）
    pub actor_id: Option<i64>,
    /// 点分标签
    pub action: String,
    /// 资源类型（如 "order", "payment"）
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub branch_id: Option<i64>,
    /// 结构化详情（JSON）
    pub details: Option<serde_json::Value>,
    /// 时间戳（Unix 毫秒）
    pub created_at: i64,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// 起始时间（Unix 毫秒，含）
    pub from: Option<i64>,
    /// 截止时间（Unix 毫秒，含）
    pub to: Option<i64>,
    /// 操作类型过滤（点分标签）
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    /// 分页偏移
    #[serde(default)]
    pub offset: i64,
    /// 分页大小（默认 50）
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// 审计日志列表响应
#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}
