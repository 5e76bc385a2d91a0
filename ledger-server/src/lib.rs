//! Ledger Server - 订单收款账本与对账服务
//!
//! # 架构概述
//!
//! - **账本** (`ledger`): 收款写入，单事务内重算已付金额与支付状态
//! - **对账** (`reconcile`): 纯函数，决定展示的支付状态
//! - **可见范围** (`scope`): 按角色/分店过滤行
//! - **列表** (`listing`): 订单分页、筛选、排序
//! - **统计** (`aggregation`): 汇总、时间线、Top-N、收款统计
//! - **审计** (`audit`): 追加式审计日志
//! - **HTTP API** (`api`): axum 路由
//!
//! # 模块结构
//!
//! ```text
//! ledger-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 校验、CurrentUser 提取器
//! ├── db/            # SQLite 连接池与 repository
//! ├── ledger/        # 账本写入
//! ├── aggregation/   # 仪表盘统计
//! ├── audit/         # 审计日志
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、时间工具
//! ```

pub mod aggregation;
pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod listing;
pub mod money;
pub mod reconcile;
pub mod scope;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export 公共类型
pub use aggregation::AggregationService;
pub use audit::AuditService;
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use ledger::{LedgerError, LedgerService};
pub use listing::ListingService;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
