use std::sync::Arc;

use sqlx::SqlitePool;

use crate::aggregation::AggregationService;
use crate::audit::AuditService;
use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::ledger::LedgerService;
use crate::listing::ListingService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有字段都是廉价 Clone (连接池与 Arc)，axum 每个请求克隆一次。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 校验 |
/// | audit | AuditService | 审计日志 |
/// | ledger | LedgerService | 收款写入与对账 |
/// | listing | ListingService | 订单列表 |
/// | aggregation | AggregationService | 仪表盘统计 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    pub audit: AuditService,
    pub ledger: LedgerService,
    pub listing: ListingService,
    pub aggregation: AggregationService,
}

impl ServerState {
    /// 基于已打开的连接池组装所有服务
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let tz = config.timezone;
        let audit = AuditService::new(pool.clone());
        let ledger = LedgerService::new(pool.clone(), audit.clone(), tz);
        let listing = ListingService::new(
            pool.clone(),
            tz,
            config.default_page_size,
            config.max_page_size,
        );
        let aggregation = AggregationService::new(pool.clone(), tz);
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            pool,
            jwt_service,
            audit,
            ledger,
            listing,
            aggregation,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录存在
    /// 2. 打开数据库并执行迁移
    /// 3. 组装服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db = DbService::new(&config.database_path).await?;
        tracing::info!(
            database = %config.database_path,
            timezone = %config.timezone,
            "Server state initialized"
        );

        Ok(Self::new(config.clone(), db.pool))
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
