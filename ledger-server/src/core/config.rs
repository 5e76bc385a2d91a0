use std::path::PathBuf;

use chrono_tz::Tz;

use crate::auth::JwtConfig;
use crate::core::error::{Result, ServerError};

/// 服务配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/ledger | 工作目录 |
/// | DATABASE_PATH | `<WORK_DIR>/ledger.db` | SQLite 文件 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | UTC | 业务时区 (IANA) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录 |
/// | DEFAULT_PAGE_SIZE | 50 | 列表默认分页大小 |
/// | MAX_PAGE_SIZE | 200 | 列表最大分页大小 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/ledger TIMEZONE=Asia/Tashkent cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存放数据库与日志
    pub work_dir: String,
    /// SQLite 数据库路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区，决定日期边界与时间分桶
    pub timezone: Tz,
    /// 日志级别
    pub log_level: String,
    /// 日志目录 (None 时仅输出到 stdout)
    pub log_dir: Option<String>,
    /// 列表默认分页大小
    pub default_page_size: u32,
    /// 列表最大分页大小
    pub max_page_size: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Result<Self> {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/ledger".into());
        let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
            PathBuf::from(&work_dir)
                .join("ledger.db")
                .to_string_lossy()
                .into_owned()
        });

        let timezone = match std::env::var("TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| ServerError::Config(format!("Unknown TIMEZONE: {name}")))?,
            Err(_) => Tz::UTC,
        };

        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            work_dir,
            database_path,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            default_page_size: std::env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(50),
            max_page_size: std::env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(200),
        })
    }

    /// 使用自定义值构造配置，不读取环境变量
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, jwt: JwtConfig, timezone: Tz) -> Self {
        let work_dir = work_dir.into();
        Self {
            database_path: PathBuf::from(&work_dir)
                .join("ledger.db")
                .to_string_lossy()
                .into_owned(),
            work_dir,
            http_port: 0,
            jwt,
            environment: "test".into(),
            timezone,
            log_level: "debug".into(),
            log_dir: None,
            default_page_size: 50,
            max_page_size: 200,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
