//! 认证模块
//!
//! 身份由外部认证服务签发，这里只做两件事：
//! - [`JwtService`] - 验证 JWT 令牌
//! - [`CurrentUser`] - 从请求中提取调用者 `{id, role, branch_id}`
//!
//! 行级可见性规则见 [`crate::scope`]。

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
