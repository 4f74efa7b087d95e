//! API 路由前缀与分页常量

/// 用户 API 前缀
pub const API_PREFIX: &str = "/api/v1";

/// 管理 API 前缀
pub const ADMIN_PREFIX: &str = "/admin/v1";

/// 上传文件访问路径
pub const UPLOADS_PATH: &str = "/uploads";

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 流水导出每批行数
pub const EXPORT_BATCH_SIZE: u64 = 5000;

/// 管理员审核人标识
pub const ADMIN_REVIEWER: &str = "admin";
