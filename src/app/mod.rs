// ==========================================
// 家禽批次管理系统 - 应用层
// ==========================================
// 职责: 装配各层实例, 供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use crate::config::get_default_db_path;
pub use state::AppState;
