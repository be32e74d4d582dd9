//! 服务层模块
//!
//! - file: 文件系统 Provider 与异步包装
//! - backup: 备份路径策略与备份记录
//! - config: 配置加载

pub mod backup;
pub mod config;
pub mod file;

pub use backup::{hash_uri, Backup, BackupManager, BackupTargetResolver, HostBackupDestination};
pub use config::{load_config, BackupStrategy, EditorConfig};
pub use file::{FileError, FileMetadata, FileProvider, LocalFileProvider};
