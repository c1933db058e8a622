//! 云下载（离线下载）相关类型与参数校验
//!
//! 提交任务前的所有校验都在本地完成，不合法的批次不会发出任何请求

use crate::error::{BitqiuError, Result};
use crate::netdisk::types::{lenient_opt_u64, lenient_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单次最多提交的云下载链接数
pub const MAX_DOWNLOAD_TASKS: usize = 20;

/// 移动/复制单次最多操作的条目数（目录 + 文件）
pub const MAX_BATCH_ITEMS: usize = 50;

/// 允许的链接前缀
const ALLOWED_SCHEMES: [&str; 2] = ["magnet:", "ed2k://"];

/// 云下载任务状态
///
/// 状态码对应服务端返回的 status 字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 排队中
    Pending,
    /// 下载中
    Downloading,
    /// 已完成
    Completed,
    /// 下载失败
    Failed,
    /// 未识别的状态码
    #[default]
    Unknown,
}

impl TaskStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::Pending,
            "1" => Self::Downloading,
            "2" => Self::Completed,
            "3" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn to_text(&self) -> &'static str {
        match self {
            Self::Pending => "排队中",
            Self::Downloading => "下载中",
            Self::Completed => "已完成",
            Self::Failed => "下载失败",
            Self::Unknown => "未知状态",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// 云下载任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTask {
    pub task_id: String,
    pub name: String,
    pub status: TaskStatus,
    pub size: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    #[serde(alias = "id", deserialize_with = "lenient_string")]
    task_id: String,
    #[serde(default, alias = "fileName", alias = "taskName")]
    name: String,
    #[serde(default)]
    status: Value,
    #[serde(default, alias = "fileSize", deserialize_with = "lenient_opt_u64")]
    size: Option<u64>,
}

impl DownloadTask {
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let raw = RawTask::deserialize(entry)
            .map_err(|e| BitqiuError::Api(format!("解析云下载任务失败: {}", e)))?;

        let status = match &raw.status {
            Value::String(s) => TaskStatus::from_code(s),
            Value::Number(n) => TaskStatus::from_code(&n.to_string()),
            _ => TaskStatus::Unknown,
        };

        Ok(Self {
            task_id: raw.task_id,
            name: raw.name,
            status,
            size: raw.size,
        })
    }
}

/// 校验云下载链接
///
/// 先检查协议，再检查数量
pub fn validate_download_urls(urls: &[String]) -> Result<()> {
    if let Some(bad) = urls
        .iter()
        .find(|url| !ALLOWED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)))
    {
        return Err(BitqiuError::InvalidInput(format!(
            "只支持 magnet 或 ed2k 链接: {}",
            bad
        )));
    }

    if urls.len() > MAX_DOWNLOAD_TASKS {
        return Err(BitqiuError::InvalidInput(format!(
            "单次最多添加 {} 个云下载任务，当前 {} 个",
            MAX_DOWNLOAD_TASKS,
            urls.len()
        )));
    }

    Ok(())
}

/// 编码 downloadUrls 参数
///
/// 每个链接按表单规则百分号编码（空格为 `+`），再整体序列化为 JSON 数组
pub fn encode_download_urls(urls: &[String]) -> Result<String> {
    let encoded: Vec<String> = urls
        .iter()
        .map(|url| urlencoding::encode(url).replace("%20", "+"))
        .collect();

    serde_json::to_string(&encoded)
        .map_err(|e| BitqiuError::InvalidInput(format!("下载链接序列化失败: {}", e)))
}

/// 校验移动/复制的批量数量
pub fn validate_batch(dir_ids: &[String], file_ids: &[String]) -> Result<()> {
    let total = dir_ids.len() + file_ids.len();
    if total > MAX_BATCH_ITEMS {
        return Err(BitqiuError::InvalidInput(format!(
            "单次最多操作 {} 个条目，当前 {} 个",
            MAX_BATCH_ITEMS, total
        )));
    }
    Ok(())
}
