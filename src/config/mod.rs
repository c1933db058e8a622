// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// 客户端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 服务端接口配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 扫码登录配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 列表/分页配置
    #[serde(default)]
    pub listing: ListingConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务端接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 服务主机地址
    #[serde(default = "default_host_url")]
    pub host_url: String,
    /// 渠道标识（每个请求都会附带 org_channel 字段）
    #[serde(default = "default_org_channel")]
    pub org_channel: String,
    /// 唯一的成功状态码
    #[serde(default = "default_success_code")]
    pub success_code: String,
    /// 二维码渲染服务模板，`{}` 处填入二维码内容
    #[serde(default = "default_qr_render_api")]
    pub qr_render_api: String,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host_url() -> String {
    "https://pan.bitqiu.com".to_string()
}

fn default_org_channel() -> String {
    "default|default|stpan".to_string()
}

fn default_success_code() -> String {
    "10200".to_string()
}

fn default_qr_render_api() -> String {
    "https://api.qrserver.com/v1/create-qr-code/?data={}".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host_url: default_host_url(),
            org_channel: default_org_channel(),
            success_code: default_success_code(),
            qr_render_api: default_qr_render_api(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 扫码登录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 轮询间隔（秒，默认 5）
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// 最大轮询次数（默认 60，即 5 分钟）
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_poll_attempts() -> u32 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl AuthConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// 列表/分页配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// 分页列表每页数量
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// 目录列表（不分页接口）单次数量
    #[serde(default = "default_dir_page_size")]
    pub dir_page_size: u32,
    /// 分页循环的最大页数，防止服务端一直返回 hasNext
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_page_size() -> u32 {
    24
}

fn default_dir_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    10_000
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            dir_page_size: default_dir_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    false
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

impl LogConfig {
    /// 只读取配置文件中的 `[log]` 段
    ///
    /// 日志系统初始化前调用，其余段落格式错误不影响结果，读取失败时返回默认值
    pub async fn load_section(path: &str) -> Self {
        if let Ok(content) = fs::read_to_string(path).await {
            if let Ok(value) = toml::from_str::<toml::Value>(&content) {
                if let Some(log_table) = value.get("log") {
                    if let Ok(log_config) = log_table.clone().try_into::<LogConfig>() {
                        return log_config;
                    }
                }
            }
        }

        LogConfig::default()
    }
}

impl ClientConfig {
    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        if self.api.host_url.trim().is_empty() {
            anyhow::bail!("api.host_url 不能为空");
        }
        if self.api.success_code.is_empty() {
            anyhow::bail!("api.success_code 不能为空");
        }
        if !self.api.qr_render_api.contains("{}") {
            anyhow::bail!("api.qr_render_api 必须包含占位符 {{}}");
        }
        if self.auth.poll_interval_secs == 0 {
            anyhow::bail!("auth.poll_interval_secs 必须大于 0");
        }
        if self.auth.max_poll_attempts == 0 {
            anyhow::bail!("auth.max_poll_attempts 必须大于 0");
        }
        if self.listing.page_size == 0 || self.listing.dir_page_size == 0 {
            anyhow::bail!("listing 每页数量必须大于 0");
        }
        if self.listing.max_pages == 0 {
            anyhow::bail!("listing.max_pages 必须大于 0");
        }
        Ok(())
    }

    /// 从文件加载配置
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let config: ClientConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        config.validate().context("配置文件校验失败")?;

        Ok(config)
    }

    /// 保存配置到文件
    pub async fn save_to_file(&self, path: &str) -> Result<()> {
        self.validate().context("保存配置失败")?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        fs::write(path, content)
            .await
            .context("Failed to write config file")?;

        tracing::info!("配置已保存: {}", path);
        Ok(())
    }

    /// 加载配置，失败时回退到默认值
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path).await {
            Ok(config) => {
                tracing::info!("配置文件加载成功: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件加载失败，使用默认配置: {:#}", e);
                Self::default()
            }
        }
    }
}
