use bitqiu_rust::config::{ClientConfig, LogConfig};
use bitqiu_rust::{logging, BitqiuClient, BitqiuError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const CONFIG_PATH: &str = "config/bitqiu.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 先读日志段，完整配置的加载结果才能写进日志
    let log_config = LogConfig::load_section(CONFIG_PATH).await;

    // 必须保持 _log_guard 存活
    let _log_guard = logging::init_logging(&log_config);

    info!("BitQiu Rust v{} 启动中...", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load_or_default(CONFIG_PATH).await;

    let mut client = BitqiuClient::new(config)?;

    // Ctrl+C 取消扫码等待
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    match client.authenticate_with_qr_code(&cancel).await {
        Ok(()) => {}
        Err(BitqiuError::Cancelled) => {
            warn!("用户取消登录");
            client.close();
            return Ok(());
        }
        Err(e) => {
            client.close();
            return Err(e.into());
        }
    }

    let user_info = client.get_user_info().await?;
    let privilege = &user_info.privilege;
    info!("用户 ID: {}", user_info.user_id);
    info!("会员等级: {}", privilege.privileged_gear_name);
    info!(
        "云下载: {} (剩余 {} 次)",
        privilege.cloud_download, privilege.cloud_download_count_remain
    );
    info!(
        "视频播放: {} (剩余 {} 次)",
        privilege.cloud_video_play, privilege.cloud_video_play_count_remain
    );

    match client.list_directories(None).await {
        Ok(dirs) => {
            info!("根目录下共有 {} 个子目录", dirs.len());
            for dir in dirs.iter().take(10) {
                info!("  📁 {} ({})", dir.name, dir.dir_id);
            }
        }
        Err(e) => warn!("列出目录失败: {}", e),
    }

    match client.daily_signin().await {
        Ok(()) => info!("✅ 每日签到完成"),
        Err(e) => warn!("每日签到失败: {}", e),
    }

    client.close();
    info!("已退出");
    Ok(())
}
