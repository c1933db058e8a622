// 网盘客户端实现

use crate::auth::{AuthSession, LoginPhase, QrChallenge, QrCodeAuth, SessionManager, Sleeper};
use crate::common::calculate_file_md5;
use crate::config::ClientConfig;
use crate::error::{BitqiuError, Result};
use crate::netdisk::cloud_dl::{encode_download_urls, validate_batch, validate_download_urls};
use crate::netdisk::endpoints::*;
use crate::netdisk::pagination::{parse_page, PaginatedLister};
use crate::netdisk::{
    CollectionAction, DirectoryInfo, DownloadInfo, DownloadTask, FileResource, ResourceKind,
    UserInfo,
};
use crate::protocol::ApiProtocol;
use crate::transport::{HttpTransport, ReqwestTransport};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 比特球网盘客户端
///
/// 一个实例独占一个 HTTP 连接池和一份登录状态。
/// 登录流程需要 `&mut self`，其余操作逐个 await，不做并发请求。
pub struct BitqiuClient {
    protocol: ApiProtocol,
    sessions: SessionManager,
    config: ClientConfig,
    closed: AtomicBool,
}

impl BitqiuClient {
    /// 创建客户端，使用基于 reqwest 的传输
    pub fn new(config: ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| BitqiuError::InvalidInput(format!("配置无效: {:#}", e)))?;

        let transport = ReqwestTransport::new(config.api.request_timeout())?;
        info!("初始化比特球客户端: host={}", config.api.host_url);
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// 使用指定传输创建客户端
    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: ClientConfig) -> Self {
        Self {
            protocol: ApiProtocol::new(transport, &config.api),
            sessions: SessionManager::new(&config.auth),
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// 替换扫码轮询的等待器
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sessions.set_sleeper(sleeper);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 当前会话（不可变快照）
    pub fn session(&self) -> &AuthSession {
        self.sessions.session()
    }

    pub fn login_phase(&self) -> &LoginPhase {
        self.sessions.phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated()
    }

    // =====================================================
    // 登录
    // =====================================================

    /// 扫码登录
    ///
    /// 二维码渲染链接写入日志，同时在终端绘制二维码。
    /// 超时返回认证错误，需要重新调用；`cancel` 被触发时返回 [`BitqiuError::Cancelled`]
    pub async fn authenticate_with_qr_code(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.authenticate_with_qr_code_and(cancel, |challenge| {
            info!("请使用比特球 App 扫描二维码登录: {}", challenge.render_url);
            match challenge.render_terminal() {
                Ok(art) => info!("\n{}", art),
                Err(e) => warn!("终端二维码绘制失败: {}", e),
            }
        })
        .await
    }

    /// 扫码登录，二维码的展示方式由调用方决定
    pub async fn authenticate_with_qr_code_and<F>(
        &mut self,
        cancel: &CancellationToken,
        on_challenge: F,
    ) -> Result<()>
    where
        F: FnOnce(&QrChallenge),
    {
        self.ensure_open()?;
        let qr = QrCodeAuth::new(&self.protocol, &self.config.api.qr_render_api);
        self.sessions.authenticate(&qr, cancel, on_challenge).await
    }

    // =====================================================
    // 用户
    // =====================================================

    /// 获取用户信息，并把根目录 ID 记入会话
    pub async fn get_user_info(&mut self) -> Result<UserInfo> {
        self.require_session()?;
        info!("获取用户信息");

        let data = self.post(API_USER_INFO, &[], "获取用户信息").await?;
        let user_info = UserInfo::from_value(data)?;
        self.sessions.record_root_dir(&user_info.root_dir_id);

        info!(
            "用户信息: user_id={}, root_dir_id={}, 等级={}",
            user_info.user_id, user_info.root_dir_id, user_info.privilege.privileged_gear_name
        );
        Ok(user_info)
    }

    /// 每日签到
    pub async fn daily_signin(&self) -> Result<()> {
        self.require_session()?;
        self.post(API_SIGNIN, &[], "签到").await?;
        info!("签到成功");
        Ok(())
    }

    // =====================================================
    // 列表
    // =====================================================

    /// 列出目录下的所有资源（自动翻页）
    ///
    /// # 参数
    /// * `parent_dir` - 父目录 ID，None 为根目录
    /// * `order_by` - 排序字段，如 "name"、"updateTime"、"size"
    /// * `ascending` - 是否升序
    pub async fn list_resources(
        &self,
        parent_dir: Option<&str>,
        order_by: &str,
        ascending: bool,
    ) -> Result<Vec<FileResource>> {
        let parent_id = self.resolve_parent(parent_dir)?;
        info!("列出资源: parent_id={}, order_by={}", parent_id, order_by);

        let params = [
            ("parentId", parent_id),
            ("userId", self.session().user_id().to_string()),
            ("name", "undefined".to_string()),
            ("limit", self.config.listing.page_size.to_string()),
            ("model", "1".to_string()),
            ("orderType", order_by.to_string()),
            ("desc", if ascending { "0" } else { "1" }.to_string()),
        ];

        let resources = self
            .lister()?
            .collect(API_RESOURCE_PAGES, &params, "列出资源", FileResource::from_entry)
            .await?;
        info!("列出资源完成: {} 条", resources.len());
        Ok(resources)
    }

    /// 按名称搜索资源（自动翻页）
    pub async fn search_resources(
        &self,
        keyword: &str,
        parent_dir: Option<&str>,
    ) -> Result<Vec<FileResource>> {
        if keyword.trim().is_empty() {
            return Err(BitqiuError::InvalidInput("搜索关键字不能为空".to_string()));
        }
        let parent_id = self.resolve_parent(parent_dir)?;
        info!("搜索资源: keyword={}, parent_id={}", keyword, parent_id);

        let params = [
            ("parentId", parent_id),
            ("userId", self.session().user_id().to_string()),
            ("name", keyword.to_string()),
            ("limit", self.config.listing.page_size.to_string()),
            ("model", "1".to_string()),
        ];

        let resources = self
            .lister()?
            .collect(API_SEARCH, &params, "搜索资源", FileResource::from_entry)
            .await?;
        info!("搜索完成: {} 条", resources.len());
        Ok(resources)
    }

    /// 列出子目录
    ///
    /// 只请求第一页；服务端报告还有更多时记录警告并返回已拿到的部分
    pub async fn list_directories(&self, parent_dir: Option<&str>) -> Result<Vec<DirectoryInfo>> {
        let parent_id = self.resolve_parent(parent_dir)?;
        info!("列出目录: parent_id={}", parent_id);

        let params = [
            ("parentId", parent_id.clone()),
            ("limit", self.config.listing.dir_page_size.to_string()),
            ("currentPage", "1".to_string()),
        ];

        let data = self.post(API_DIR_LIST, &params, "列出目录").await?;
        let page = parse_page(&data, DirectoryInfo::from_entry)?;

        if page.has_next {
            warn!(
                "目录列表不支持翻页，只返回第一页 {} 条: parent_id={}",
                page.items.len(),
                parent_id
            );
        }
        Ok(page.items)
    }

    // =====================================================
    // 资源操作
    // =====================================================

    /// 新建目录
    pub async fn create_directory(
        &self,
        name: &str,
        parent_dir: Option<&str>,
    ) -> Result<DirectoryInfo> {
        if name.trim().is_empty() {
            return Err(BitqiuError::InvalidInput("目录名不能为空".to_string()));
        }
        let parent_id = self.resolve_parent(parent_dir)?;
        info!("新建目录: name={}, parent_id={}", name, parent_id);

        let params = [("parentId", parent_id), ("name", name.to_string())];
        let data = self.post(API_DIR_CREATE, &params, "新建目录").await?;
        let dir = DirectoryInfo::from_entry(&data)?;

        info!("新建目录成功: dir_id={}", dir.dir_id);
        Ok(dir)
    }

    /// 获取文件下载链接
    pub async fn get_download_url(&self, file_id: &str) -> Result<DownloadInfo> {
        if file_id.is_empty() {
            return Err(BitqiuError::InvalidInput("文件 ID 不能为空".to_string()));
        }
        self.require_session()?;
        info!("获取下载链接: file_id={}", file_id);

        let data = self
            .post(API_DOWNLOAD_URL, &[("fileIds", file_id.to_string())], "获取下载链接")
            .await?;
        DownloadInfo::from_value(data)
    }

    /// 校验本地文件与服务端 MD5 是否一致
    pub async fn verify_download(&self, info: &DownloadInfo, path: &Path) -> Result<bool> {
        let local = calculate_file_md5(path).await?;
        let matched = local.eq_ignore_ascii_case(info.md5.trim());
        if !matched {
            warn!(
                "MD5 不一致: path={}, local={}, remote={}",
                path.display(),
                local,
                info.md5
            );
        }
        Ok(matched)
    }

    /// 删除目录和文件
    pub async fn delete_resources(&self, dir_ids: &[String], file_ids: &[String]) -> Result<()> {
        self.require_session()?;
        info!("删除资源: {} 个目录, {} 个文件", dir_ids.len(), file_ids.len());

        let params = [("dirIds", dir_ids.join(",")), ("fileIds", file_ids.join(","))];
        self.post(API_RESOURCE_DELETE, &params, "删除资源").await?;
        Ok(())
    }

    /// 重命名
    pub async fn rename_resource(
        &self,
        resource_id: &str,
        new_name: &str,
        kind: ResourceKind,
    ) -> Result<()> {
        if resource_id.is_empty() || new_name.trim().is_empty() {
            return Err(BitqiuError::InvalidInput("资源 ID 和新名称不能为空".to_string()));
        }
        self.require_session()?;
        info!("重命名: resource_id={}, new_name={}", resource_id, new_name);

        let params = [
            ("resourceId", resource_id.to_string()),
            ("name", new_name.to_string()),
            ("type", kind.rename_type().to_string()),
        ];
        self.post(API_RESOURCE_RENAME, &params, "重命名").await?;
        Ok(())
    }

    /// 移动到目标目录，None 为根目录
    pub async fn move_resources(
        &self,
        target_dir: Option<&str>,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        validate_batch(dir_ids, file_ids)?;
        let target_id = self.resolve_parent(target_dir)?;
        info!("移动资源到 {}: {} 个目录, {} 个文件", target_id, dir_ids.len(), file_ids.len());

        let params = [
            ("parentId", target_id),
            ("dirIds", dir_ids.join(",")),
            ("fileIds", file_ids.join(",")),
        ];
        self.post(API_RESOURCE_MOVE, &params, "移动资源").await?;
        Ok(())
    }

    /// 复制到目标目录，None 为根目录
    pub async fn copy_resources(
        &self,
        target_dir: Option<&str>,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        validate_batch(dir_ids, file_ids)?;
        let target_id = self.resolve_parent(target_dir)?;
        info!("复制资源到 {}: {} 个目录, {} 个文件", target_id, dir_ids.len(), file_ids.len());

        let params = [
            ("parentId", target_id),
            ("dirIds", dir_ids.join(",")),
            ("fileIds", file_ids.join(",")),
        ];
        self.post(API_RESOURCE_COPY, &params, "复制资源").await?;
        Ok(())
    }

    /// 加入或取消收藏
    pub async fn manage_collection(
        &self,
        action: CollectionAction,
        dir_ids: &[String],
        file_ids: &[String],
    ) -> Result<()> {
        self.require_session()?;

        let (path, label) = match action {
            CollectionAction::Add => (API_COLLECTION_ADD, "加入收藏"),
            CollectionAction::Cancel => (API_COLLECTION_CANCEL, "取消收藏"),
        };
        info!("{}: {} 个目录, {} 个文件", label, dir_ids.len(), file_ids.len());

        let params = [("dirIds", dir_ids.join(",")), ("fileIds", file_ids.join(","))];
        self.post(path, &params, label).await?;
        Ok(())
    }

    // =====================================================
    // 云下载
    // =====================================================

    /// 添加云下载任务
    ///
    /// 只接受 magnet / ed2k 链接，单次最多 20 个。
    /// 返回 true 表示服务端确认的成功数与提交数一致
    pub async fn add_download_tasks(
        &self,
        urls: &[String],
        target_dir: Option<&str>,
    ) -> Result<bool> {
        validate_download_urls(urls)?;
        let download_urls = encode_download_urls(urls)?;

        let user_id = self.session().user_id();
        if user_id.is_empty() {
            return Err(BitqiuError::Authentication("缺少用户 ID，请先登录".to_string()));
        }
        info!("添加云下载任务: {} 个链接", urls.len());

        let params = [
            ("userId", user_id.to_string()),
            ("dirId", target_dir.unwrap_or_default().to_string()),
            ("downloadUrls", download_urls),
        ];
        let data = self.post(API_TASK_ADD, &params, "添加云下载任务").await?;

        let accepted = data
            .get("success")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        if accepted != urls.len() {
            warn!("云下载任务部分添加成功: {}/{}", accepted, urls.len());
        } else {
            info!("云下载任务添加成功: {} 个", accepted);
        }
        Ok(accepted == urls.len())
    }

    /// 查询云下载任务列表（仅第一页）
    pub async fn list_download_tasks(&self) -> Result<Vec<DownloadTask>> {
        self.require_session()?;

        let params = [
            ("userId", self.session().user_id().to_string()),
            ("limit", self.config.listing.dir_page_size.to_string()),
            ("currentPage", "1".to_string()),
        ];
        let data = self.post(API_TASK_LIST, &params, "查询云下载任务").await?;

        // 载荷可能直接是数组，也可能是 { data: [...] }
        let data = if data.is_array() {
            serde_json::json!({ "data": data })
        } else {
            data
        };
        let page = parse_page(&data, DownloadTask::from_entry)?;
        if page.has_next {
            warn!("云下载任务列表只返回第一页 {} 条", page.items.len());
        }
        Ok(page.items)
    }

    /// 取消云下载任务
    pub async fn cancel_download_task(&self, task_id: &str) -> Result<()> {
        if task_id.is_empty() {
            return Err(BitqiuError::InvalidInput("任务 ID 不能为空".to_string()));
        }
        self.require_session()?;
        info!("取消云下载任务: task_id={}", task_id);

        self.post(API_TASK_CANCEL, &[("taskId", task_id.to_string())], "取消云下载任务")
            .await?;
        Ok(())
    }

    // =====================================================
    // 生命周期
    // =====================================================

    /// 释放底层连接，可重复调用
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.protocol.close();
            info!("比特球客户端已关闭");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // =====================================================
    // 内部
    // =====================================================

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(BitqiuError::Http("客户端已关闭".to_string()));
        }
        Ok(())
    }

    fn require_session(&self) -> Result<&AuthSession> {
        let session = self.session();
        if !session.is_authenticated() {
            return Err(BitqiuError::Authentication("未登录，请先扫码登录".to_string()));
        }
        Ok(session)
    }

    /// 解析父目录：未指定时使用根目录，根目录要求先调用 get_user_info
    fn resolve_parent(&self, parent_dir: Option<&str>) -> Result<String> {
        let session = self.require_session()?;
        if !session.has_root_dir() {
            return Err(BitqiuError::Authentication(
                "尚未获取用户信息，请先调用 get_user_info".to_string(),
            ));
        }
        Ok(parent_dir
            .filter(|id| !id.is_empty())
            .unwrap_or(session.root_dir_id())
            .to_string())
    }

    fn lister(&self) -> Result<PaginatedLister<'_>> {
        self.ensure_open()?;
        Ok(PaginatedLister::new(
            &self.protocol,
            self.session(),
            self.config.listing.max_pages,
        ))
    }

    /// 带会话的 POST，失败结果转换为 [`BitqiuError::Api`]
    async fn post(&self, path: &str, params: &[(&str, String)], action: &str) -> Result<Value> {
        self.ensure_open()?;
        self.protocol
            .post(path, params, self.session())
            .await?
            .into_data(action)
    }
}

impl Drop for BitqiuClient {
    fn drop(&mut self) {
        self.close();
    }
}
