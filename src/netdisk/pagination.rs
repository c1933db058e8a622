// 分页列表累积

use crate::auth::AuthSession;
use crate::error::{BitqiuError, Result};
use crate::netdisk::types::is_truthy;
use crate::protocol::ApiProtocol;
use serde_json::Value;
use tracing::debug;

/// 单页解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

/// 解析一页载荷：条目在 `data` 数组中，是否还有下一页看 `hasNext`
///
/// `data` 缺失视为空页，`hasNext` 缺失视为没有下一页
pub fn parse_page<T, F>(payload: &Value, parse: F) -> Result<Page<T>>
where
    F: Fn(&Value) -> Result<T>,
{
    let items = match payload.get("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries.iter().map(&parse).collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(BitqiuError::Api(format!(
                "列表载荷格式错误，data 不是数组: {}",
                other
            )))
        }
    };

    let has_next = payload.get("hasNext").map(is_truthy).unwrap_or(false);

    Ok(Page { items, has_next })
}

/// 按页码顺序请求直到 `hasNext` 为假，按收到的顺序拼接所有条目
pub struct PaginatedLister<'a> {
    protocol: &'a ApiProtocol,
    session: &'a AuthSession,
    max_pages: u32,
}

impl<'a> PaginatedLister<'a> {
    pub fn new(protocol: &'a ApiProtocol, session: &'a AuthSession, max_pages: u32) -> Self {
        Self {
            protocol,
            session,
            max_pages,
        }
    }

    /// 拉取所有页
    ///
    /// 每一页在 `params` 之后追加 `currentPage` 和 `page` 两个相同的页码（从 1 开始）。
    /// 任意一页失败则整体失败；达到页数上限仍有下一页时返回 [`BitqiuError::Api`]
    pub async fn collect<T, F>(
        &self,
        path: &str,
        params: &[(&str, String)],
        action: &str,
        parse: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&Value) -> Result<T>,
    {
        let mut all_items = Vec::new();

        for page_no in 1..=self.max_pages {
            let mut page_params = params.to_vec();
            page_params.push(("currentPage", page_no.to_string()));
            page_params.push(("page", page_no.to_string()));

            let payload = self
                .protocol
                .post(path, &page_params, self.session)
                .await?
                .into_data(action)?;

            let page = parse_page(&payload, &parse)?;
            debug!(
                "{}: 第 {} 页, {} 条, has_next={}",
                action,
                page_no,
                page.items.len(),
                page.has_next
            );
            all_items.extend(page.items);

            if !page.has_next {
                return Ok(all_items);
            }
        }

        Err(BitqiuError::Api(format!(
            "{}失败: 超过最大页数 {}，服务端仍返回 hasNext",
            action, self.max_pages
        )))
    }
}
