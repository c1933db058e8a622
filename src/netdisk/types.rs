// 网盘API数据类型

use crate::common::datetime_to_timestamp_ms;
use crate::error::{BitqiuError, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 用户权益
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPrivilege {
    /// 云下载
    #[serde(deserialize_with = "lenient_bool")]
    pub cloud_download: bool,
    #[serde(deserialize_with = "lenient_i64")]
    pub cloud_download_count_remain: i64,

    /// 视频播放
    #[serde(deserialize_with = "lenient_bool")]
    pub cloud_video_play: bool,
    #[serde(deserialize_with = "lenient_i64")]
    pub cloud_video_play_count_remain: i64,

    /// 音乐播放
    #[serde(deserialize_with = "lenient_bool")]
    pub cloud_music_play: bool,
    #[serde(deserialize_with = "lenient_i64")]
    pub cloud_music_play_count_remain: i64,

    /// 文档预览
    #[serde(deserialize_with = "lenient_bool")]
    pub cloud_doc_play: bool,
    #[serde(deserialize_with = "lenient_i64")]
    pub cloud_doc_play_count_remain: i64,

    /// 会员等级名称
    pub privileged_gear_name: String,
}

/// 用户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(deserialize_with = "lenient_i64")]
    pub user_id: i64,

    /// 网盘根目录 ID，后续列表/创建/移动默认以它为父目录
    #[serde(deserialize_with = "lenient_string")]
    pub root_dir_id: String,

    #[serde(default)]
    pub privilege: UserPrivilege,
}

impl UserInfo {
    pub fn from_value(data: Value) -> Result<Self> {
        serde_json::from_value(data)
            .map_err(|e| BitqiuError::Api(format!("解析用户信息失败: {}", e)))
    }
}

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Directory,
}

impl ResourceKind {
    /// 重命名接口中的类型标识
    pub fn rename_type(&self) -> &'static str {
        match self {
            ResourceKind::Directory => "1",
            ResourceKind::File => "2",
        }
    }
}

/// 文件/目录条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResource {
    pub resource_id: String,
    pub name: String,
    /// 目录通常没有大小
    pub size: Option<u64>,
    pub is_directory: bool,
    /// 创建时间（毫秒时间戳）
    pub create_time: i64,
    /// 更新时间（毫秒时间戳）
    pub update_time: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    #[serde(deserialize_with = "lenient_string")]
    resource_id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    size: Option<u64>,
    /// 只要字段存在且非 null 即为目录，不看取值
    #[serde(default)]
    dir_type: Option<Value>,
    create_time: String,
    update_time: String,
}

impl FileResource {
    /// 从列表接口返回的原始条目解析
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let raw = RawResource::deserialize(entry)
            .map_err(|e| BitqiuError::Api(format!("解析文件条目失败: {}", e)))?;

        Ok(Self {
            resource_id: raw.resource_id,
            name: raw.name,
            size: raw.size,
            is_directory: raw.dir_type.is_some(),
            create_time: datetime_to_timestamp_ms(&raw.create_time)?,
            update_time: datetime_to_timestamp_ms(&raw.update_time)?,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        if self.is_directory {
            ResourceKind::Directory
        } else {
            ResourceKind::File
        }
    }
}

/// 目录信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub dir_id: String,
    pub name: String,
    pub create_time: i64,
    pub update_time: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDirectory {
    #[serde(deserialize_with = "lenient_string")]
    dir_id: String,
    #[serde(default)]
    name: String,
    create_time: String,
    update_time: String,
}

impl DirectoryInfo {
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let raw = RawDirectory::deserialize(entry)
            .map_err(|e| BitqiuError::Api(format!("解析目录条目失败: {}", e)))?;

        Ok(Self {
            dir_id: raw.dir_id,
            name: raw.name,
            create_time: datetime_to_timestamp_ms(&raw.create_time)?,
            update_time: datetime_to_timestamp_ms(&raw.update_time)?,
        })
    }
}

/// 下载链接信息
///
/// url 有服务端设定的有效期，客户端不跟踪
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub md5: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub size: u64,
    pub url: String,
}

impl DownloadInfo {
    pub fn from_value(data: Value) -> Result<Self> {
        serde_json::from_value(data)
            .map_err(|e| BitqiuError::Api(format!("解析下载链接失败: {}", e)))
    }
}

/// 收藏操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    Add,
    Cancel,
}

// =====================================================
// 宽松反序列化：服务端对同一字段时而返回字符串、时而返回数字
// =====================================================

/// 把 JSON 值当作布尔标志：bool、非零数字、"true"/"1"
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("期望字符串或数字, 实际为 {}", other))),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("不是整数: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("不是整数: {}", s))),
        Value::Null => Ok(0),
        other => Err(de::Error::custom(format!("期望整数, 实际为 {}", other))),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_u64(deserializer)?.ok_or_else(|| de::Error::custom("缺少大小"))
}

pub(crate) fn lenient_opt_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("不是非负整数: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("不是非负整数: {}", s))),
        other => Err(de::Error::custom(format!("期望非负整数, 实际为 {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_directory_marker_presence() {
        let base = json!({
            "resourceId": "r1",
            "name": "a",
            "size": 10,
            "createTime": "2023-01-01 00:00:00",
            "updateTime": "2023-01-02 00:00:00"
        });

        let file = FileResource::from_entry(&base).unwrap();
        assert!(!file.is_directory);
        assert_eq!(file.kind(), ResourceKind::File);

        // 取值为假也算目录
        for marker in [json!(0), json!(""), json!(false), json!(1)] {
            let mut entry = base.clone();
            entry["dirType"] = marker;
            let resource = FileResource::from_entry(&entry).unwrap();
            assert!(resource.is_directory);
            assert_eq!(resource.kind(), ResourceKind::Directory);
        }

        let mut entry = base.clone();
        entry["dirType"] = Value::Null;
        assert!(!FileResource::from_entry(&entry).unwrap().is_directory);
    }

    #[test]
    fn test_file_resource_timestamps_and_lenient_fields() {
        let entry = json!({
            "resourceId": 12345,
            "name": "movie.mkv",
            "size": "2048",
            "createTime": "2023-01-01 00:00:00",
            "updateTime": "2023-01-01 00:00:01"
        });
        let resource = FileResource::from_entry(&entry).unwrap();
        assert_eq!(resource.resource_id, "12345");
        assert_eq!(resource.size, Some(2048));
        assert_eq!(
            resource.create_time,
            datetime_to_timestamp_ms("2023-01-01 00:00:00").unwrap()
        );
        assert_eq!(resource.update_time - resource.create_time, 1000);
    }

    #[test]
    fn test_bad_timestamp_fails_entry() {
        let entry = json!({
            "resourceId": "r1",
            "name": "a",
            "createTime": "2023/01/01",
            "updateTime": "2023-01-01 00:00:00"
        });
        assert!(FileResource::from_entry(&entry).unwrap_err().is_api_error());
    }

    #[test]
    fn test_directory_info_from_entry() {
        let entry = json!({
            "dirId": "d1",
            "name": "docs",
            "createTime": "2024-05-01 08:00:00",
            "updateTime": "2024-05-01 09:00:00"
        });
        let dir = DirectoryInfo::from_entry(&entry).unwrap();
        assert_eq!(dir.dir_id, "d1");
        assert_eq!(dir.update_time - dir.create_time, 3_600_000);

        assert!(DirectoryInfo::from_entry(&json!({"name": "x"})).is_err());
    }

    #[test]
    fn test_user_info_parsing() {
        let data = json!({
            "userId": 10086,
            "rootDirId": "root-1",
            "privilege": {
                "cloudDownload": true,
                "cloudDownloadCountRemain": 5,
                "cloudVideoPlay": 1,
                "cloudVideoPlayCountRemain": "3",
                "cloudMusicPlay": false,
                "cloudMusicPlayCountRemain": 0,
                "cloudDocPlay": true,
                "cloudDocPlayCountRemain": 9,
                "privilegedGearName": "普通用户"
            }
        });
        let info = UserInfo::from_value(data).unwrap();
        assert_eq!(info.user_id, 10086);
        assert_eq!(info.root_dir_id, "root-1");
        assert!(info.privilege.cloud_download);
        assert!(info.privilege.cloud_video_play);
        assert_eq!(info.privilege.cloud_video_play_count_remain, 3);
        assert_eq!(info.privilege.privileged_gear_name, "普通用户");

        assert!(UserInfo::from_value(json!({"userId": 1})).is_err());
    }

    #[test]
    fn test_download_info_parsing() {
        let info = DownloadInfo::from_value(json!({
            "md5": "d41d8cd98f00b204e9800998ecf8427e",
            "size": 0,
            "url": "https://dl.bitqiu.com/x"
        }))
        .unwrap();
        assert_eq!(info.size, 0);
        assert!(DownloadInfo::from_value(json!({"md5": "x", "url": "u"})).is_err());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("true")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_rename_type() {
        assert_eq!(ResourceKind::Directory.rename_type(), "1");
        assert_eq!(ResourceKind::File.rename_type(), "2");
    }
}
