// 网盘接口路径

pub const API_USER_INFO: &str = "/user/getInfo";

pub const API_RESOURCE_PAGES: &str = "/apiToken/cfi/fs/resources/pages";
pub const API_SEARCH: &str = "/apiToken/cfi/fs/search/name";
pub const API_RESOURCE_COPY: &str = "/apiToken/cfi/fs/async/copy";

pub const API_DIR_LIST: &str = "/resource/dirList";
pub const API_DIR_CREATE: &str = "/resource/create";
pub const API_RESOURCE_DELETE: &str = "/resource/delete";
pub const API_RESOURCE_RENAME: &str = "/resource/rename";
/// 服务端的移动接口名为 remove
pub const API_RESOURCE_MOVE: &str = "/resource/remove";

pub const API_COLLECTION_ADD: &str = "/collect/add";
pub const API_COLLECTION_CANCEL: &str = "/collect/cancel";

pub const API_TASK_LIST: &str = "/cloudDownload/getUserTaskList";
pub const API_TASK_ADD: &str = "/cloudDownload/addTasks";
pub const API_TASK_CANCEL: &str = "/cloudDownload/cancelTask";

pub const API_DOWNLOAD_URL: &str = "/download/getUrl";

/// 每日签到
pub const API_SIGNIN: &str = "/integral/randomSignin";
