// 网盘API模块

pub mod client;
pub mod cloud_dl;
pub mod endpoints;
pub mod pagination;
pub mod types;

pub use client::BitqiuClient;
pub use cloud_dl::{DownloadTask, TaskStatus, MAX_BATCH_ITEMS, MAX_DOWNLOAD_TASKS};
pub use pagination::{Page, PaginatedLister};
pub use types::*;
