// 本地文件哈希
//
// 用于将本地文件与服务端返回的 MD5 对比校验，不参与传输

use crate::error::{BitqiuError, Result};
use md5::Context as Md5Context;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// 读取缓冲区大小
const CHUNK_SIZE: usize = 64 * 1024;

/// 流式计算文件 MD5，返回小写十六进制字符串
pub async fn calculate_file_md5(path: &Path) -> Result<String> {
    let path = path.to_path_buf();

    // 在阻塞线程池中执行文件 I/O
    tokio::task::spawn_blocking(move || calculate_file_md5_sync(&path))
        .await
        .map_err(|e| BitqiuError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// 同步版本
pub fn calculate_file_md5_sync(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(BitqiuError::FileNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = Md5Context::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.consume(&buffer[..n]);
        total += n as u64;
    }

    let digest = format!("{:x}", hasher.compute());
    debug!("文件 MD5 计算完成: path={:?}, size={}, md5={}", path, total, digest);
    Ok(digest)
}
