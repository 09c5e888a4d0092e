// ==========================================
// 报关单生成系统 - 原子写出
// ==========================================
// 职责: 先写同目录临时文件，再原子改名到目标路径
// 红线: 目标路径上不会出现写了一半的文件
// ==========================================

use std::io;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::debug;

/// 目标文件所在目录（相对文件名取当前目录）
pub fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 原子写出
///
/// # 参数
/// - target: 最终路径
/// - write: 向临时路径写出内容的闭包
pub fn write_atomically<E, F>(target: &Path, write: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&Path) -> Result<(), E>,
{
    let dir = parent_dir(target);
    std::fs::create_dir_all(&dir)?;

    let suffix = target
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let tmp = Builder::new()
        .prefix(".customs-sheet-")
        .suffix(&suffix)
        .tempfile_in(&dir)?;

    write(tmp.path())?;
    tmp.persist(target).map_err(|e| e.error)?;
    debug!(target = %target.display(), "文件已原子写出");
    Ok(())
}
