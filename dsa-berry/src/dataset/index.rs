//! 样本文件索引.
//!
//! 输入根目录下, 只有以固定前缀开头的目录项才是样本. 目录项按文件名排序,
//! 因此同一目录总是得到同一索引顺序.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{DatasetError, Result};

/// 取文件名中 **最后一段** 连续数字作为病例号.
///
/// 文件名不含数字, 或这段数字超出 `u32` 范围 (大于 4294967295) 时返回 `Err`.
/// 前导零会被忽略.
pub fn case_id(name: &str) -> Result<u32> {
    name.rsplit(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
        .ok_or_else(|| DatasetError::NoCaseId(name.to_owned()))
}

/// 单个样本的目录项.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseEntry {
    name: String,
    case_id: u32,
}

impl CaseEntry {
    /// 目录项文件名.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 病例号.
    #[inline]
    pub fn case_id(&self) -> u32 {
        self.case_id
    }
}

/// 按文件名排序的样本索引.
#[derive(Clone, Debug)]
pub struct CaseIndex {
    root: PathBuf,
    entries: Vec<CaseEntry>,
}

impl CaseIndex {
    /// 列出 `root` 下所有以 `prefix` 开头的目录项并建立索引.
    ///
    /// 不满足前缀的目录项会被忽略; 满足前缀但不含数字的目录项使构建失败.
    pub fn scan<P: AsRef<Path>>(root: P, prefix: &str) -> Result<Self> {
        let root = root.as_ref();
        let io_err = |source| DatasetError::Io {
            path: root.to_owned(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!("skipping non UTF-8 entry {name:?} in {}", root.display()),
            }
        }
        Self::from_names(root, names, prefix)
    }

    /// 从给定的目录项文件名建立索引. 不访问文件系统.
    pub fn from_names<P, I, S>(root: P, names: I, prefix: &str) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut total = 0usize;
        let mut names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .inspect(|_| total += 1)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort_unstable();

        let entries = names
            .into_iter()
            .map(|name| case_id(&name).map(|case_id| CaseEntry { name, case_id }))
            .collect::<Result<Vec<_>>>()?;

        let root = root.as_ref().to_owned();
        debug!(
            "{} of {total} entries in {} skipped (prefix `{prefix}`)",
            total - entries.len(),
            root.display()
        );
        info!("{} samples indexed in {}", entries.len(), root.display());
        Ok(Self { root, entries })
    }

    /// 索引根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何样本.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取第 `index` 个样本. 越界时返回 `Err`.
    pub fn get(&self, index: usize) -> Result<&CaseEntry> {
        self.entries.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// 第 `index` 个样本文件的完整路径. 越界时返回 `Err`.
    pub fn path(&self, index: usize) -> Result<PathBuf> {
        Ok(self.root.join(self.get(index)?.name()))
    }

    /// 按索引序迭代所有样本.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &CaseEntry> {
        self.entries.iter()
    }
}
