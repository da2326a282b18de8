//! 博客写入服务 - 业务能力层
//!
//! 只负责"把博客文章写成文件"能力，不关心流程

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::FileError;

/// 博客写入服务
///
/// 职责：
/// - 按 `blog_<主题>_<论文序号>.md` 命名
/// - 原样写入文本，不做任何格式处理
pub struct BlogWriter {
    output_dir: PathBuf,
}

impl BlogWriter {
    /// 写入当前目录
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }

    /// 使用自定义输出目录创建
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
        }
    }

    /// 生成文件名，主题中的空白替换为下划线
    pub fn file_name(topic: &str, paper_index: i64) -> String {
        let topic = topic.split_whitespace().collect::<Vec<_>>().join("_");
        format!("blog_{}_{}.md", topic, paper_index)
    }

    /// 写入博客文章
    ///
    /// # 参数
    /// - `topic`: 研究主题
    /// - `paper_index`: 选中论文的序号
    /// - `content`: 博客正文
    ///
    /// # 返回
    /// 返回写入的文件路径
    pub fn write(&self, topic: &str, paper_index: i64, content: &str) -> Result<PathBuf, FileError> {
        if !self.output_dir.as_os_str().is_empty() && !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).map_err(|source| FileError::CreateDirFailed {
                path: self.output_dir.display().to_string(),
                source,
            })?;
        }

        let path = self.output_dir.join(Self::file_name(topic, paper_index));
        debug!("写入博客: {} ({} 字符)", path.display(), content.chars().count());

        fs::write(&path, content).map_err(|source| FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;

        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Default for BlogWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(
            BlogWriter::file_name("diffusion models", 1),
            "blog_diffusion_models_1.md"
        );
        assert_eq!(BlogWriter::file_name("  gan  ", 0), "blog_gan_0.md");
    }

    #[test]
    fn test_write_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = BlogWriter::with_dir(tmp.path().join("posts"));

        let path = writer.write("graph learning", 2, "# Title\n\nBody").unwrap();

        assert_eq!(path.file_name().unwrap(), "blog_graph_learning_2.md");
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title\n\nBody");
    }
}
