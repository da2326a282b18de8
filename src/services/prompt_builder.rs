//! 提示词构建 - 业务能力层
//!
//! 只负责把论文信息拼成提示词文本，不调用 LLM

use crate::models::PaperRecord;

/// 构建论文分析提示词
///
/// 包含标题、作者、发表日期与摘要
pub fn build_analysis_prompt(paper: &PaperRecord) -> String {
    format!(
        "Analyze the following research paper:\n\
         \n\
         Title: {title}\n\
         Authors: {authors}\n\
         Published: {date}\n\
         Summary: {summary}\n\
         \n\
         Provide a concise analysis covering:\n\
         1. Main research question\n\
         2. Key methodology\n\
         3. Primary findings\n\
         4. Implications for the field\n\
         \n\
         Analysis:",
        title = paper.title,
        authors = paper.author_list(),
        date = paper.display_date(),
        summary = paper.abstract_text,
    )
}

/// 构建博客生成提示词
///
/// 在论文信息之外附带链接和分析结果，并列出博客必须包含的六个部分
///
/// # 参数
/// - `paper`: 选中的论文
/// - `analysis`: 上一步生成的分析文本
pub fn build_blog_prompt(paper: &PaperRecord, analysis: &str) -> String {
    let url = if paper.url.trim().is_empty() {
        "No URL available"
    } else {
        paper.url.as_str()
    };

    format!(
        "Write a technical blog post based on this paper analysis:\n\
         \n\
         Paper: {title}\n\
         Authors: {authors}\n\
         Published: {date}\n\
         URL: {url}\n\
         Summary: {summary}\n\
         Analysis: {analysis}\n\
         \n\
         Create a 500-word technical blog post with:\n\
         1. A catchy title\n\
         2. Brief introduction to the problem\n\
         3. Summary of the approach\n\
         4. Key findings and their significance\n\
         5. Conclusion with future implications\n\
         6. Include a \"References\" section at the end with the paper URL\n\
         \n\
         Format the blog as Markdown with proper headers, links, and styling.\n\
         \n\
         Blog Post:",
        title = paper.title,
        authors = paper.author_list(),
        date = paper.display_date(),
        url = url,
        summary = paper.abstract_text,
        analysis = analysis,
    )
}
