//! 相关度排序服务 - 业务能力层
//!
//! 只负责给一批论文按主题打分排序，不关心论文从哪里来

use tracing::debug;

use crate::models::PaperRecord;

/// 不参与打分的常见词
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "over", "the", "to", "via", "with", "using", "towards", "based",
];

/// 标题中包含完整主题短语
const PHRASE_IN_TITLE: u32 = 10;
/// 摘要中包含完整主题短语
const PHRASE_IN_ABSTRACT: u32 = 5;
/// 每个关键词出现在标题中
const TERM_IN_TITLE: u32 = 3;
/// 每个关键词出现在摘要中
const TERM_IN_ABSTRACT: u32 = 1;

/// 相关度排序器
#[derive(Debug, Clone)]
pub struct RelevanceRanker {
    phrase: String,
    terms: Vec<String>,
}

impl RelevanceRanker {
    /// 根据研究主题创建排序器
    pub fn new(topic: &str) -> Self {
        Self {
            phrase: topic.trim().to_lowercase(),
            terms: key_terms(topic),
        }
    }

    /// 提取出的关键词
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// 计算单篇论文的相关度
    pub fn score(&self, paper: &PaperRecord) -> u32 {
        let title = paper.title.to_lowercase();
        let abstract_text = paper.abstract_text.to_lowercase();
        let mut score = 0;

        if !self.phrase.is_empty() {
            if title.contains(&self.phrase) {
                score += PHRASE_IN_TITLE;
            }
            if abstract_text.contains(&self.phrase) {
                score += PHRASE_IN_ABSTRACT;
            }
        }

        for term in &self.terms {
            if title.contains(term.as_str()) {
                score += TERM_IN_TITLE;
            }
            if abstract_text.contains(term.as_str()) {
                score += TERM_IN_ABSTRACT;
            }
        }
        score
    }

    /// 按相关度降序排列并截断
    ///
    /// 排序是稳定的，分数相同的论文保持原有顺序（即提交时间倒序）
    ///
    /// # 参数
    /// - `papers`: 待排序论文
    /// - `limit`: 保留数量
    pub fn rank(&self, papers: Vec<PaperRecord>, limit: usize) -> Vec<PaperRecord> {
        let mut scored: Vec<(u32, PaperRecord)> =
            papers.into_iter().map(|p| (self.score(&p), p)).collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if let Some((top, paper)) = scored.first() {
            debug!("最高相关度 {} : {}", top, paper.title);
        }

        scored.into_iter().take(limit).map(|(_, p)| p).collect()
    }
}

/// 主题拆分为小写关键词，去掉停用词与重复词
pub fn key_terms(topic: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in topic
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| !w.is_empty())
    {
        if !STOP_WORDS.contains(&word.as_str()) && !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, abstract_text: &str) -> PaperRecord {
        PaperRecord {
            id: title.to_string(),
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_key_terms_drop_stop_words() {
        assert_eq!(
            key_terms("A Survey of Diffusion Models for the Web"),
            vec!["survey", "diffusion", "models", "web"]
        );
        assert!(key_terms("of the and").is_empty());
    }

    #[test]
    fn test_score_weights() {
        let ranker = RelevanceRanker::new("diffusion models");
        // 标题短语 10 + 摘要短语 5 + 每个词标题 3 + 摘要 1
        let full = paper("Diffusion models at scale", "We train diffusion models.");
        assert_eq!(ranker.score(&full), 10 + 5 + 2 * 3 + 2);

        let terms_only = paper("Models of diffusion", "");
        assert_eq!(ranker.score(&terms_only), 2 * 3);

        assert_eq!(ranker.score(&paper("Graph networks", "Nothing here")), 0);
    }

    #[test]
    fn test_rank_is_stable_and_truncates() {
        let ranker = RelevanceRanker::new("transformers");
        let papers = vec![
            paper("first unrelated", ""),
            paper("Transformers everywhere", ""),
            paper("second unrelated", ""),
            paper("third unrelated", ""),
        ];
        let ranked = ranker.rank(papers, 3);
        let titles: Vec<&str> = ranked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Transformers everywhere", "first unrelated", "second unrelated"]
        );
    }
}
