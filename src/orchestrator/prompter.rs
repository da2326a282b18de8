//! 用户交互
//!
//! 工作流发起提问时，由 [`Prompter`] 负责拿到用户的原始回答

use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// 向用户提问并返回原始回答
pub trait Prompter {
    fn ask(&mut self, prompt: &str, suggestions: &[String]) -> Result<String>;

    /// 在提问前向用户展示信息，默认不展示
    fn show(&mut self, _text: &str) {}

    /// 是否可以主动提问（列出论文让用户挑选等）
    fn is_interactive(&self) -> bool {
        true
    }
}

/// 终端交互
pub struct ConsolePrompter<R> {
    input: R,
}

impl ConsolePrompter<std::io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: std::io::stdin().lock(),
        }
    }
}

impl<R: BufRead> ConsolePrompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Prompter for ConsolePrompter<R> {
    fn ask(&mut self, prompt: &str, suggestions: &[String]) -> Result<String> {
        let mut stdout = std::io::stdout();
        if suggestions.is_empty() {
            write!(stdout, "\n{} ", prompt)?;
        } else {
            write!(stdout, "\n{} [{}] ", prompt, suggestions.join(" / "))?;
        }
        stdout.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line).context("读取用户输入失败")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn show(&mut self, text: &str) {
        println!("\n{}", text);
    }
}

/// 按顺序返回预设回答，并记录收到的问题
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
    pub shown: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
            shown: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str, _suggestions: &[String]) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("没有预设回答: {}", prompt))
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}

/// 非交互模式：所有问题都回答空字符串
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn ask(&mut self, _prompt: &str, _suggestions: &[String]) -> Result<String> {
        Ok(String::new())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(prompter: &mut dyn Prompter) -> Result<String> {
        prompter.ask("Which source?", &["arxiv".to_string()])
    }

    #[test]
    fn test_console_prompter_reads_line() {
        let mut prompter = ConsolePrompter::new(std::io::Cursor::new("google_scholar\r\nrest\n"));
        assert_eq!(ask(&mut prompter).unwrap(), "google_scholar");
        assert_eq!(ask(&mut prompter).unwrap(), "rest");
        assert_eq!(ask(&mut prompter).unwrap(), "");
    }

    #[test]
    fn test_scripted_prompter_runs_out() {
        let mut prompter = ScriptedPrompter::new(["arxiv"]);
        assert_eq!(ask(&mut prompter).unwrap(), "arxiv");
        assert!(ask(&mut prompter).is_err());
        assert_eq!(prompter.asked.len(), 2);
    }
}
