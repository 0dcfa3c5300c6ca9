//! Prompt construction for the RAG query pipeline.
//!
//! Builds the grounded-answer prompt from a question plus retrieved context
//! blocks. Layout choices that matter for answer quality:
//!
//! - Context blocks carry numbered source citations `[1]..[n]` so answers
//!   can reference their evidence.
//! - The most relevant block is placed last, closest to the question
//!   (recency bias in decoder attention).
//! - Blocks are trimmed to a character budget, dropping the least relevant
//!   first.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Answer style requested for a RAG query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// Answer strictly from the provided sources, citing them.
    Grounded,
    /// Short, direct answers.
    Concise,
    /// Longer answers that compare and interpret the sources.
    Analytical,
}

impl PromptStyle {
    fn instructions(&self) -> &'static str {
        match self {
            PromptStyle::Grounded => {
                "Answer using only the numbered sources above. Cite sources \
                 as [n]. If the sources do not contain the answer, say so."
            }
            PromptStyle::Concise => {
                "Answer in one or two sentences using the numbered sources \
                 above. Cite sources as [n]."
            }
            PromptStyle::Analytical => {
                "Answer using the numbered sources above, comparing them \
                 where they disagree and noting gaps. Cite sources as [n]."
            }
        }
    }
}

/// One retrieved context block feeding the prompt.
#[derive(Debug, Clone)]
pub struct ContextBlock {
    /// Human-readable source label (usually the filename).
    pub source: String,
    pub text: String,
    pub score: f32,
}

/// Build the RAG answer prompt.
///
/// `blocks` must be ordered most-relevant-first (retrieval order). The
/// rendered prompt places the most relevant block last and keeps the total
/// context within `defaults::PROMPT_CONTEXT_BUDGET` characters.
pub fn build_rag_prompt(question: &str, blocks: &[ContextBlock], style: PromptStyle) -> String {
    build_rag_prompt_with_budget(question, blocks, style, defaults::PROMPT_CONTEXT_BUDGET)
}

/// Budget-parameterized variant, used directly by tests.
pub fn build_rag_prompt_with_budget(
    question: &str,
    blocks: &[ContextBlock],
    style: PromptStyle,
    budget: usize,
) -> String {
    // Keep the most relevant blocks that fit the budget.
    let mut kept: Vec<&ContextBlock> = Vec::new();
    let mut used = 0usize;
    for block in blocks {
        let len = block.text.chars().count();
        if kept.is_empty() && len > budget {
            // A single oversized block is truncated rather than dropped.
            kept.push(block);
            break;
        }
        if used + len > budget {
            break;
        }
        used += len;
        kept.push(block);
    }

    let mut prompt = String::new();
    prompt.push_str("You are a personal archive assistant.\n\nSources:\n");

    // Most relevant last: render in reverse retrieval order. Citation
    // numbers still follow retrieval order so [1] is the best source.
    for (idx, block) in kept.iter().enumerate().rev() {
        let text: String = block.text.chars().take(budget).collect();
        prompt.push_str(&format!(
            "[{}] ({})\n{}\n\n",
            idx + 1,
            block.source,
            text.trim()
        ));
    }

    if kept.is_empty() {
        prompt.push_str("(no sources retrieved)\n\n");
    }

    prompt.push_str(style.instructions());
    prompt.push_str("\n\nQuestion: ");
    prompt.push_str(question.trim());
    prompt.push('\n');
    prompt
}

/// Build a condense prompt that rewrites a follow-up question into a
/// standalone one, given prior (question, answer) turns.
pub fn build_condense_prompt(history: &[(String, String)], follow_up: &str) -> String {
    let mut prompt = String::from(
        "Rewrite the follow-up question as a single standalone question, \
         preserving all names and details from the conversation.\n\n",
    );
    for (question, answer) in history {
        prompt.push_str(&format!("Q: {}\nA: {}\n", question.trim(), answer.trim()));
    }
    prompt.push_str(&format!("\nFollow-up: {}\nStandalone question:", follow_up.trim()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(source: &str, text: &str, score: f32) -> ContextBlock {
        ContextBlock {
            source: source.to_string(),
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn test_best_source_rendered_last_but_numbered_first() {
        let blocks = vec![
            block("best.txt", "alpha evidence", 0.9),
            block("second.txt", "beta evidence", 0.5),
        ];
        let prompt = build_rag_prompt("what happened?", &blocks, PromptStyle::Grounded);

        let best_pos = prompt.find("alpha evidence").unwrap();
        let second_pos = prompt.find("beta evidence").unwrap();
        assert!(second_pos < best_pos, "best block should appear last");
        assert!(prompt.contains("[1] (best.txt)"));
        assert!(prompt.contains("[2] (second.txt)"));
    }

    #[test]
    fn test_budget_drops_least_relevant_blocks() {
        let blocks = vec![
            block("a.txt", &"x".repeat(50), 0.9),
            block("b.txt", &"y".repeat(50), 0.8),
            block("c.txt", &"z".repeat(50), 0.7),
        ];
        let prompt = build_rag_prompt_with_budget("q", &blocks, PromptStyle::Concise, 110);
        assert!(prompt.contains("a.txt"));
        assert!(prompt.contains("b.txt"));
        assert!(!prompt.contains("c.txt"));
    }

    #[test]
    fn test_single_oversized_block_truncated_not_dropped() {
        let blocks = vec![block("huge.txt", &"h".repeat(500), 0.9)];
        let prompt = build_rag_prompt_with_budget("q", &blocks, PromptStyle::Grounded, 100);
        assert!(prompt.contains("huge.txt"));
        assert!(!prompt.contains(&"h".repeat(101)));
    }

    #[test]
    fn test_no_sources_placeholder() {
        let prompt = build_rag_prompt("anything?", &[], PromptStyle::Grounded);
        assert!(prompt.contains("(no sources retrieved)"));
    }

    #[test]
    fn test_question_appears_at_end() {
        let prompt = build_rag_prompt("  where is my passport?  ", &[], PromptStyle::Concise);
        assert!(prompt.trim_end().ends_with("where is my passport?"));
    }

    #[test]
    fn test_condense_prompt_includes_history() {
        let history = vec![(
            "when did I visit Lisbon?".to_string(),
            "June 2023, per your itinerary.".to_string(),
        )];
        let prompt = build_condense_prompt(&history, "and where did I stay?");
        assert!(prompt.contains("Q: when did I visit Lisbon?"));
        assert!(prompt.contains("Follow-up: and where did I stay?"));
        assert!(prompt.trim_end().ends_with("Standalone question:"));
    }

    #[test]
    fn test_prompt_style_serde_snake_case() {
        let json = serde_json::to_string(&PromptStyle::Analytical).unwrap();
        assert_eq!(json, "\"analytical\"");
        let style: PromptStyle = serde_json::from_str("\"grounded\"").unwrap();
        assert_eq!(style, PromptStyle::Grounded);
    }
}
