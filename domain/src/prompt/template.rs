//! Prompt templates for the synthesis call

use super::request::{SynthesisPrompt, SynthesisRequest};

/// Templates for the aggregator's system and user prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt fixing the aggregator's role
    pub fn synthesis_system() -> &'static str {
        r#"You are an expert synthesis assistant. Your single task is to create the most accurate, comprehensive, and actionable final answer by combining the answers you are given.

CRITICAL INSTRUCTIONS:
1. Merge everything into ONE definitive, authoritative answer
2. Extract the best information from each answer
3. Resolve contradictions by choosing the most plausible and consistent information
4. Present the final answer as if it came from a single, highly knowledgeable source
5. Be concise but complete, with no redundancy or filler

OUTPUT FORMAT:
- Start directly with the answer
- Use ## headers for main sections only when they help
- Use **bold** for key points
- Use bullet points for lists
- Use fenced code blocks for technical content

AVOID:
- Mentioning "multiple responses", "different AI models" or where the information came from
- Phrases like "According to Response 1" or "Model X suggests"
- Redundant or contradictory statements
- Any commentary about the synthesis process itself

Your goal: give the user the single best answer to their question."#
    }

    /// User prompt listing the question and every answer by ordinal
    ///
    /// Blank answers are skipped; the remaining ones are numbered from 1
    /// without gaps.
    pub fn synthesis_prompt(question: &str, answers: &[&str]) -> String {
        let mut prompt = format!(
            "Question: \"{}\"\n\nResponses to combine:\n\n",
            question
        );

        let non_empty = answers.iter().map(|a| a.trim()).filter(|a| !a.is_empty());
        for (i, answer) in non_empty.enumerate() {
            prompt.push_str(&format!("Response {}:\n{}\n\n", i + 1, answer));
        }

        prompt.push_str(
            "Task: Create the single best, most comprehensive answer to the question by combining the valuable information from all responses above. Present it as one unified, authoritative answer without referencing the individual responses.",
        );

        prompt
    }

    /// Build both prompts for a synthesis request
    pub fn compose(request: &SynthesisRequest) -> SynthesisPrompt {
        let answers: Vec<&str> = request.responses.iter().map(|(_, t)| t.as_str()).collect();
        SynthesisPrompt {
            system: Self::synthesis_system().to_string(),
            user: Self::synthesis_prompt(&request.question, &answers),
        }
    }
}
