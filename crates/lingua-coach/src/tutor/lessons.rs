//! Personalized lesson topics derived from the learner's recent history.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::completion::{CompletionClient, CompletionRequest, Message};
use crate::error::CompletionError;
use crate::metrics;
use crate::phrasebook;
use crate::profile_db::{ChatEntry, UserProfile};
use crate::utils::OutputParser;

pub const LESSON_COUNT: usize = 3;
/// Below this many active entries there is nothing to analyze.
pub const MIN_ENTRIES_FOR_ANALYSIS: usize = 3;
const ANALYZED_ENTRIES: usize = 10;
const MIN_LESSON_CHARS: usize = 10;

pub const NOT_ENOUGH_DATA_CRITIQUE: &str = "We need more conversation data to provide personalized feedback.";
pub const STARTER_LESSONS: [&str; 3] = [
    "Practice common greetings and self-introductions for everyday situations",
    "Learn essential words and phrases for shopping, dining, and transportation",
    "Master basic question formats and appropriate response patterns",
];

pub const ANALYSIS_FAILED_CRITIQUE: &str = "We encountered an issue analyzing your conversation.";
pub const ANALYSIS_FAILED_LESSONS: [&str; 3] = [
    "Learn techniques to speak more naturally and maintain longer discussions without pauses",
    "Build specialized vocabulary sets based on your interests and conversation topics",
    "Practice using correct grammar structures within natural conversation flow",
];

pub const POSITIVE_CRITIQUE: &str = "You're making good progress in your conversation skills!";

const CRITIQUE_KEYWORDS: [&str; 3] = ["improvement", "needs", "could improve"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonPlan {
    pub critique: String,
    pub lessons: Vec<String>,
}

impl LessonPlan {
    fn fixed(critique: &str, lessons: [&str; 3]) -> Self {
        Self {
            critique: critique.to_string(),
            lessons: lessons.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Result of [`LessonPlanner::plan`] together with the analysis prompt that
/// was sent, if any, so callers can record it on the profile.
#[derive(Debug, Clone)]
pub struct PlannedLessons {
    pub plan: LessonPlan,
    pub analysis_prompt: Option<String>,
}

pub struct LessonPlanner {
    client: Arc<dyn CompletionClient>,
}

impl LessonPlanner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub async fn plan(&self, profile: &UserProfile, language_code: &str) -> PlannedLessons {
        let active: Vec<&ChatEntry> = profile.active_history().collect();
        if active.len() < MIN_ENTRIES_FOR_ANALYSIS {
            info!("Only {} active entries for {}, using starter lessons", active.len(), profile.username);
            return PlannedLessons {
                plan: LessonPlan::fixed(NOT_ENOUGH_DATA_CRITIQUE, STARTER_LESSONS),
                analysis_prompt: None,
            };
        }

        let recent = &active[active.len().saturating_sub(ANALYZED_ENTRIES)..];
        let analysis_prompt = analysis_prompt(recent);

        let plan = match self.analyze_and_generate(&analysis_prompt, language_code).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Lesson generation failed for {}: {}", profile.username, e);
                LessonPlan::fixed(ANALYSIS_FAILED_CRITIQUE, ANALYSIS_FAILED_LESSONS)
            }
        };
        PlannedLessons { plan, analysis_prompt: Some(analysis_prompt) }
    }

    async fn analyze_and_generate(&self, analysis_prompt: &str, language_code: &str) -> Result<LessonPlan, CompletionError> {
        let analysis = self
            .call(CompletionRequest::new(vec![Message::system(analysis_prompt)], 400, 0.5).primary())
            .await?;
        let generated = self
            .call(CompletionRequest::new(vec![Message::system(generation_prompt(&analysis))], 400, 0.7).primary())
            .await?;

        Ok(LessonPlan {
            critique: critique_from(&analysis),
            lessons: lessons_from(&generated, language_code),
        })
    }

    async fn call(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let result = self.client.complete(request).await;
        metrics::inc_completion("lessons", if result.is_ok() { "ok" } else { "error" });
        result
    }
}

fn analysis_prompt(entries: &[&ChatEntry]) -> String {
    let mut conversation = String::new();
    for entry in entries {
        if let Some(user) = entry.user_text() {
            conversation.push_str(&format!("User: {}\n", user));
        }
        conversation.push_str(&format!("AI: {}\n", entry.ai));
    }

    format!(
        "You are an expert language teacher.\n\n\
         Analyze this conversation where the user is practicing the language based on the user's past conversation history:\n\n\
         {}\n\n\
         1. What language level does the user appear to be at (beginner, intermediate, advanced)?\n\
         2. What are the user's main strengths in the language?\n\
         3. What are 3 specific areas where the user needs improvement?\n\
         4. What topics does the user seem interested in discussing?\n\n\
         Be concise but specific in your analysis.",
        conversation.trim_end()
    )
}

fn generation_prompt(analysis: &str) -> String {
    format!(
        "Based on the analysis of this language learner:\n\n\
         {}\n\n\
         Generate EXACTLY 3 specific, personalized lesson topics that would help this user improve their language skills.\n\n\
         Each lesson topic should:\n\
         1. Be a single plain sentence (20-30 words) describing a learning activity or lesson\n\
         2. Focus on a specific skill area that would benefit this learner\n\
         3. Be phrased as an instruction or suggestion (e.g., \"Practice using past tense verbs in everyday conversation scenarios\")\n\
         4. Avoid any special formatting, colons, bullet points, etc.\n\n\
         Provide exactly 3 plain, descriptive sentences. No titles, no colons, no quotation marks.",
        analysis.trim()
    )
}

/// Up to two analysis lines that talk about weaknesses.
pub fn critique_from(analysis: &str) -> String {
    let lines = OutputParser::lines_mentioning(analysis, &CRITIQUE_KEYWORDS);
    if lines.is_empty() {
        POSITIVE_CRITIQUE.to_string()
    } else {
        lines.iter().take(2).copied().collect::<Vec<_>>().join(" ")
    }
}

/// Plain lesson sentences from model output, backfilled to [`LESSON_COUNT`].
pub fn lessons_from(generated: &str, language_code: &str) -> Vec<String> {
    let mut lessons: Vec<String> = Vec::with_capacity(LESSON_COUNT);
    for line in generated.lines() {
        let unquoted: String = OutputParser::strip_marker(line)
            .chars()
            .filter(|c| *c != '"' && *c != '\'')
            .collect();
        let body = OutputParser::split_label(&unquoted).body.to_string();
        if body.chars().count() > MIN_LESSON_CHARS && !lessons.contains(&body) {
            lessons.push(body);
        }
    }

    lessons.truncate(LESSON_COUNT);
    for fallback in phrasebook::backfill_lessons(language_code) {
        if lessons.len() >= LESSON_COUNT {
            break;
        }
        if !lessons.iter().any(|l| l == fallback) {
            lessons.push(fallback.to_string());
        }
    }
    lessons
}
