//! Learning aids that run beside the chat: suggestions, lessons, translation
//! and pronunciation practice.

pub mod exercises;
pub mod lessons;
pub mod suggestions;

pub use exercises::{Difficulty, ExerciseGenerator};
pub use lessons::{LessonPlan, LessonPlanner, PlannedLessons};
pub use suggestions::SuggestionGenerator;

use std::sync::Arc;
use tracing::info;

use crate::completion::CompletionClient;
use crate::conversation::profile_language;
use crate::language;
use crate::profile_db::ProfileService;

/// Profile-aware front for the generators.
#[derive(Clone)]
pub struct Tutor {
    profiles: ProfileService,
    suggestions: Arc<SuggestionGenerator>,
    lessons: Arc<LessonPlanner>,
    exercises: Arc<ExerciseGenerator>,
}

impl Tutor {
    pub fn new(profiles: ProfileService, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            profiles,
            suggestions: Arc::new(SuggestionGenerator::new(client.clone())),
            lessons: Arc::new(LessonPlanner::new(client.clone())),
            exercises: Arc::new(ExerciseGenerator::new(client)),
        }
    }

    pub fn exercises(&self) -> &ExerciseGenerator {
        &self.exercises
    }

    /// A supplied language becomes the profile's language.
    pub async fn suggestions(&self, username: &str, language: Option<&str>) -> Vec<String> {
        let mut profile = self.profiles.load(username);
        if let Some(requested) = language.map(str::trim).filter(|l| !l.is_empty()) {
            let code = language::normalize(requested);
            if profile.language != code || profile.locale != code {
                info!("Updating language of {} to {}", username, code);
                profile.set_language(&code);
                self.profiles.save(&mut profile);
            }
        }
        let language_code = profile_language(&profile);
        self.suggestions.suggest(&profile, &language_code).await
    }

    /// Records the analysis prompt on the profile when one was sent.
    pub async fn lessons(&self, username: &str, language: Option<&str>) -> LessonPlan {
        let mut profile = self.profiles.load(username);
        let language_code = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(language::normalize)
            .unwrap_or_else(|| profile_language(&profile));

        let planned = self.lessons.plan(&profile, &language_code).await;
        if let Some(prompt) = planned.analysis_prompt {
            profile.lessons.push(prompt);
            self.profiles.save(&mut profile);
        }
        planned.plan
    }
}
