//! Feedback-summary translation: the document shape the pipeline serves.
//! Arrays go through the batch path, single feedback strings through the
//! single-text path, each with the context tag that matches its field.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::ContextTag;
use super::pipeline::Resolver;
use super::SUPPORTED_LANGUAGES;

/// Per-stage rating with free-text feedback. The numeric rating is never
/// translated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRating {
    pub rating: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    #[serde(default)]
    pub personality_insights: Option<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
    #[serde(default)]
    pub recommended_focus: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub stage_ratings: HashMap<String, StageRating>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

impl Resolver {
    /// Translate a whole summary for one language.
    pub async fn translate_summary(
        &self,
        summary: &FeedbackSummary,
        language: &str,
    ) -> FeedbackSummary {
        let strengths = self
            .resolve_many(&summary.strengths, language, ContextTag::StrengthComment)
            .await;
        let improvements = self
            .resolve_many(
                &summary.improvements,
                language,
                ContextTag::ImprovementSuggestion,
            )
            .await;

        let mut stage_ratings = HashMap::with_capacity(summary.stage_ratings.len());
        for (stage, rating) in &summary.stage_ratings {
            let feedback = self
                .resolve(&rating.feedback, language, ContextTag::StageRating)
                .await;
            stage_ratings.insert(
                stage.clone(),
                StageRating {
                    rating: rating.rating,
                    feedback,
                },
            );
        }

        let ai_analysis = match &summary.ai_analysis {
            Some(analysis) => Some(self.translate_analysis(analysis, language).await),
            None => None,
        };

        FeedbackSummary {
            strengths,
            improvements,
            stage_ratings,
            ai_analysis,
        }
    }

    async fn translate_analysis(&self, analysis: &AiAnalysis, language: &str) -> AiAnalysis {
        let personality_insights = match &analysis.personality_insights {
            Some(text) => Some(
                self.resolve(text, language, ContextTag::PersonalityInsights)
                    .await,
            ),
            None => None,
        };
        let communication_style = match &analysis.communication_style {
            Some(text) => Some(
                self.resolve(text, language, ContextTag::CommunicationStyle)
                    .await,
            ),
            None => None,
        };
        let recommended_focus = self
            .resolve_many(
                &analysis.recommended_focus,
                language,
                ContextTag::RecommendedFocus,
            )
            .await;
        let next_steps = self
            .resolve_many(&analysis.next_steps, language, ContextTag::NextSteps)
            .await;

        AiAnalysis {
            personality_insights,
            communication_style,
            recommended_focus,
            next_steps,
        }
    }

    /// Translate a summary for every supported language. Provider failures
    /// degrade individual fields to their original text; a language never
    /// fails as a whole.
    pub async fn translate_summary_all(
        &self,
        summary: &FeedbackSummary,
    ) -> HashMap<String, FeedbackSummary> {
        let mut out = HashMap::new();
        for language in SUPPORTED_LANGUAGES {
            let translated = self.translate_summary(summary, language).await;
            out.insert((*language).to_string(), translated);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_deserializes_from_wire_shape() {
        let json = r#"{
            "strengths": ["good opening"],
            "improvements": ["work on closing techniques"],
            "stageRatings": {
                "opening": {"rating": 4, "feedback": "good opening approach"}
            },
            "aiAnalysis": {
                "personalityInsights": "professional approach",
                "recommendedFocus": ["discovery"]
            }
        }"#;
        let summary: FeedbackSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.strengths, vec!["good opening"]);
        assert_eq!(summary.stage_ratings.get("opening").unwrap().rating, 4);
        let analysis = summary.ai_analysis.unwrap();
        assert_eq!(
            analysis.personality_insights.as_deref(),
            Some("professional approach")
        );
        assert!(analysis.next_steps.is_empty());
    }
}
