//! Context tags attached to translation requests.
//! The serving side prepends an English context prefix to bias provider
//! quality, then strips the provider's *translated* echo of that prefix
//! from the response.

use serde::{Deserialize, Serialize};

/// What kind of text is being translated. Drives the quality-bias prefix and
/// decides whether static matching is attempted at all: AI-generated content
/// is full sentences, where partial substitution is unreliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextTag {
    #[default]
    General,
    SalesFeedback,
    ImprovementSuggestion,
    StrengthComment,
    StageRating,
    PersonalityInsights,
    CommunicationStyle,
    RecommendedFocus,
    NextSteps,
}

impl ContextTag {
    /// Wire name, as sent in the `context` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextTag::General => "general",
            ContextTag::SalesFeedback => "sales_feedback",
            ContextTag::ImprovementSuggestion => "improvement_suggestion",
            ContextTag::StrengthComment => "strength_comment",
            ContextTag::StageRating => "stage_rating",
            ContextTag::PersonalityInsights => "personalityInsights",
            ContextTag::CommunicationStyle => "communicationStyle",
            ContextTag::RecommendedFocus => "recommendedFocus",
            ContextTag::NextSteps => "nextSteps",
        }
    }

    /// English prefix prepended to the source text before the provider call.
    pub fn prefix(&self) -> &'static str {
        match self {
            ContextTag::General => "",
            ContextTag::SalesFeedback => "Sales feedback: ",
            ContextTag::ImprovementSuggestion => "Improvement suggestion: ",
            ContextTag::StrengthComment => "Strength comment: ",
            ContextTag::StageRating => "Sales stage rating feedback: ",
            ContextTag::PersonalityInsights => "Personality analysis: ",
            ContextTag::CommunicationStyle => "Communication style analysis: ",
            ContextTag::RecommendedFocus => "Recommended focus area: ",
            ContextTag::NextSteps => "Next step: ",
        }
    }

    /// AI-generated content skips static matching on the serving side and
    /// goes straight to the live tier.
    pub fn is_ai_content(&self) -> bool {
        !matches!(self, ContextTag::General)
    }

    /// Wrap the source text with this tag's prefix.
    pub fn apply(&self, text: &str) -> String {
        let prefix = self.prefix();
        if prefix.is_empty() {
            text.to_string()
        } else {
            format!("{prefix}{text}")
        }
    }
}

/// Translated echoes of the context prefixes, per language. The provider
/// translates the prefix along with the payload; any of these leading the
/// response must be removed.
fn translated_prefixes(language: &str) -> &'static [&'static str] {
    match language {
        "et" => &[
            "Müügi tagasiside:",
            "Parandamise soovitus:",
            "Tugevuse kommentaar:",
            "Müügi etapi hinnangu tagasiside:",
            "Isiksuse analüüs:",
            "Suhtlusstiili analüüs:",
            "Soovitatav fookuse ala:",
            "Järgmine samm:",
        ],
        "es" => &[
            "Comentarios de ventas:",
            "Sugerencia de mejora:",
            "Comentario de fortaleza:",
            "Comentarios de calificación de etapa de ventas:",
            "Análisis de personalidad:",
            "Análisis de estilo de comunicación:",
            "Área de enfoque recomendada:",
            "Siguiente paso:",
        ],
        "ru" => &[
            "Отзыв о продажах:",
            "Предложение по улучшению:",
            "Комментарий о сильных сторонах:",
            "Отзыв о рейтинге этапа продаж:",
            "Анализ личности:",
            "Анализ стиля общения:",
            "Рекомендуемая область фокуса:",
            "Следующий шаг:",
        ],
        _ => &[],
    }
}

/// Strip a leading translated context prefix from a provider response.
/// At most one prefix is removed.
pub fn strip_translated_prefix(translation: &str, language: &str) -> String {
    for prefix in translated_prefixes(language) {
        if let Some(rest) = translation.strip_prefix(prefix) {
            return rest.trim_start().to_string();
        }
    }
    translation.to_string()
}
