//! Language detection, used to skip provider calls for text that is already
//! in the target language (re-translating approved output degrades it).

use whatlang::{detect, Lang};

/// Detect the dominant language of `text`. Returns an ISO 639-1 code, or
/// None when detection is unreliable, as it usually is on short phrases.
pub fn detect_language(text: &str) -> Option<String> {
    let info = detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    Some(lang_to_code(info.lang()))
}

fn lang_to_code(lang: Lang) -> String {
    match lang {
        Lang::Eng => "en",
        Lang::Est => "et",
        Lang::Spa => "es",
        Lang::Rus => "ru",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Fin => "fi",
        Lang::Lav => "lv",
        Lang::Lit => "lt",
        Lang::Pol => "pl",
        Lang::Ukr => "uk",
        _ => "other",
    }
    .to_string()
}

/// Whether `text` already reads as `language`. Unreliable detection counts
/// as "no", so short or ambiguous inputs still go through translation.
pub fn is_in_language(text: &str, language: &str) -> bool {
    detect_language(text).as_deref() == Some(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_text_detected() {
        let text = "Будьте более прямыми в попытках закрытия и практикуйте техники";
        assert!(is_in_language(text, "ru"));
        assert!(!is_in_language(text, "es"));
    }

    #[test]
    fn english_text_not_flagged_as_target() {
        let text = "Ask more probing questions to understand customer needs better";
        assert!(!is_in_language(text, "ru"));
        assert!(!is_in_language(text, "et"));
    }

    #[test]
    fn unreliable_short_input_returns_none() {
        assert_eq!(detect_language(""), None);
    }
}
