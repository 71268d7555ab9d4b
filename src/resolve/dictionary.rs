//! Curated per-language phrase dictionaries.
//! Matching order: exact (case-sensitive) → exact (case-insensitive) →
//! partial substitution. Partial matching compiles every key into one
//! case-insensitive word-boundary alternation per language, keys sorted by
//! descending length, so a single `replace_all` pass applies all independent
//! matches and a longer phrase always wins over a shorter one starting at
//! the same position ("closing techniques" over "closing").

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

/// Hand-approved translations, keyed by language then source phrase.
pub struct StaticDictionary {
    tables: HashMap<String, LanguageTable>,
}

struct LanguageTable {
    /// Original-case keys, checked first.
    exact: HashMap<String, String>,
    /// Lowercased keys for case-insensitive exact lookup.
    lower: HashMap<String, String>,
    /// One alternation over all keys, longest first. None for empty tables.
    pattern: Option<Regex>,
}

#[derive(Debug)]
pub enum DictionaryError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Pattern(regex::Error),
}

impl std::fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionaryError::Io(e) => write!(f, "dictionary IO error: {e}"),
            DictionaryError::Parse(e) => write!(f, "dictionary parse error: {e}"),
            DictionaryError::Pattern(e) => write!(f, "dictionary pattern error: {e}"),
        }
    }
}

impl std::error::Error for DictionaryError {}

impl From<std::io::Error> for DictionaryError {
    fn from(e: std::io::Error) -> Self {
        DictionaryError::Io(e)
    }
}

impl From<serde_json::Error> for DictionaryError {
    fn from(e: serde_json::Error) -> Self {
        DictionaryError::Parse(e)
    }
}

impl From<regex::Error> for DictionaryError {
    fn from(e: regex::Error) -> Self {
        DictionaryError::Pattern(e)
    }
}

impl LanguageTable {
    fn build(entries: &[(&str, &str)]) -> Result<Self, DictionaryError> {
        let mut exact = HashMap::with_capacity(entries.len());
        let mut lower = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            exact.insert((*key).to_string(), (*value).to_string());
            lower
                .entry(key.to_lowercase())
                .or_insert_with(|| (*value).to_string());
        }

        // Longest key first so the alternation prefers the most specific
        // phrase at any given position.
        let mut keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        keys.dedup();

        let pattern = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?)
        };

        Ok(Self { exact, lower, pattern })
    }

    fn lookup(&self, text: &str) -> Option<String> {
        if let Some(hit) = self.exact.get(text) {
            return Some(hit.clone());
        }
        if let Some(hit) = self.lower.get(&text.trim().to_lowercase()) {
            return Some(hit.clone());
        }

        // One combined substitution pass; every matching key is replaced at
        // its match site, not the whole string.
        let pattern = self.pattern.as_ref()?;
        if !pattern.is_match(text) {
            return None;
        }
        let replaced = pattern.replace_all(text, |caps: &regex::Captures<'_>| {
            self.lower
                .get(&caps[0].to_lowercase())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });
        if replaced == text {
            None
        } else {
            Some(replaced.into_owned())
        }
    }
}

impl StaticDictionary {
    /// The built-in curated tables (Estonian, Spanish, Russian).
    pub fn builtin() -> Self {
        let mut tables = HashMap::new();
        for (lang, entries) in builtin::ALL {
            let table = LanguageTable::build(entries)
                .expect("built-in dictionary entries must compile");
            tables.insert((*lang).to_string(), table);
        }
        Self { tables }
    }

    /// An empty dictionary (every lookup misses).
    pub fn empty() -> Self {
        Self { tables: HashMap::new() }
    }

    /// Build from explicit per-language entries.
    pub fn from_entries(
        entries: &[(&str, &[(&str, &str)])],
    ) -> Result<Self, DictionaryError> {
        let mut tables = HashMap::new();
        for (lang, pairs) in entries {
            tables.insert((*lang).to_string(), LanguageTable::build(pairs)?);
        }
        Ok(Self { tables })
    }

    /// Load from a JSON file of the shape `{ "et": { "phrase": "tõlge" } }`.
    pub fn load_from_file(path: &Path) -> Result<Self, DictionaryError> {
        let content = std::fs::read_to_string(path)?;
        let raw: HashMap<String, HashMap<String, String>> = serde_json::from_str(&content)?;
        let mut tables = HashMap::new();
        for (lang, map) in raw {
            let pairs: Vec<(&str, &str)> =
                map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            tables.insert(lang, LanguageTable::build(&pairs)?);
        }
        Ok(Self { tables })
    }

    /// Resolve `text` against the table for `language`. `None` is a miss,
    /// which simply means "try the next tier".
    pub fn lookup(&self, text: &str, language: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        self.tables.get(language)?.lookup(text)
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }
}

/// Approved translations carried over from the curated source tables.
mod builtin {
    pub const ALL: &[(&str, &[(&str, &str)])] = &[("et", ET), ("es", ES), ("ru", RU)];

    pub const ET: &[(&str, &str)] = &[
        // Core sales terms
        ("strengths", "Tugevused"),
        ("improvements", "Parandamise alad"),
        ("opening", "Avamine"),
        ("discovery", "Avastamine"),
        ("presentation", "Esitlus"),
        ("objection handling", "Vastuväidete käsitlemine"),
        ("closing", "Sulgemine"),
        ("personality insights", "Isiksuse ülevaated"),
        ("communication style", "Suhtlemisstiil"),
        ("recommended focus", "Soovitatav fookus"),
        ("next steps", "Järgmised sammud"),
        // Feedback phrases
        ("clear introductions", "Selged tutvustused"),
        ("good product offering", "Hea toote pakkumine"),
        ("willingness to engage", "Valmidus suhtlema"),
        ("professional approach", "Professionaalne lähenemine"),
        ("good listening skills", "Head kuulamise oskused"),
        ("clear communication", "Selge suhtlus"),
        ("effective questioning", "Tõhus küsimuste esitamine"),
        ("strong closing", "Tugev sulgemine"),
        ("handles objections well", "Käsitleb vastuväiteid hästi"),
        ("builds rapport", "Loob kontakti"),
        // Improvement areas
        ("needs better discovery", "Vajab paremat avastamist"),
        ("improve presentation skills", "Paranda esitluse oskusi"),
        ("work on closing techniques", "Tööta sulgemise tehnikate kallal"),
        ("enhance objection handling", "Paranda vastuväidete käsitlemist"),
        ("develop better questions", "Arenda paremaid küsimusi"),
        ("improve active listening", "Paranda aktiivset kuulamist"),
        ("build stronger relationships", "Ehita tugevamaid suhteid"),
        ("focus on customer needs", "Keskendu kliendi vajadustele"),
        ("improve follow-up", "Paranda järelkontrolli"),
        ("enhance product knowledge", "Paranda toote tundmist"),
        // Stage rating feedback
        ("excellent opening", "Suurepärane avamine"),
        ("good opening", "Hea avamine"),
        ("needs improvement in opening", "Vajab parandamist avamises"),
        ("good discovery", "Hea avastamine"),
        ("weak discovery", "Nõrk avastamine"),
        ("compelling presentation", "Veenev esitlus"),
        ("good presentation", "Hea esitlus"),
        ("good objection handling", "Hea vastuväidete käsitlemine"),
        ("good closing", "Hea sulgemine"),
        ("weak closing", "Nõrk sulgemine"),
        // Specific feedback
        ("good opening approach", "Hea avamise lähenemine"),
        ("consider personalizing your introductions more", "Kaaluge oma tutvustuste isikupärastamist"),
        ("ask more probing questions", "Küsi rohkem uurivaid küsimusi"),
        ("clear presentation style", "Selge esitluse stiil"),
        ("address objections directly", "Käsitle vastuväiteid otse"),
        ("practice common objection responses", "Harjuta tavaliste vastuväidetele vastamist"),
        ("be more direct with closing attempts", "Ole sulgemiskatsetega otsesem"),
        ("practice assumptive closing techniques", "Harjuta eelduslikke sulgemise tehnikaid"),
        ("closing techniques", "Sulgemise tehnikad"),
        ("presentation skills", "Esitluse oskused"),
        ("product knowledge", "Toote tundmine"),
        ("discovery phase", "Avastamise faas"),
    ];

    pub const ES: &[(&str, &str)] = &[
        ("strengths", "Fortalezas"),
        ("improvements", "Áreas de mejora"),
        ("opening", "Apertura"),
        ("discovery", "Descubrimiento"),
        ("presentation", "Presentación"),
        ("objection handling", "Manejo de objeciones"),
        ("closing", "Cierre"),
        ("personality insights", "Perspectivas de personalidad"),
        ("communication style", "Estilo de comunicación"),
        ("recommended focus", "Enfoque recomendado"),
        ("next steps", "Próximos pasos"),
        ("clear introductions", "Presentaciones claras"),
        ("good product offering", "Buena oferta de producto"),
        ("willingness to engage", "Disposición para interactuar"),
        ("professional approach", "Enfoque profesional"),
        ("good listening skills", "Buenas habilidades de escucha"),
        ("clear communication", "Comunicación clara"),
        ("effective questioning", "Cuestionamiento efectivo"),
        ("strong closing", "Cierre fuerte"),
        ("handles objections well", "Maneja bien las objeciones"),
        ("builds rapport", "Construye rapport"),
        ("needs better discovery", "Necesita mejor descubrimiento"),
        ("improve presentation skills", "Mejorar habilidades de presentación"),
        ("work on closing techniques", "Trabajar en técnicas de cierre"),
        ("enhance objection handling", "Mejorar manejo de objeciones"),
        ("develop better questions", "Desarrollar mejores preguntas"),
        ("improve active listening", "Mejorar escucha activa"),
        ("build stronger relationships", "Construir relaciones más fuertes"),
        ("focus on customer needs", "Enfocarse en necesidades del cliente"),
        ("improve follow-up", "Mejorar seguimiento"),
        ("enhance product knowledge", "Mejorar conocimiento del producto"),
        ("excellent opening", "Excelente apertura"),
        ("good opening", "Buena apertura"),
        ("needs improvement in opening", "Necesita mejora en apertura"),
        ("good discovery", "Buen descubrimiento"),
        ("weak discovery", "Descubrimiento débil"),
        ("compelling presentation", "Presentación convincente"),
        ("good presentation", "Buena presentación"),
        ("good objection handling", "Buen manejo de objeciones"),
        ("good closing", "Buen cierre"),
        ("weak closing", "Cierre débil"),
        ("good opening approach", "Buen enfoque de apertura"),
        ("consider personalizing your introductions more", "Considera personalizar más tus presentaciones"),
        ("ask more probing questions", "Haz más preguntas exploratorias"),
        ("clear presentation style", "Estilo de presentación claro"),
        ("address objections directly", "Aborda las objeciones directamente"),
        ("practice common objection responses", "Practica respuestas comunes a objeciones"),
        ("be more direct with closing attempts", "Sé más directo con los intentos de cierre"),
        ("practice assumptive closing techniques", "Practica técnicas de cierre asumptivo"),
        ("closing techniques", "Técnicas de cierre"),
        ("presentation skills", "Habilidades de presentación"),
        ("product knowledge", "Conocimiento del producto"),
        ("discovery phase", "Fase de descubrimiento"),
    ];

    pub const RU: &[(&str, &str)] = &[
        ("strengths", "Сильные стороны"),
        ("improvements", "Области для улучшения"),
        ("opening", "Открытие"),
        ("discovery", "Исследование"),
        ("presentation", "Презентация"),
        ("objection handling", "Работа с возражениями"),
        ("closing", "Закрытие"),
        ("personality insights", "Анализ личности"),
        ("communication style", "Стиль общения"),
        ("recommended focus", "Рекомендуемый фокус"),
        ("next steps", "Следующие шаги"),
        ("clear introductions", "Четкие представления"),
        ("good product offering", "Хорошее предложение продукта"),
        ("willingness to engage", "Готовность к взаимодействию"),
        ("professional approach", "Профессиональный подход"),
        ("good listening skills", "Хорошие навыки слушания"),
        ("clear communication", "Четкое общение"),
        ("effective questioning", "Эффективное задавание вопросов"),
        ("strong closing", "Сильное закрытие"),
        ("handles objections well", "Хорошо работает с возражениями"),
        ("builds rapport", "Строит раппорт"),
        ("needs better discovery", "Нужно лучшее исследование"),
        ("improve presentation skills", "Улучшить навыки презентации"),
        ("work on closing techniques", "Работать над техниками закрытия"),
        ("enhance objection handling", "Улучшить работу с возражениями"),
        ("develop better questions", "Разработать лучшие вопросы"),
        ("improve active listening", "Улучшить активное слушание"),
        ("build stronger relationships", "Строить более крепкие отношения"),
        ("focus on customer needs", "Фокусироваться на потребностях клиента"),
        ("improve follow-up", "Улучшить последующую работу"),
        ("enhance product knowledge", "Улучшить знание продукта"),
        ("excellent opening", "Отличное открытие"),
        ("good opening", "Хорошее открытие"),
        ("needs improvement in opening", "Нужно улучшение в открытии"),
        ("good discovery", "Хорошее исследование"),
        ("weak discovery", "Слабое исследование"),
        ("compelling presentation", "Убедительная презентация"),
        ("good presentation", "Хорошая презентация"),
        ("good objection handling", "Хорошая работа с возражениями"),
        ("good closing", "Хорошее закрытие"),
        ("weak closing", "Слабое закрытие"),
        ("good opening approach", "Хороший подход к открытию"),
        ("consider personalizing your introductions more", "Рассмотрите возможность более персонализированных представлений"),
        ("ask more probing questions", "Задавайте больше зондирующих вопросов"),
        ("clear presentation style", "Четкий стиль презентации"),
        ("address objections directly", "Обращайтесь к возражениям напрямую"),
        ("practice common objection responses", "Практикуйте общие ответы на возражения"),
        ("be more direct with closing attempts", "Будьте более прямыми в попытках закрытия"),
        ("practice assumptive closing techniques", "Практикуйте предположительные техники закрытия"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_case_sensitive() {
        let dict = StaticDictionary::builtin();
        assert_eq!(
            dict.lookup("good opening approach", "et").as_deref(),
            Some("Hea avamise lähenemine")
        );
    }

    #[test]
    fn exact_match_case_insensitive() {
        let dict = StaticDictionary::builtin();
        assert_eq!(
            dict.lookup("Good Opening Approach", "et").as_deref(),
            Some("Hea avamise lähenemine")
        );
        assert_eq!(
            dict.lookup("  STRENGTHS  ", "es").as_deref(),
            Some("Fortalezas")
        );
    }

    #[test]
    fn longer_key_wins_over_shorter_prefix() {
        let dict = StaticDictionary::from_entries(&[(
            "et",
            &[
                ("closing", "Sulgemine"),
                ("closing techniques", "Sulgemise tehnikad"),
            ][..],
        )])
        .unwrap();

        // "closing techniques" must be substituted as a unit, not pre-empted
        // by the shorter "closing".
        assert_eq!(
            dict.lookup("work on closing techniques", "et").as_deref(),
            Some("work on Sulgemise tehnikad")
        );
    }

    #[test]
    fn multiple_independent_matches_apply_in_one_pass() {
        let dict = StaticDictionary::from_entries(&[(
            "es",
            &[("opening", "Apertura"), ("closing", "Cierre")][..],
        )])
        .unwrap();
        assert_eq!(
            dict.lookup("from opening to closing", "es").as_deref(),
            Some("from Apertura to Cierre")
        );
    }

    #[test]
    fn substitution_happens_at_match_site_only() {
        let dict = StaticDictionary::builtin();
        let result = dict.lookup("work on your strengths today", "ru").unwrap();
        assert_eq!(result, "work on your Сильные стороны today");
    }

    #[test]
    fn word_boundary_prevents_substring_hits() {
        let dict =
            StaticDictionary::from_entries(&[("et", &[("opening", "Avamine")][..])]).unwrap();
        // "reopening" contains "opening" but not on a word boundary.
        assert_eq!(dict.lookup("reopening the store", "et"), None);
    }

    #[test]
    fn miss_is_none_not_error() {
        let dict = StaticDictionary::builtin();
        assert_eq!(dict.lookup("completely unrelated text", "et"), None);
        assert_eq!(dict.lookup("strengths", "fi"), None);
        assert_eq!(dict.lookup("   ", "et"), None);
    }

    #[test]
    fn load_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.json");
        std::fs::write(
            &path,
            r#"{"et": {"hello": "tere", "good morning": "tere hommikust"}}"#,
        )
        .unwrap();

        let dict = StaticDictionary::load_from_file(&path).unwrap();
        assert_eq!(dict.lookup("hello", "et").as_deref(), Some("tere"));
        assert_eq!(
            dict.lookup("Good Morning", "et").as_deref(),
            Some("tere hommikust")
        );
    }
}
