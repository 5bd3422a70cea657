//! Catalog Loader: resolves a language code to its data file and normalizes
//! the localized field names into `Goal`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use super::{CatalogError, Goal, GoalCatalog};

/// Supported catalog languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "no")]
    Norwegian,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Norwegian];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Norwegian => "no",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Language::English => "curriculum.json",
            Language::Norwegian => "pensum.json",
        }
    }
}

impl FromStr for Language {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::English),
            "no" => Ok(Language::Norwegian),
            _ => Err(CatalogError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// curriculum.json
#[derive(Debug, Deserialize)]
struct EnglishGoalRecord {
    #[serde(rename = "competenceGoal")]
    id: i64,
    #[serde(rename = "competenceGoalTitle")]
    title: String,
    #[serde(rename = "subGoals", default)]
    sub_goals: Vec<String>,
}

// pensum.json
#[derive(Debug, Deserialize)]
struct NorwegianGoalRecord {
    #[serde(rename = "kompetansemål")]
    id: i64,
    #[serde(rename = "tittel")]
    title: String,
    #[serde(rename = "delmål", default)]
    sub_goals: Vec<String>,
}

impl From<EnglishGoalRecord> for Goal {
    fn from(r: EnglishGoalRecord) -> Self {
        Goal {
            id: r.id,
            title: r.title,
            sub_goals: r.sub_goals,
        }
    }
}

impl From<NorwegianGoalRecord> for Goal {
    fn from(r: NorwegianGoalRecord) -> Self {
        Goal {
            id: r.id,
            title: r.title,
            sub_goals: r.sub_goals,
        }
    }
}

/// Parses the raw contents of a catalog file written in `language`'s field names.
pub fn parse_catalog(
    contents: &str,
    language: Language,
    source: &str,
) -> Result<GoalCatalog, CatalogError> {
    let goals = match language {
        Language::English => parse_records::<EnglishGoalRecord>(contents, source)?,
        Language::Norwegian => parse_records::<NorwegianGoalRecord>(contents, source)?,
    };
    GoalCatalog::new(goals)
}

fn parse_records<R>(contents: &str, source: &str) -> Result<Vec<Goal>, CatalogError>
where
    R: DeserializeOwned + Into<Goal>,
{
    let records: Vec<R> =
        serde_json::from_str(contents).map_err(|source_err| CatalogError::Parse {
            path: source.to_string(),
            source: source_err,
        })?;
    Ok(records.into_iter().map(Into::into).collect())
}

/// Loads the catalog for `language` from `dir`.
pub fn load_catalog(dir: &Path, language: Language) -> Result<GoalCatalog, CatalogError> {
    let path = dir.join(language.file_name());
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
        path: display.clone(),
        source,
    })?;
    parse_catalog(&contents, language, &display)
}

/// Every supported catalog, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    catalogs: HashMap<Language, Arc<GoalCatalog>>,
}

impl CatalogStore {
    pub fn load_all(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalogs = HashMap::new();
        for language in Language::ALL {
            let catalog = load_catalog(dir, language)?;
            info!(
                "Loaded {} competence goals for language '{}'",
                catalog.len(),
                language
            );
            catalogs.insert(language, Arc::new(catalog));
        }
        Ok(Self { catalogs })
    }

    pub fn from_catalogs(catalogs: impl IntoIterator<Item = (Language, GoalCatalog)>) -> Self {
        Self {
            catalogs: catalogs
                .into_iter()
                .map(|(lang, catalog)| (lang, Arc::new(catalog)))
                .collect(),
        }
    }

    pub fn get(&self, language: Language) -> Option<Arc<GoalCatalog>> {
        self.catalogs.get(&language).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundled_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    #[test]
    fn test_language_from_str_is_case_insensitive() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" no ".parse::<Language>().unwrap(), Language::Norwegian);
    }

    #[test]
    fn test_unsupported_language_is_rejected() {
        let err = "de".parse::<Language>().unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedLanguage(ref code) if code == "de"));
    }

    #[test]
    fn test_english_field_names_are_normalized() {
        let json = r#"[
            {"competenceGoal": 4, "competenceGoalTitle": "Cloud Deployment",
             "subGoals": ["Deploy to GCP", "Use CI/CD"]}
        ]"#;
        let catalog = parse_catalog(json, Language::English, "inline").unwrap();
        assert_eq!(catalog.goals()[0].id, 4);
        assert_eq!(catalog.goals()[0].title, "Cloud Deployment");
        assert_eq!(catalog.goals()[0].sub_goals.len(), 2);
    }

    #[test]
    fn test_norwegian_field_names_are_normalized() {
        let json = r#"[
            {"kompetansemål": 2, "tittel": "Testing", "delmål": ["Skrive enhetstester"]}
        ]"#;
        let catalog = parse_catalog(json, Language::Norwegian, "inline").unwrap();
        assert_eq!(catalog.goals()[0].id, 2);
        assert_eq!(catalog.goals()[0].sub_goals, vec!["Skrive enhetstester"]);
    }

    #[test]
    fn test_missing_sub_goals_default_to_empty() {
        let json = r#"[{"competenceGoal": 1, "competenceGoalTitle": "Solo"}]"#;
        let catalog = parse_catalog(json, Language::English, "inline").unwrap();
        assert!(catalog.goals()[0].sub_goals.is_empty());
    }

    #[test]
    fn test_wrong_language_shape_is_parse_error() {
        let json = r#"[{"kompetansemål": 2, "tittel": "Testing", "delmål": []}]"#;
        let err = parse_catalog(json, Language::English, "inline").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_duplicate_ids_in_file_are_rejected() {
        let json = r#"[
            {"competenceGoal": 1, "competenceGoalTitle": "A", "subGoals": []},
            {"competenceGoal": 1, "competenceGoalTitle": "B", "subGoals": []}
        ]"#;
        let err = parse_catalog(json, Language::English, "inline").unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateGoalId(1)));
    }

    #[test]
    fn test_load_catalog_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_catalog(dir.path(), Language::English).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_load_catalog_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pensum.json"),
            r#"[{"kompetansemål": 9, "tittel": "Skytjenester", "delmål": ["Deploye til GCP"]}]"#,
        )
        .unwrap();
        let catalog = load_catalog(dir.path(), Language::Norwegian).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.goals()[0].title, "Skytjenester");
    }

    #[test]
    fn test_bundled_catalogs_load() {
        let store = CatalogStore::load_all(&bundled_data_dir()).unwrap();
        for language in Language::ALL {
            let catalog = store.get(language).unwrap();
            assert!(!catalog.is_empty(), "{language} catalog is empty");
        }
    }

    #[test]
    fn test_store_get_unknown_language_is_none() {
        let store = CatalogStore::from_catalogs([(Language::English, GoalCatalog::default())]);
        assert!(store.get(Language::English).is_some());
        assert!(store.get(Language::Norwegian).is_none());
    }
}
