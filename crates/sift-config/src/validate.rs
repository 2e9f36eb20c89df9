//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::{collections::HashSet, fmt};

use crate::{AnalyzerSettings, Config, IndexDescriptor, RESERVED_FIELDS, is_supported_language};

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No indexes are defined.
    NoIndexesDefined,
    /// Two indexes share a name.
    DuplicateIndexName {
        /// The repeated name.
        name: String,
    },
    /// A field is defined twice in one index.
    DuplicateField {
        /// Name of the index.
        index: String,
        /// The repeated field name.
        field: String,
    },
    /// A field redefines one of the reserved fields.
    ReservedField {
        /// Name of the index.
        index: String,
        /// The reserved field name.
        field: String,
    },
    /// An analyzer names a language without stemming or stop-word support.
    UnknownLanguage {
        /// Name of the index.
        index: String,
        /// The unsupported language.
        language: String,
    },
    /// Stemming is enabled but no language is set.
    StemmingWithoutLanguage {
        /// Name of the index.
        index: String,
    },
    /// The index path exists but is not a directory.
    IndexPathNotDirectory {
        /// Name of the index.
        index: String,
        /// The offending path.
        path: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIndexesDefined => write!(f, "no indexes are defined in configuration"),
            Self::DuplicateIndexName { name } => {
                write!(f, "index '{name}' is defined more than once")
            }
            Self::DuplicateField { index, field } => {
                write!(f, "index '{index}' defines field '{field}' more than once")
            }
            Self::ReservedField { index, field } => {
                write!(
                    f,
                    "index '{index}' redefines reserved field '{field}' (definition ignored)"
                )
            }
            Self::UnknownLanguage { index, language } => {
                write!(f, "index '{index}' uses unsupported language '{language}'")
            }
            Self::StemmingWithoutLanguage { index } => {
                write!(f, "index '{index}' enables stemming without a language")
            }
            Self::IndexPathNotDirectory { index, path } => {
                write!(f, "index '{index}' path is not a directory: {path}")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.indexes.is_empty() {
        warnings.push(ConfigWarning::NoIndexesDefined);
        return warnings;
    }

    let mut names = HashSet::new();
    for index in &config.indexes {
        if !names.insert(index.name.as_str()) {
            warnings.push(ConfigWarning::DuplicateIndexName {
                name: index.name.clone(),
            });
        }
        warnings.extend(validate_index(index));
    }

    warnings
}

/// Validates one index definition.
fn validate_index(index: &IndexDescriptor) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if index.path.exists() && !index.path.is_dir() {
        warnings.push(ConfigWarning::IndexPathNotDirectory {
            index: index.name.clone(),
            path: index.path.display().to_string(),
        });
    }

    let mut fields = HashSet::new();
    for field in &index.fields {
        if RESERVED_FIELDS.contains(&field.name.as_str()) {
            warnings.push(ConfigWarning::ReservedField {
                index: index.name.clone(),
                field: field.name.clone(),
            });
        } else if !fields.insert(field.name.as_str()) {
            warnings.push(ConfigWarning::DuplicateField {
                index: index.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    let analyzers = [Some(&index.analyzer), index.search_analyzer.as_ref()];
    for analyzer in analyzers.into_iter().flatten() {
        warnings.extend(validate_analyzer(&index.name, analyzer));
    }

    warnings
}

/// Validates language settings of one analyzer.
fn validate_analyzer(index: &str, analyzer: &AnalyzerSettings) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    for language in [&analyzer.language, &analyzer.stop_words]
        .into_iter()
        .flatten()
    {
        if !is_supported_language(language) {
            warnings.push(ConfigWarning::UnknownLanguage {
                index: index.to_string(),
                language: language.clone(),
            });
        }
    }
    if analyzer.stemming && analyzer.language.is_none() {
        warnings.push(ConfigWarning::StemmingWithoutLanguage {
            index: index.to_string(),
        });
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldSpec;

    fn config_with(indexes: Vec<IndexDescriptor>) -> Config {
        Config {
            indexes,
            ..Config::default()
        }
    }

    #[test]
    fn empty_config_warns() {
        let warnings = validate_config(&Config::default());
        assert_eq!(warnings, vec![ConfigWarning::NoIndexesDefined]);
    }

    #[test]
    fn clean_config_has_no_warnings() {
        let config = config_with(vec![
            IndexDescriptor::new("news", "/nonexistent/news").with_field(FieldSpec::text("title")),
        ]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn duplicate_index_names() {
        let config = config_with(vec![
            IndexDescriptor::new("news", "/a"),
            IndexDescriptor::new("news", "/b"),
        ]);
        assert!(validate_config(&config).contains(&ConfigWarning::DuplicateIndexName {
            name: "news".into()
        }));
    }

    #[test]
    fn reserved_and_duplicate_fields() {
        let config = config_with(vec![
            IndexDescriptor::new("news", "/a")
                .with_field(FieldSpec::text("content"))
                .with_field(FieldSpec::text("title"))
                .with_field(FieldSpec::keyword("title")),
        ]);
        let warnings = validate_config(&config);
        assert!(warnings.contains(&ConfigWarning::ReservedField {
            index: "news".into(),
            field: "content".into()
        }));
        assert!(warnings.contains(&ConfigWarning::DuplicateField {
            index: "news".into(),
            field: "title".into()
        }));
    }

    #[test]
    fn unknown_language_and_bare_stemming() {
        let mut analyzer = AnalyzerSettings::default();
        analyzer.language = Some("klingon".into());
        let mut search = AnalyzerSettings::default();
        search.stemming = true;
        let config = config_with(vec![
            IndexDescriptor::new("news", "/a")
                .with_analyzer(analyzer)
                .with_search_analyzer(search),
        ]);
        let warnings = validate_config(&config);
        assert!(warnings.contains(&ConfigWarning::UnknownLanguage {
            index: "news".into(),
            language: "klingon".into()
        }));
        assert!(warnings.contains(&ConfigWarning::StemmingWithoutLanguage {
            index: "news".into()
        }));
    }

    #[test]
    fn warning_display() {
        let warning = ConfigWarning::ReservedField {
            index: "news".into(),
            field: "id".into(),
        };
        assert!(warning.to_string().contains("reserved field 'id'"));
    }
}
