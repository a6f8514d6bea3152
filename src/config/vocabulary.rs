// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{collections::HashSet, path::Path};

use config::{Config, File};
use serde::Deserialize;

use super::ConfigError;
use crate::{clip::ClipId, vocabulary::VocabularyItem};

/// A YAML representation of a vocabulary file.
#[derive(Deserialize, Clone, Debug)]
pub struct Vocabulary {
    /// The categories, in display order.
    categories: Vec<Category>,
}

/// A named group of vocabulary items.
#[derive(Deserialize, Clone, Debug)]
pub struct Category {
    name: String,
    items: Vec<Item>,
}

/// A single word.
#[derive(Deserialize, Clone, Debug)]
pub struct Item {
    /// The word in the target language.
    urdu: String,
    /// The English meaning.
    english: String,
    /// The pronunciation clip.
    clip: String,
}

impl Vocabulary {
    /// Parse a vocabulary from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Vocabulary, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Vocabulary>()?)
    }

    /// Converts the configuration into a vocabulary, checking that category names are unique
    /// and that every item names a clip.
    pub fn to_vocabulary(&self) -> Result<crate::vocabulary::Vocabulary, ConfigError> {
        let mut names = HashSet::new();
        let mut categories = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate vocabulary category {}",
                    category.name
                )));
            }

            let items = category
                .items
                .iter()
                .map(|item| {
                    if item.clip.trim().is_empty() {
                        return Err(ConfigError::Invalid(format!(
                            "vocabulary item {} in {} has no clip",
                            item.english, category.name
                        )));
                    }
                    Ok(VocabularyItem::new(
                        &item.urdu,
                        &item.english,
                        ClipId::new(item.clip.clone()),
                    ))
                })
                .collect::<Result<Vec<VocabularyItem>, ConfigError>>()?;
            categories.push((category.name.clone(), items));
        }

        Ok(crate::vocabulary::Vocabulary::new(categories))
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use config::{Config, File, FileFormat};

    use super::Vocabulary;

    fn parse(yaml: &str) -> Result<Vocabulary, Box<dyn Error>> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Vocabulary>()?)
    }

    #[test]
    fn test_to_vocabulary() -> Result<(), Box<dyn Error>> {
        let vocabulary = parse(
            r#"
            categories:
              - name: basics
                items:
                  - urdu: "پانی"
                    english: Water
                    clip: pani.mp3
                  - urdu: "کتاب"
                    english: Book
                    clip: kitab.mp3
              - name: people
                items:
                  - urdu: "دوست"
                    english: Friend
                    clip: dost.mp3
            "#,
        )?
        .to_vocabulary()?;

        assert_eq!(vec!["basics", "people"], vocabulary.categories());
        let basics = vocabulary.category("basics").expect("basics should exist");
        assert_eq!(2, basics.len());
        assert_eq!("Water", basics[0].english());
        assert_eq!("پانی", basics[0].urdu());
        assert_eq!("pani.mp3", basics[0].clip().as_str());
        assert_eq!(3, vocabulary.len());
        Ok(())
    }

    #[test]
    fn test_duplicate_category() -> Result<(), Box<dyn Error>> {
        let vocabulary = parse(
            r#"
            categories:
              - name: basics
                items:
                  - urdu: "پانی"
                    english: Water
                    clip: pani.mp3
              - name: basics
                items:
                  - urdu: "کتاب"
                    english: Book
                    clip: kitab.mp3
            "#,
        )?;
        assert!(vocabulary.to_vocabulary().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_clip() -> Result<(), Box<dyn Error>> {
        let vocabulary = parse(
            r#"
            categories:
              - name: basics
                items:
                  - urdu: "پانی"
                    english: Water
                    clip: ""
            "#,
        )?;
        assert!(vocabulary.to_vocabulary().is_err());
        Ok(())
    }
}
