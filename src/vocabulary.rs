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
use std::collections::BTreeSet;

use crate::clip::ClipId;

/// A word to learn along with its pronunciation clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocabularyItem {
    urdu: String,
    english: String,
    clip: ClipId,
}

impl VocabularyItem {
    pub fn new(urdu: &str, english: &str, clip: ClipId) -> VocabularyItem {
        VocabularyItem {
            urdu: urdu.to_string(),
            english: english.to_string(),
            clip,
        }
    }

    /// The word in the target language.
    pub fn urdu(&self) -> &str {
        &self.urdu
    }

    /// The English meaning.
    pub fn english(&self) -> &str {
        &self.english
    }

    pub fn clip(&self) -> &ClipId {
        &self.clip
    }
}

/// Vocabulary items grouped into ordered categories.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    categories: Vec<(String, Vec<VocabularyItem>)>,
}

impl Vocabulary {
    pub fn new(categories: Vec<(String, Vec<VocabularyItem>)>) -> Vocabulary {
        Vocabulary { categories }
    }

    /// The category names, in order.
    pub fn categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The items of the named category.
    pub fn category(&self, name: &str) -> Option<&[VocabularyItem]> {
        self.categories
            .iter()
            .find(|(category, _)| category == name)
            .map(|(_, items)| items.as_slice())
    }

    /// Every item in every category, in order.
    pub fn items(&self) -> impl Iterator<Item = &VocabularyItem> {
        self.categories.iter().flat_map(|(_, items)| items.iter())
    }

    /// The total number of items.
    pub fn len(&self) -> usize {
        self.items().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every clip the vocabulary refers to, sorted and without duplicates.
    pub fn clips(&self) -> Vec<ClipId> {
        self.items()
            .map(|item| item.clip().clone())
            .collect::<BTreeSet<ClipId>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{Vocabulary, VocabularyItem};
    use crate::clip::ClipId;

    #[test]
    fn test_clips_are_deduplicated() {
        let vocabulary = Vocabulary::new(vec![
            (
                "basics".to_string(),
                vec![
                    VocabularyItem::new("پانی", "Water", ClipId::from("pani.mp3")),
                    VocabularyItem::new("کتاب", "Book", ClipId::from("kitab.mp3")),
                ],
            ),
            (
                "review".to_string(),
                vec![VocabularyItem::new("پانی", "Water", ClipId::from("pani.mp3"))],
            ),
        ]);

        assert_eq!(3, vocabulary.len());
        assert_eq!(
            vec![ClipId::from("kitab.mp3"), ClipId::from("pani.mp3")],
            vocabulary.clips()
        );
        assert!(vocabulary.category("missing").is_none());
    }
}
