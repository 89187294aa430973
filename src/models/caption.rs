// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption data structures.
//!
//! Captions are kept in insertion order. The collection never sorts them, so
//! the subtitle output follows the order the user added them in.

use crate::error::{EditError, ValidationError};
use serde::{Deserialize, Serialize};

/// A timed text overlay. `start < end` and non-empty text are guaranteed for
/// every caption stored in a [`CaptionCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Caption {
    /// Whether `time` falls inside `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }
}

/// The caption currently being composed. Its bounds may be out of order while
/// the user is still marking them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftCaption {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl DraftCaption {
    /// Check the draft against the caption invariants and build the caption.
    /// Whitespace-only text is empty; otherwise the text is kept as typed.
    pub fn validate(&self) -> Result<Caption, ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if self.start >= self.end {
            return Err(ValidationError::StartNotBeforeEnd {
                start: self.start,
                end: self.end,
            });
        }
        Ok(Caption {
            text: self.text.clone(),
            start: self.start,
            end: self.end,
        })
    }

    /// Whether committing this draft would succeed.
    pub fn is_committable(&self) -> bool {
        self.validate().is_ok()
    }
}

impl From<&Caption> for DraftCaption {
    fn from(caption: &Caption) -> Self {
        Self {
            text: caption.text.clone(),
            start: caption.start,
            end: caption.end,
        }
    }
}

/// Insertion-ordered list of validated captions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionCollection {
    captions: Vec<Caption>,
}

impl CaptionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft and append it.
    pub fn add(&mut self, draft: &DraftCaption) -> Result<(), ValidationError> {
        let caption = draft.validate()?;
        self.captions.push(caption);
        Ok(())
    }

    /// Validate the draft and replace the caption at `index`, keeping its position.
    pub fn update(&mut self, index: usize, draft: &DraftCaption) -> Result<(), EditError> {
        let len = self.captions.len();
        let slot = self
            .captions
            .get_mut(index)
            .ok_or(EditError::Index { index, len })?;
        *slot = draft.validate()?;
        Ok(())
    }

    /// Remove and return the caption at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Caption, EditError> {
        if index >= self.captions.len() {
            return Err(EditError::Index {
                index,
                len: self.captions.len(),
            });
        }
        Ok(self.captions.remove(index))
    }

    /// First caption showing at `time`. Only used for preview highlighting.
    pub fn find_active(&self, time: f64) -> Option<(usize, &Caption)> {
        self.captions
            .iter()
            .enumerate()
            .find(|(_, caption)| caption.contains(time))
    }

    pub fn get(&self, index: usize) -> Option<&Caption> {
        self.captions.get(index)
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caption> {
        self.captions.iter()
    }

    pub fn as_slice(&self) -> &[Caption] {
        &self.captions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, start: f64, end: f64) -> DraftCaption {
        DraftCaption {
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_add_appends_and_preserves_order() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("first", 5.0, 6.0)).unwrap();
        captions.add(&draft("second", 1.0, 2.0)).unwrap();
        let before = captions.clone();

        captions.add(&draft("third", 3.0, 4.0)).unwrap();

        assert_eq!(captions.len(), before.len() + 1);
        assert_eq!(&captions.as_slice()[..2], before.as_slice());
        assert_eq!(captions.get(2).unwrap().text, "third");
    }

    #[test]
    fn test_add_rejects_invalid_drafts() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("keep", 0.0, 1.0)).unwrap();
        let before = captions.clone();

        assert_eq!(
            captions.add(&draft("   ", 1.0, 2.0)),
            Err(ValidationError::EmptyText)
        );
        assert!(matches!(
            captions.add(&draft("zero length", 2.0, 2.0)),
            Err(ValidationError::StartNotBeforeEnd { .. })
        ));
        assert!(matches!(
            captions.add(&draft("backwards", 3.0, 1.0)),
            Err(ValidationError::StartNotBeforeEnd { .. })
        ));
        assert_eq!(captions, before);
    }

    #[test]
    fn test_add_keeps_text_as_typed() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("  hello \n", 0.0, 1.0)).unwrap();
        assert_eq!(captions.get(0).unwrap().text, "  hello \n");
        assert_eq!(captions.add(&draft(" \t\n", 1.0, 2.0)), Err(ValidationError::EmptyText));
    }

    #[test]
    fn test_update_in_place() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("a", 0.0, 1.0)).unwrap();
        captions.add(&draft("b", 1.0, 2.0)).unwrap();
        captions.add(&draft("c", 2.0, 3.0)).unwrap();

        captions.update(1, &draft("B", 10.0, 12.0)).unwrap();

        let texts: Vec<_> = captions.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["a", "B", "c"]);
        assert_eq!(captions.get(1).unwrap().start, 10.0);
    }

    #[test]
    fn test_update_errors() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("a", 0.0, 1.0)).unwrap();

        assert!(matches!(
            captions.update(3, &draft("x", 0.0, 1.0)),
            Err(EditError::Index { index: 3, len: 1 })
        ));
        assert!(matches!(
            captions.update(0, &draft("", 0.0, 1.0)),
            Err(EditError::Validation(ValidationError::EmptyText))
        ));
        assert_eq!(captions.get(0).unwrap().text, "a");
    }

    #[test]
    fn test_remove() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("a", 0.0, 1.0)).unwrap();
        captions.add(&draft("b", 1.0, 2.0)).unwrap();

        let removed = captions.remove(0).unwrap();
        assert_eq!(removed.text, "a");
        assert_eq!(captions.len(), 1);
        assert!(matches!(
            captions.remove(1),
            Err(EditError::Index { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_find_active_is_half_open_and_first_wins() {
        let mut captions = CaptionCollection::new();
        captions.add(&draft("late", 4.0, 8.0)).unwrap();
        captions.add(&draft("overlap", 2.0, 6.0)).unwrap();

        assert_eq!(captions.find_active(1.0), None);
        assert_eq!(captions.find_active(2.0).unwrap().0, 1);
        assert_eq!(captions.find_active(5.0).unwrap().1.text, "late");
        assert_eq!(captions.find_active(6.0).unwrap().0, 0);
        assert_eq!(captions.find_active(8.0), None);
    }

    #[test]
    fn test_draft_from_caption() {
        let caption = Caption {
            text: "hi".into(),
            start: 1.0,
            end: 2.0,
        };
        let draft = DraftCaption::from(&caption);
        assert_eq!(draft.validate().unwrap(), caption);
    }
}
