//! Lesson persistence.
//!
//! The review core only reads lessons. Writes go through [`LessonStore`] and
//! always carry an explicit [`Capabilities`] value; there is no ambient
//! "admin mode".

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{RecallError, Result};
use crate::vocabulary::Lesson;

/// What the caller is allowed to do with the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// May create, modify, reorder and delete lessons.
    pub can_edit: bool,
}

impl Capabilities {
    /// Read-only access.
    #[must_use]
    pub const fn read_only() -> Self {
        Self { can_edit: false }
    }

    /// Full edit access.
    #[must_use]
    pub const fn editor() -> Self {
        Self { can_edit: true }
    }

    fn require_edit(self, action: &str) -> Result<()> {
        if self.can_edit {
            Ok(())
        } else {
            Err(RecallError::permission_denied(action))
        }
    }
}

/// Source of lessons.
pub trait LessonStore {
    /// Lessons sorted by `order` ascending (unordered last), then newest first.
    fn list_lessons(&self) -> Result<Vec<Lesson>>;

    /// Looks up a lesson by id. A missing lesson is `Ok(None)`.
    fn get_lesson(&self, id: &str) -> Result<Option<Lesson>>;

    /// Creates or replaces a lesson.
    fn save_lesson(&self, lesson: &Lesson, caps: &Capabilities) -> Result<()>;

    /// Deletes a lesson. Deleting a missing lesson is not an error.
    fn delete_lesson(&self, id: &str, caps: &Capabilities) -> Result<()>;

    /// Assigns `order` 0, 1, 2, ... following `ids`.
    ///
    /// Ids that do not exist are skipped.
    fn reorder(&self, ids: &[String], caps: &Capabilities) -> Result<()> {
        caps.require_edit("reordering lessons")?;
        for (position, id) in ids.iter().enumerate() {
            let Some(mut lesson) = self.get_lesson(id)? else {
                warn!(id = %id, "Skipping unknown lesson while reordering");
                continue;
            };
            lesson.order = u32::try_from(position).ok();
            self.save_lesson(&lesson, caps)?;
        }
        Ok(())
    }
}

/// Sort order used by [`LessonStore::list_lessons`].
pub fn compare_lessons(a: &Lesson, b: &Lesson) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| b.created_at.cmp(&a.created_at))
}

/// Returns `true` if `id` is safe to use as a file stem.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A directory with one `<id>.json` file per lesson.
#[derive(Debug, Clone)]
pub struct JsonLessonStore {
    dir: PathBuf,
}

impl JsonLessonStore {
    /// Opens a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if is_valid_id(id) {
            Ok(self.dir.join(format!("{id}.json")))
        } else {
            Err(RecallError::invalid_lesson_id(id))
        }
    }

    fn read_lesson(path: &Path) -> Result<Lesson> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RecallError::lesson_parse(path, e.to_string()))
    }
}

impl LessonStore for JsonLessonStore {
    fn list_lessons(&self) -> Result<Vec<Lesson>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "Lesson directory does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut lessons = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_lesson(&path) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable lesson"),
            }
        }

        lessons.sort_by(compare_lessons);
        Ok(lessons)
    }

    fn get_lesson(&self, id: &str) -> Result<Option<Lesson>> {
        let path = self.path_for(id)?;
        match Self::read_lesson(&path) {
            Ok(lesson) => Ok(Some(lesson)),
            Err(RecallError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save_lesson(&self, lesson: &Lesson, caps: &Capabilities) -> Result<()> {
        caps.require_edit("saving a lesson")?;
        let path = self.path_for(&lesson.id)?;

        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(lesson)?;
        std::fs::write(&path, json)?;

        info!(id = %lesson.id, words = lesson.vocabulary.len(), "Lesson saved");
        Ok(())
    }

    fn delete_lesson(&self, id: &str, caps: &Capabilities) -> Result<()> {
        caps.require_edit("deleting a lesson")?;
        let path = self.path_for(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "Lesson deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::vocabulary::VocabularyItem;

    fn temp_store(name: &str) -> JsonLessonStore {
        let dir = std::env::temp_dir().join(format!("recall_store_{name}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        JsonLessonStore::new(dir)
    }

    fn lesson(id: &str, day: u32, order: Option<u32>) -> Lesson {
        let mut lesson = Lesson::new(id, vec![VocabularyItem::new("word", "def", "example")]);
        lesson.created_at = Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap();
        lesson.order = order;
        lesson
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let store = temp_store("missing");
        assert!(store.list_lessons().unwrap().is_empty());
        assert!(store.get_lesson("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_and_get_round_trip() {
        let store = temp_store("roundtrip");
        let saved = lesson("2024-05-01", 1, None);
        store.save_lesson(&saved, &Capabilities::editor()).unwrap();

        let loaded = store.get_lesson("2024-05-01").unwrap().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.vocabulary, saved.vocabulary);
        assert_eq!(loaded.created_at, saved.created_at);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_save_requires_edit_capability() {
        let store = temp_store("readonly");
        let err = store
            .save_lesson(&lesson("l1", 1, None), &Capabilities::read_only())
            .unwrap_err();
        assert!(matches!(err, RecallError::PermissionDenied { .. }));
        assert!(!store.dir().exists());

        assert!(store.delete_lesson("l1", &Capabilities::default()).is_err());
        assert!(store
            .reorder(&["l1".to_string()], &Capabilities::read_only())
            .is_err());
    }

    #[test]
    fn test_list_sorted_by_order_then_newest() {
        let store = temp_store("sorting");
        let caps = Capabilities::editor();
        store.save_lesson(&lesson("old-unordered", 1, None), &caps).unwrap();
        store.save_lesson(&lesson("new-unordered", 9, None), &caps).unwrap();
        store.save_lesson(&lesson("second", 2, Some(1)), &caps).unwrap();
        store.save_lesson(&lesson("first", 3, Some(0)), &caps).unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<String> = store
            .list_lessons()
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "new-unordered", "old-unordered"]);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_corrupt_lesson_is_skipped_in_list_but_reported_on_get() {
        let store = temp_store("corrupt");
        store
            .save_lesson(&lesson("good", 1, None), &Capabilities::editor())
            .unwrap();
        std::fs::write(store.dir().join("bad.json"), "{ nope").unwrap();

        let lessons = store.list_lessons().unwrap();
        assert_eq!(lessons.len(), 1);

        let err = store.get_lesson("bad").unwrap_err();
        assert!(matches!(err, RecallError::LessonParseError { .. }));
        assert!(err.is_recoverable());

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let store = temp_store("ids");
        for id in ["", "../escape", "a/b", "dot.json"] {
            let err = store.get_lesson(id).unwrap_err();
            assert!(matches!(err, RecallError::InvalidLessonId { .. }), "{id}");
        }
    }

    #[test]
    fn test_delete_and_reorder() {
        let store = temp_store("reorder");
        let caps = Capabilities::editor();
        for (id, day) in [("a", 1), ("b", 2), ("c", 3)] {
            store.save_lesson(&lesson(id, day, None), &caps).unwrap();
        }

        store
            .reorder(
                &["c".to_string(), "missing".to_string(), "a".to_string()],
                &caps,
            )
            .unwrap();
        let ids: Vec<String> = store
            .list_lessons()
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(store.get_lesson("a").unwrap().unwrap().order, Some(2));

        store.delete_lesson("c", &caps).unwrap();
        store.delete_lesson("c", &caps).unwrap();
        assert!(store.get_lesson("c").unwrap().is_none());

        std::fs::remove_dir_all(store.dir()).ok();
    }
}
