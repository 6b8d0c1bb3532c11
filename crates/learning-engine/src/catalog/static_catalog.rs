//! In-memory catalog of course versions.
//!
//! Loaded from a JSON file of the form:
//! ```json
//! {
//!     "version": 1,
//!     "courses": [
//!         { "id": "cv-1", "policy": { ... }, "chapters": [ ... ] }
//!     ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};

use super::types::{Chapter, CourseVersionId, CourseVersionPolicy, LessonTree};
use super::{LessonCatalog, PolicySource};

const CATALOG_FILE_VERSION: u32 = 1;

/// One course version: its policy plus its lesson tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseVersionEntry {
    pub id: CourseVersionId,
    pub policy: CourseVersionPolicy,
    pub chapters: Vec<Chapter>,
}

/// On-disk wrapper for a catalog.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    courses: Vec<CourseVersionEntry>,
}

/// Catalog and policy source backed by a map.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    entries: HashMap<CourseVersionId, CourseVersionEntry>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a course version.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::InvalidInput` if the policy is malformed or a
    /// lesson id appears twice in the tree.
    pub fn insert(&mut self, entry: CourseVersionEntry) -> Result<()> {
        entry.policy.validate()?;

        let mut seen = std::collections::HashSet::new();
        for lesson in entry.chapters.iter().flat_map(|c| c.lessons.iter()) {
            if !seen.insert(lesson.id.clone()) {
                return Err(LearningError::InvalidInput(format!(
                    "duplicate lesson {} in course version {}",
                    lesson.id, entry.id
                )));
            }
        }

        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Convenience wrapper around [`StaticCatalog::insert`].
    pub fn add_course(
        &mut self,
        id: CourseVersionId,
        policy: CourseVersionPolicy,
        chapters: Vec<Chapter>,
    ) -> Result<()> {
        self.insert(CourseVersionEntry {
            id,
            policy,
            chapters,
        })
    }

    pub fn course_versions(&self) -> Vec<CourseVersionId> {
        let mut ids: Vec<CourseVersionId> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file: CatalogFile = serde_json::from_slice(&bytes).map_err(|e| {
            LearningError::InvalidFileFormat(format!(
                "failed to parse catalog file {}: {e}",
                path.display()
            ))
        })?;

        if file.version != CATALOG_FILE_VERSION {
            return Err(LearningError::InvalidFileFormat(format!(
                "unsupported catalog version {} in {}",
                file.version,
                path.display()
            )));
        }

        let mut catalog = Self::new();
        for entry in file.courses {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Write the catalog as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut courses: Vec<CourseVersionEntry> = self.entries.values().cloned().collect();
        courses.sort_by(|a, b| a.id.cmp(&b.id));
        let file = CatalogFile {
            version: CATALOG_FILE_VERSION,
            courses,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| LearningError::SerializationError(e.to_string()))?;
        std::fs::write(path, json.as_bytes())?;
        Ok(())
    }

    /// Move every course version of `other` into this catalog, replacing
    /// versions with the same id. Returns the imported ids.
    pub fn merge(&mut self, other: StaticCatalog) -> Vec<CourseVersionId> {
        let mut imported: Vec<CourseVersionId> = other.entries.keys().cloned().collect();
        imported.sort();
        self.entries.extend(other.entries);
        imported
    }

    pub fn entry(&self, id: &CourseVersionId) -> Result<&CourseVersionEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| LearningError::NotFound(format!("course version {}", id)))
    }
}

impl LessonCatalog for StaticCatalog {
    fn lesson_tree(&self, course_version: &CourseVersionId) -> Result<LessonTree> {
        let entry = self.entry(course_version)?;
        Ok(LessonTree::new(entry.id.clone(), entry.chapters.clone()))
    }
}

impl PolicySource for StaticCatalog {
    fn policy(&self, course_version: &CourseVersionId) -> Result<CourseVersionPolicy> {
        Ok(self.entry(course_version)?.policy.clone())
    }
}
