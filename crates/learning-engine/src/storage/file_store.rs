//! Filesystem store: one versioned JSON file per record.
//!
//! Layout under the base directory:
//! ```text
//! progress/{student_id}/{course_version_id}/{lesson_id}.json
//! enrollments/{enrollment_id}.json
//! enrollment_index/{student_id}/{course_version_id}.json
//! certificates/{enrollment_id}.json
//! ```
//!
//! Every write goes to a uniquely named temp file and is renamed over the
//! target, so readers see either the old record or the new one, never a
//! partial file. The index maps a (student, course version) pair to its
//! enrollment id and is written before the enrollment itself.
//!
//! Certificates are filed under their enrollment id: an enrollment has at
//! most one certificate. Issuance writes the full certificate to a temp
//! file and claims the slot with `hard_link`, which fails if it is taken.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "record": { ... }
//! }
//! ```
//!
//! Issuance writes the certificate first and the enrollment second. A crash
//! in between is corrected in memory whenever the enrollment is read; the
//! corrected record reaches disk with the next write the service makes
//! under the enrollment lock.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{CourseVersionId, StudentId};
use crate::certificate::{Certificate, CertificateId};
use crate::enrollment::{Enrollment, EnrollmentId, EnrollmentStatus};
use crate::error::{LearningError, Result};
use crate::progress::{Progress, ProgressKey};

use super::LearningStore;

// ── File format constants ─────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

const PROGRESS_DIR: &str = "progress";
const ENROLLMENTS_DIR: &str = "enrollments";
const ENROLLMENT_INDEX_DIR: &str = "enrollment_index";
const CERTIFICATES_DIR: &str = "certificates";

// ── On-disk structure ─────────────────────────────────────────────────────────

/// Wrapper written to disk for every record.
#[derive(Debug, Serialize, Deserialize)]
struct RecordFile<T> {
    /// Format version number.
    version: u32,
    /// The stored record.
    record: T,
}

// ── FileStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed [`LearningStore`].
///
/// Safe for use from many threads of one process when driven through the
/// service, which serializes writes per key. Concurrent writers in separate
/// processes are not coordinated.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_dir`, creating its directories and
    /// indexing any enrollment that has no index entry yet.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        for dir in [PROGRESS_DIR, ENROLLMENTS_DIR, ENROLLMENT_INDEX_DIR, CERTIFICATES_DIR] {
            std::fs::create_dir_all(base_dir.join(dir))?;
        }
        let store = Self { base_dir };
        store.rebuild_index()?;
        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Paths ─────────────────────────────────────────────────────────────────

    fn progress_dir(&self, student: &StudentId, course_version: &CourseVersionId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join(PROGRESS_DIR)
            .join(path_component("student id", &student.0)?)
            .join(path_component("course version id", &course_version.0)?))
    }

    fn progress_path(&self, key: &ProgressKey) -> Result<PathBuf> {
        let dir = self.progress_dir(&key.student_id, &key.course_version_id)?;
        Ok(dir.join(format!(
            "{}.json",
            path_component("lesson id", &key.lesson_id.0)?
        )))
    }

    fn enrollment_path(&self, id: &EnrollmentId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join(ENROLLMENTS_DIR)
            .join(format!("{}.json", path_component("enrollment id", &id.0)?)))
    }

    fn index_path(&self, student: &StudentId, course_version: &CourseVersionId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join(ENROLLMENT_INDEX_DIR)
            .join(path_component("student id", &student.0)?)
            .join(format!(
                "{}.json",
                path_component("course version id", &course_version.0)?
            )))
    }

    fn certificate_path(&self, enrollment: &EnrollmentId) -> Result<PathBuf> {
        Ok(self.base_dir.join(CERTIFICATES_DIR).join(format!(
            "{}.json",
            path_component("enrollment id", &enrollment.0)?
        )))
    }

    // ── Enrollment index ──────────────────────────────────────────────────────

    /// Add index entries for enrollments written without one. The earliest
    /// enrollment wins if a pair somehow has several.
    fn rebuild_index(&self) -> Result<()> {
        for e in self.load_all_enrollments()? {
            let path = self.index_path(&e.student_id, &e.course_version_id)?;
            if !path.exists() {
                debug!("indexing enrollment {}", e.id);
                write_record(&path, &e.id)?;
            }
        }
        Ok(())
    }

    // ── Enrollment reconciliation ─────────────────────────────────────────────

    /// Bring `certificate_issued` in line with the certificate files.
    ///
    /// Only the returned value is corrected. Nothing is written here: reads
    /// run without the enrollment lock.
    fn reconcile(&self, mut enrollment: Enrollment) -> Enrollment {
        let cert_path = match self.certificate_path(&enrollment.id) {
            Ok(path) => path,
            Err(e) => {
                warn!("cannot reconcile enrollment {}: {e}", enrollment.id);
                return enrollment;
            }
        };
        let has_certificate = cert_path.exists();

        if has_certificate && !enrollment.certificate_issued {
            let certificate: Certificate = match read_record(&cert_path, "certificate") {
                Ok(c) => c,
                Err(e) => {
                    warn!("cannot reconcile enrollment {}: {e}", enrollment.id);
                    return enrollment;
                }
            };
            warn!(
                "enrollment {} has certificate {} but no issued flag; repairing",
                enrollment.id, certificate.id
            );
            enrollment.certificate_issued = true;
            if !enrollment.status.is_terminal() {
                enrollment.status = EnrollmentStatus::Completed;
                enrollment.completed_at.get_or_insert(certificate.issued_at);
            }
        } else if !has_certificate && enrollment.certificate_issued {
            warn!(
                "enrollment {} is flagged as certified but has no certificate; clearing flag",
                enrollment.id
            );
            enrollment.certificate_issued = false;
        }

        enrollment
    }

    fn load_all_enrollments(&self) -> Result<Vec<Enrollment>> {
        let mut enrollments = Vec::new();
        for path in json_files(&self.base_dir.join(ENROLLMENTS_DIR))? {
            match read_record::<Enrollment>(&path, "enrollment") {
                Ok(e) => enrollments.push(self.reconcile(e)),
                Err(e) => warn!("skipping unreadable enrollment file: {e}"),
            }
        }
        enrollments.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at).then(a.id.cmp(&b.id)));
        Ok(enrollments)
    }
}

impl LearningStore for FileStore {
    fn load_progress(&self, key: &ProgressKey) -> Result<Option<Progress>> {
        let path = self.progress_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path, "progress").map(Some)
    }

    fn save_progress(&self, progress: &Progress) -> Result<()> {
        write_record(&self.progress_path(&progress.key)?, progress)
    }

    fn list_progress(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Vec<Progress>> {
        let dir = self.progress_dir(student, course_version)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for path in json_files(&dir)? {
            match read_record::<Progress>(&path, "progress") {
                Ok(p) => records.push(p),
                Err(e) => warn!("skipping unreadable progress file: {e}"),
            }
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    fn load_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        let path = self.enrollment_path(id)?;
        if !path.exists() {
            return Err(LearningError::NotFound(format!("enrollment not found: {id}")));
        }
        let enrollment = read_record(&path, "enrollment")?;
        Ok(self.reconcile(enrollment))
    }

    fn save_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        let index = self.index_path(&enrollment.student_id, &enrollment.course_version_id)?;
        if !index.exists() {
            write_record(&index, &enrollment.id)?;
        }
        write_record(&self.enrollment_path(&enrollment.id)?, enrollment)
    }

    fn find_enrollment(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Option<Enrollment>> {
        let index = self.index_path(student, course_version)?;
        if !index.exists() {
            return Ok(None);
        }
        let id: EnrollmentId = read_record(&index, "enrollment index")?;
        let path = self.enrollment_path(&id)?;
        if !path.exists() {
            // Index written, enrollment write lost.
            debug!("index for {student} in {course_version} names missing enrollment {id}");
            return Ok(None);
        }
        let enrollment: Enrollment = read_record(&path, "enrollment")?;
        if &enrollment.student_id != student || &enrollment.course_version_id != course_version {
            warn!("index for {student} in {course_version} names enrollment {id} of another pair");
            return Ok(None);
        }
        Ok(Some(self.reconcile(enrollment)))
    }

    fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        self.load_all_enrollments()
    }

    fn load_certificate(&self, id: &CertificateId) -> Result<Certificate> {
        self.list_certificates()?
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| LearningError::NotFound(format!("certificate not found: {id}")))
    }

    fn save_certificate(&self, certificate: &Certificate) -> Result<()> {
        let path = self.certificate_path(&certificate.enrollment_id)?;
        if !path.exists() {
            return Err(LearningError::NotFound(format!(
                "certificate not found: {}",
                certificate.id
            )));
        }
        write_record(&path, certificate)
    }

    fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>> {
        Ok(self
            .list_certificates()?
            .into_iter()
            .find(|c| c.code == code))
    }

    fn find_certificate_by_enrollment(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Option<Certificate>> {
        let path = self.certificate_path(enrollment)?;
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path, "certificate").map(Some)
    }

    fn list_certificates(&self) -> Result<Vec<Certificate>> {
        let mut certificates = Vec::new();
        for path in json_files(&self.base_dir.join(CERTIFICATES_DIR))? {
            match read_record::<Certificate>(&path, "certificate") {
                Ok(c) => certificates.push(c),
                Err(e) => warn!("skipping unreadable certificate file: {e}"),
            }
        }
        certificates.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then(a.id.cmp(&b.id)));
        Ok(certificates)
    }

    fn save_issuance(&self, certificate: &Certificate, enrollment: &Enrollment) -> Result<()> {
        let cert_path = self.certificate_path(&enrollment.id)?;
        let json = to_json(certificate)?;

        // Link a complete, synced file into place; the link fails if the
        // slot is already taken.
        let tmp_path = temp_path(&cert_path);
        let claimed = write_synced(&tmp_path, json.as_bytes())
            .and_then(|()| std::fs::hard_link(&tmp_path, &cert_path));
        if let Err(rm) = std::fs::remove_file(&tmp_path) {
            if rm.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove {}: {rm}", tmp_path.display());
            }
        }
        match claimed {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(LearningError::AlreadyIssued(enrollment.id.to_string()));
            }
            Err(e) => return Err(LearningError::Io(e)),
        }

        if let Err(e) = write_record(&self.enrollment_path(&enrollment.id)?, enrollment) {
            // Roll back; if that fails too, reads reconcile.
            if let Err(rm) = std::fs::remove_file(&cert_path) {
                warn!(
                    "could not roll back certificate {} after failed enrollment write: {rm}",
                    certificate.id
                );
            }
            return Err(e);
        }

        debug!(
            "stored certificate {} for enrollment {}",
            certificate.id, enrollment.id
        );
        Ok(())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Reject ids that would escape their directory or name a hidden file.
fn path_component<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let bad = value.is_empty()
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(LearningError::InvalidInput(format!(
            "{what} cannot be used as a file name: {value:?}"
        )));
    }
    Ok(value)
}

fn to_json<T: Serialize>(record: &T) -> Result<String> {
    let file = RecordFile {
        version: RECORD_FILE_VERSION,
        record,
    };
    serde_json::to_string_pretty(&file).map_err(|e| LearningError::SerializationError(e.to_string()))
}

/// Write to a temp file next to `path`, then rename over it.
fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let json = to_json(record)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path);
    std::fs::write(&tmp_path, json.as_bytes())?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(LearningError::Io(e));
    }
    Ok(())
}

/// `{stem}.{nonce}.tmp`: unique per writer, and never picked up as `*.json`.
fn temp_path(path: &Path) -> PathBuf {
    let nonce: [u8; 8] = crate::random::random_bytes();
    path.with_extension(format!("{}.tmp", hex::encode(nonce)))
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn read_record<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let bytes = std::fs::read(path)?;
    let file: RecordFile<T> = serde_json::from_slice(&bytes).map_err(|e| {
        LearningError::InvalidFileFormat(format!(
            "failed to parse {what} file {}: {e}",
            path.display()
        ))
    })?;
    if file.version != RECORD_FILE_VERSION {
        return Err(LearningError::InvalidFileFormat(format!(
            "unsupported {what} file version {} in {}",
            file.version,
            path.display()
        )));
    }
    Ok(file.record)
}

/// `*.json` files directly inside `dir`.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
