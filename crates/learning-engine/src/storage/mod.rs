//! Persistence for progress records, enrollments and certificates.
//!
//! The engine talks to storage only through [`LearningStore`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`] keeps everything behind one `RwLock`, for hosts that
//!   persist elsewhere and for tests.
//! - [`FileStore`] writes one versioned JSON file per record under a data
//!   directory.

pub mod file_store;
pub mod memory;

pub use file_store::FileStore;
pub use memory::MemoryStore;

use crate::catalog::{CourseVersionId, StudentId};
use crate::certificate::{Certificate, CertificateId};
use crate::enrollment::{Enrollment, EnrollmentId};
use crate::error::Result;
use crate::progress::{Progress, ProgressKey};

/// Storage backend consumed by [`crate::service::LearningService`].
///
/// Implementations need not lock across calls: the service serializes
/// read-modify-write cycles per progress key and per enrollment. The one
/// compound write, [`LearningStore::save_issuance`], must not half-apply.
pub trait LearningStore: Send + Sync {
    // -- Progress -----------------------------------------------------------

    /// Load one progress record, `None` if the student never touched the lesson.
    fn load_progress(&self, key: &ProgressKey) -> Result<Option<Progress>>;

    fn save_progress(&self, progress: &Progress) -> Result<()>;

    /// All progress records of one student in one course version.
    fn list_progress(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Vec<Progress>>;

    // -- Enrollments --------------------------------------------------------

    /// Load an enrollment. Fails with `NotFound` if it does not exist.
    fn load_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment>;

    fn save_enrollment(&self, enrollment: &Enrollment) -> Result<()>;

    /// The enrollment of `student` in `course_version`, if any.
    fn find_enrollment(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Option<Enrollment>>;

    fn list_enrollments(&self) -> Result<Vec<Enrollment>>;

    fn list_enrollments_for_student(&self, student: &StudentId) -> Result<Vec<Enrollment>> {
        Ok(self
            .list_enrollments()?
            .into_iter()
            .filter(|e| &e.student_id == student)
            .collect())
    }

    fn list_enrollments_for_version(
        &self,
        course_version: &CourseVersionId,
    ) -> Result<Vec<Enrollment>> {
        Ok(self
            .list_enrollments()?
            .into_iter()
            .filter(|e| &e.course_version_id == course_version)
            .collect())
    }

    // -- Certificates -------------------------------------------------------

    /// Load a certificate. Fails with `NotFound` if it does not exist.
    fn load_certificate(&self, id: &CertificateId) -> Result<Certificate>;

    /// Overwrite an existing certificate (revocation).
    fn save_certificate(&self, certificate: &Certificate) -> Result<()>;

    fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>>;

    fn find_certificate_by_enrollment(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Option<Certificate>>;

    fn list_certificates(&self) -> Result<Vec<Certificate>>;

    /// Persist a new certificate together with its updated enrollment.
    ///
    /// Fails with `AlreadyIssued` if a certificate already exists for the
    /// enrollment; nothing is written in that case.
    fn save_issuance(&self, certificate: &Certificate, enrollment: &Enrollment) -> Result<()>;
}
