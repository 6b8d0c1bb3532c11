//! In-memory store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::{CourseVersionId, StudentId};
use crate::certificate::{Certificate, CertificateId};
use crate::enrollment::{Enrollment, EnrollmentId};
use crate::error::{LearningError, Result};
use crate::progress::{Progress, ProgressKey};

use super::LearningStore;

#[derive(Debug, Default)]
struct Tables {
    progress: HashMap<ProgressKey, Progress>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    certificates: HashMap<CertificateId, Certificate>,
    certificate_by_enrollment: HashMap<EnrollmentId, CertificateId>,
}

/// [`LearningStore`] backed by hash maps behind a single `RwLock`.
///
/// `save_issuance` commits the certificate and the enrollment under one
/// write guard, so readers never observe one without the other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LearningError::StorageError("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LearningError::StorageError("memory store lock poisoned".into()))
    }
}

impl LearningStore for MemoryStore {
    fn load_progress(&self, key: &ProgressKey) -> Result<Option<Progress>> {
        Ok(self.read()?.progress.get(key).cloned())
    }

    fn save_progress(&self, progress: &Progress) -> Result<()> {
        self.write()?
            .progress
            .insert(progress.key.clone(), progress.clone());
        Ok(())
    }

    fn list_progress(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Vec<Progress>> {
        let tables = self.read()?;
        let mut records: Vec<Progress> = tables
            .progress
            .values()
            .filter(|p| &p.key.student_id == student && &p.key.course_version_id == course_version)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    fn load_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.read()?
            .enrollments
            .get(id)
            .cloned()
            .ok_or_else(|| LearningError::NotFound(format!("enrollment not found: {id}")))
    }

    fn save_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        self.write()?
            .enrollments
            .insert(enrollment.id.clone(), enrollment.clone());
        Ok(())
    }

    fn find_enrollment(
        &self,
        student: &StudentId,
        course_version: &CourseVersionId,
    ) -> Result<Option<Enrollment>> {
        Ok(self
            .read()?
            .enrollments
            .values()
            .find(|e| &e.student_id == student && &e.course_version_id == course_version)
            .cloned())
    }

    fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        let mut all: Vec<Enrollment> = self.read()?.enrollments.values().cloned().collect();
        all.sort_by(|a, b| a.enrolled_at.cmp(&b.enrolled_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn load_certificate(&self, id: &CertificateId) -> Result<Certificate> {
        self.read()?
            .certificates
            .get(id)
            .cloned()
            .ok_or_else(|| LearningError::NotFound(format!("certificate not found: {id}")))
    }

    fn save_certificate(&self, certificate: &Certificate) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.certificates.contains_key(&certificate.id) {
            return Err(LearningError::NotFound(format!(
                "certificate not found: {}",
                certificate.id
            )));
        }
        tables
            .certificates
            .insert(certificate.id.clone(), certificate.clone());
        Ok(())
    }

    fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>> {
        Ok(self
            .read()?
            .certificates
            .values()
            .find(|c| c.code == code)
            .cloned())
    }

    fn find_certificate_by_enrollment(
        &self,
        enrollment: &EnrollmentId,
    ) -> Result<Option<Certificate>> {
        let tables = self.read()?;
        Ok(tables
            .certificate_by_enrollment
            .get(enrollment)
            .and_then(|id| tables.certificates.get(id))
            .cloned())
    }

    fn list_certificates(&self) -> Result<Vec<Certificate>> {
        let mut all: Vec<Certificate> = self.read()?.certificates.values().cloned().collect();
        all.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn save_issuance(&self, certificate: &Certificate, enrollment: &Enrollment) -> Result<()> {
        let mut tables = self.write()?;
        if tables.certificate_by_enrollment.contains_key(&enrollment.id) {
            return Err(LearningError::AlreadyIssued(enrollment.id.to_string()));
        }
        tables
            .certificate_by_enrollment
            .insert(enrollment.id.clone(), certificate.id.clone());
        tables
            .certificates
            .insert(certificate.id.clone(), certificate.clone());
        tables
            .enrollments
            .insert(enrollment.id.clone(), enrollment.clone());
        Ok(())
    }
}
