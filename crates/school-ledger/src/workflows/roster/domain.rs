use serde::{Deserialize, Serialize};

use crate::workflows::validation::{optional_text, required_text, ValidationError};

/// How the student reaches school. Only `on-foot` affects fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    #[default]
    OnFoot,
    Riksha,
    Toto,
    SchoolVan,
}

impl TransportMode {
    pub const fn is_on_foot(self) -> bool {
        matches!(self, TransportMode::OnFoot)
    }

    pub const fn label(self) -> &'static str {
        match self {
            TransportMode::OnFoot => "on-foot",
            TransportMode::Riksha => "riksha",
            TransportMode::Toto => "toto",
            TransportMode::SchoolVan => "school-van",
        }
    }
}

/// Reference to an uploaded file held by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDocument {
    pub kind: String,
    pub file_name: String,
    pub url: String,
}

/// Enrolled student. `class_name` is free text; schedules are joined through
/// the normalised class key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub section: Option<String>,
    pub roll_no: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub father_name: String,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub contact_no: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub transport_mode: TransportMode,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub documents: Vec<StudentDocument>,
    pub guardian_uid: String,
}

impl Student {
    pub fn class_label(&self) -> String {
        match &self.section {
            Some(section) => format!("Class {} ({})", self.class_name, section),
            None => format!("Class {}", self.class_name),
        }
    }
}

/// Admin-submitted student profile prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    pub roll_no: Option<String>,
    pub date_of_birth: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub transport_mode: TransportMode,
    pub photo_url: Option<String>,
    pub documents: Vec<StudentDocument>,
    pub guardian_uid: Option<String>,
}

impl StudentDraft {
    /// Build a student from the draft. The guardian uid is only read when
    /// `guardian_uid` is `None`, i.e. on first registration.
    pub fn into_student(
        self,
        student_id: String,
        guardian_uid: Option<String>,
    ) -> Result<Student, ValidationError> {
        let name = required_text("name", self.name.as_deref())?;
        let class_name = required_text("class_name", self.class_name.as_deref())?;
        let roll_no = required_text("roll_no", self.roll_no.as_deref())?;
        let father_name = required_text("father_name", self.father_name.as_deref())?;
        let guardian_uid = match guardian_uid {
            Some(uid) => uid,
            None => required_text("guardian_uid", self.guardian_uid.as_deref())?,
        };

        let documents = self
            .documents
            .into_iter()
            .filter(|document| {
                !document.kind.trim().is_empty() && !document.url.trim().is_empty()
            })
            .collect();

        Ok(Student {
            student_id,
            name,
            class_name,
            section: optional_text(self.section.as_deref()),
            roll_no,
            date_of_birth: optional_text(self.date_of_birth.as_deref()),
            father_name,
            mother_name: optional_text(self.mother_name.as_deref()),
            gender: optional_text(self.gender.as_deref()),
            blood_group: optional_text(self.blood_group.as_deref()),
            contact_no: optional_text(self.contact_no.as_deref()),
            address: optional_text(self.address.as_deref()),
            transport_mode: self.transport_mode,
            photo_url: optional_text(self.photo_url.as_deref()),
            documents,
            guardian_uid,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Admin,
    Guardian,
}

/// `users/{uid}` document issued alongside the identity provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub uid: String,
    pub role: AccountRole,
    #[serde(default)]
    pub student_id: Option<String>,
}

impl UserAccount {
    pub fn guardian(uid: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            role: AccountRole::Guardian,
            student_id: Some(student_id.into()),
        }
    }
}
