
use crate::workflows::roster::{StudentDraft, TransportMode};

fn draft(name: &str, class_name: &str, roll_no: &str, guardian_uid: &str) -> StudentDraft {
    StudentDraft {
        name: Some(name.to_string()),
        class_name: Some(class_name.to_string()),
        roll_no: Some(roll_no.to_string()),
        father_name: Some("Ratan Das".to_string()),
        guardian_uid: Some(guardian_uid.to_string()),
        transport_mode: TransportMode::Toto,
        ..StudentDraft::default()
    }
}
