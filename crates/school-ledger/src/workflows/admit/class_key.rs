//! Join key between a student's free-text class and a timetable.

/// Normalise a class label: anything mentioning `UKG` is `UKG`, otherwise the
/// first ASCII digit, otherwise the trimmed input. Used for both timetable
/// writes and lookups.
pub fn normalize(value: &str) -> String {
    let upper = value.to_uppercase();
    if upper.contains("UKG") {
        return "UKG".to_string();
    }
    if let Some(digit) = upper.chars().find(char::is_ascii_digit) {
        return digit.to_string();
    }
    value.trim().to_string()
}
