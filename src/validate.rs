use lazy_static::lazy_static;
use regex::Regex;

pub const SEVERITIES: [&str; 4] = ["Low", "Medium", "High", "Critical"];

pub const DISASTER_TYPES: [&str; 14] = [
    "Flood",
    "Fire",
    "Earthquake",
    "Hurricane",
    "Tornado",
    "Tsunami",
    "Landslide",
    "Drought",
    "Avalanche",
    "Volcanic Eruption",
    "Wildfire",
    "Storm",
    "Cyclone",
    "Other",
];

pub const MIN_MESSAGE_CHARS: usize = 20;

/// Strips ASCII control characters (newline, carriage return and tab stay),
/// truncates to `max_length` characters and trims surrounding whitespace.
/// Absent input normalizes to the empty string, never to a missing value.
pub fn sanitize(text: &str, max_length: usize) -> String {
    text.chars()
        .filter(|c| *c as u32 >= 32 || matches!(c, '\n' | '\r' | '\t'))
        .take(max_length)
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn validate_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email) && email.chars().count() <= 254
}

/// Password strength check. Returns the field-level message for the first
/// rule the password breaks.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    lazy_static! {
        static ref LETTER_RE: Regex = Regex::new(r"[A-Za-z]").unwrap();
        static ref DIGIT_RE: Regex = Regex::new(r"\d").unwrap();
    }
    let len = password.chars().count();
    if len < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if len > 128 {
        return Err("Password is too long");
    }
    if !LETTER_RE.is_match(password) {
        return Err("Password must contain at least one letter");
    }
    if !DIGIT_RE.is_match(password) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

pub fn validate_location(location: &str) -> bool {
    lazy_static! {
        static ref LOCATION_RE: Regex = Regex::new(r"^[a-zA-Z0-9\s,.-]+$").unwrap();
    }
    let len = location.chars().count();
    (3..=200).contains(&len) && LOCATION_RE.is_match(location)
}

pub fn validate_severity(severity: &str) -> bool {
    SEVERITIES.contains(&severity)
}

pub fn validate_disaster_type(disaster_type: &str) -> bool {
    DISASTER_TYPES.contains(&disaster_type)
}

pub fn validate_message(message: &str) -> Result<(), &'static str> {
    if message.chars().count() < MIN_MESSAGE_CHARS {
        return Err("Message must be at least 20 characters");
    }
    Ok(())
}
