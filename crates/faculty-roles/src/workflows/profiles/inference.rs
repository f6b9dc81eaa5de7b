/// Ordered substring table; the first pattern found in the local part wins.
const DEPARTMENT_PATTERNS: [(&str, &str); 11] = [
    ("tech", "Technology"),
    ("it", "Technology"),
    ("hr", "Human Resources"),
    ("admin", "Administration"),
    ("finance", "Finance"),
    ("elementary", "Elementary School"),
    ("middle", "Middle School"),
    ("high", "High School"),
    ("es", "Elementary School"),
    ("ms", "Middle School"),
    ("hs", "High School"),
];

const NAME_SEPARATORS: [char; 4] = ['.', '_', '-', '+'];

pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default().trim()
}

/// "jane.doe@org.example" -> "Jane Doe".
pub fn default_name(email: &str) -> String {
    local_part(email)
        .split(NAME_SEPARATORS)
        .filter(|segment| !segment.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-guess department from the email's local part, if any pattern matches.
pub fn infer_department(email: &str) -> Option<&'static str> {
    let local = local_part(email).to_lowercase();
    DEPARTMENT_PATTERNS
        .iter()
        .find(|(pattern, _)| local.contains(pattern))
        .map(|(_, department)| *department)
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
