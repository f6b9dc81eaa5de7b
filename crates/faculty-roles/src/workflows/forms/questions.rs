use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::listings::Listing;

/// What a question is for, independent of its wording on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRole {
    RoleSelect,
    NoOpenings,
    ContactSection,
    FullName,
    CurrentDepartment,
    CurrentTitle,
    Phone,
    AdditionalSection,
    Motivation,
    Experience,
    Availability,
    Comments,
}

impl QuestionRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RoleSelect => "Faculty Role of Interest",
            Self::NoOpenings => "No Faculty Roles Available",
            Self::ContactSection => "Contact Information",
            Self::FullName => "Full Name",
            Self::CurrentDepartment => "Current Department/Division",
            Self::CurrentTitle => "Current Position Title",
            Self::Phone => "Phone Number",
            Self::AdditionalSection => "Additional Information",
            Self::Motivation => "Why are you interested in this faculty role?",
            Self::Experience => "Relevant Experience or Qualifications",
            Self::Availability => "When would you be available to start?",
            Self::Comments => "Additional Comments",
        }
    }
}

pub const AVAILABILITY_OPTIONS: [&str; 7] = [
    "Immediately",
    "Within 2 weeks",
    "Within 1 month",
    "Within 2 months",
    "At the end of current semester",
    "At the end of current school year",
    "Other (please specify in comments)",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Drop-down list with exactly one answer.
    SingleSelect { choices: Vec<String> },
    /// Radio buttons with exactly one answer.
    MultipleChoice { choices: Vec<String> },
    Text,
    Paragraph,
    SectionHeader,
}

impl QuestionKind {
    pub fn choices(&self) -> &[String] {
        match self {
            Self::SingleSelect { choices } | Self::MultipleChoice { choices } => choices,
            Self::Text | Self::Paragraph | Self::SectionHeader => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormQuestion {
    pub role: QuestionRole,
    pub kind: QuestionKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub required: bool,
}

impl FormQuestion {
    fn new(role: QuestionRole, kind: QuestionKind) -> Self {
        Self {
            role,
            kind,
            title: role.label().to_string(),
            help_text: None,
            required: false,
        }
    }

    fn help(mut self, text: &str) -> Self {
        self.help_text = Some(text.to_string());
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered questions of the interest form, built from the open listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormQuestionSet {
    questions: Vec<FormQuestion>,
    role_choices: Vec<String>,
}

impl FormQuestionSet {
    pub fn from_listings(listings: &[Listing]) -> Self {
        let mut role_choices: Vec<String> = Vec::with_capacity(listings.len());
        for choice in listings.iter().map(Listing::choice_label) {
            if !role_choices.contains(&choice) {
                role_choices.push(choice);
            }
        }

        if role_choices.is_empty() {
            let notice = FormQuestion::new(QuestionRole::NoOpenings, QuestionKind::Paragraph).help(
                "There are currently no faculty role positions available for interest expression.",
            );
            return Self {
                questions: vec![notice],
                role_choices,
            };
        }

        let questions = vec![
            FormQuestion::new(
                QuestionRole::RoleSelect,
                QuestionKind::SingleSelect {
                    choices: role_choices.clone(),
                },
            )
            .help("Select the faculty role you would like to express interest in:")
            .required(),
            FormQuestion::new(QuestionRole::ContactSection, QuestionKind::SectionHeader)
                .help("This information will help HR contact you about the position."),
            FormQuestion::new(QuestionRole::FullName, QuestionKind::Text).required(),
            FormQuestion::new(QuestionRole::CurrentDepartment, QuestionKind::Text)
                .help("e.g., Elementary School, Middle School, High School, Technology, etc.")
                .required(),
            FormQuestion::new(QuestionRole::CurrentTitle, QuestionKind::Text).required(),
            FormQuestion::new(QuestionRole::Phone, QuestionKind::Text)
                .help("Mobile or office number where you can be reached"),
            FormQuestion::new(QuestionRole::AdditionalSection, QuestionKind::SectionHeader),
            FormQuestion::new(QuestionRole::Motivation, QuestionKind::Paragraph)
                .help("Please share what interests you about this role and how it aligns with your career goals.")
                .required(),
            FormQuestion::new(QuestionRole::Experience, QuestionKind::Paragraph).help(
                "Please highlight any relevant experience, skills, or qualifications that make you a good fit for this faculty role.",
            ),
            FormQuestion::new(
                QuestionRole::Availability,
                QuestionKind::MultipleChoice {
                    choices: AVAILABILITY_OPTIONS.iter().map(|s| s.to_string()).collect(),
                },
            )
            .required(),
            FormQuestion::new(QuestionRole::Comments, QuestionKind::Paragraph)
                .help("Any additional information you would like to share"),
        ];

        Self {
            questions,
            role_choices,
        }
    }

    pub fn questions(&self) -> &[FormQuestion] {
        &self.questions
    }

    pub fn role_choices(&self) -> &[String] {
        &self.role_choices
    }

    pub fn has_openings(&self) -> bool {
        !self.role_choices.is_empty()
    }
}

/// Identifier the form service assigned to a question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

/// Where each question landed on the built form, captured at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLayout {
    form_id: String,
    items: BTreeMap<QuestionRole, ItemId>,
    role_choices: Vec<String>,
}

impl QuestionLayout {
    pub fn new(form_id: impl Into<String>, role_choices: Vec<String>) -> Self {
        Self {
            form_id: form_id.into(),
            items: BTreeMap::new(),
            role_choices,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn insert(&mut self, role: QuestionRole, item: ItemId) {
        self.items.insert(role, item);
    }

    pub fn item(&self, role: QuestionRole) -> Option<&ItemId> {
        self.items.get(&role)
    }

    pub fn offers_choice(&self, choice: &str) -> bool {
        self.role_choices.iter().any(|offered| offered == choice)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
