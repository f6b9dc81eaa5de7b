use serde::{Deserialize, Serialize};

/// Resolved identity of the person filling in the interest form.
///
/// `email` is always the lookup key; every other field is empty text when no
/// source knew it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentProfile {
    pub name: String,
    pub email: String,
    pub job_title: String,
    pub department: String,
    pub phone: String,
}

/// Partial profile contributed by one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFragment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ProfileFragment {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_job_title(mut self, job_title: impl Into<String>) -> Self {
        self.job_title = Some(job_title.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Drops blank values so they never count as a contribution.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        }

        Self {
            name: keep(self.name),
            job_title: keep(self.job_title),
            department: keep(self.department),
            phone: keep(self.phone),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.name, &self.job_title, &self.department, &self.phone]
            .into_iter()
            .all(|value| value.as_deref().map_or(true, |text| text.trim().is_empty()))
    }
}

/// Profile under construction while the resolver walks its sources.
#[derive(Debug, Clone)]
pub(crate) struct ProfileDraft {
    profile: RespondentProfile,
    name_is_default: bool,
}

impl ProfileDraft {
    pub(crate) fn new(email: &str, default_name: String) -> Self {
        Self {
            profile: RespondentProfile {
                name: default_name,
                email: email.to_string(),
                ..RespondentProfile::default()
            },
            name_is_default: true,
        }
    }

    /// Authoritative sources replace every field they carry.
    pub(crate) fn overwrite_with(&mut self, fragment: ProfileFragment) {
        let ProfileFragment {
            name,
            job_title,
            department,
            phone,
        } = fragment;

        if let Some(name) = name {
            self.profile.name = name;
            self.name_is_default = false;
        }
        if let Some(job_title) = job_title {
            self.profile.job_title = job_title;
        }
        if let Some(department) = department {
            self.profile.department = department;
        }
        if let Some(phone) = phone {
            self.profile.phone = phone;
        }
    }

    /// Supplementary sources only fill what is still empty. The name derived
    /// from the email counts as empty for this purpose.
    pub(crate) fn fill_empty(&mut self, fragment: ProfileFragment) {
        let ProfileFragment {
            name,
            job_title,
            department,
            phone,
        } = fragment;

        if let Some(name) = name {
            if self.name_is_default || self.profile.name.is_empty() {
                self.profile.name = name;
                self.name_is_default = false;
            }
        }
        fill(&mut self.profile.job_title, job_title);
        fill(&mut self.profile.department, department);
        fill(&mut self.profile.phone, phone);
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.name_is_default
            && !self.profile.name.is_empty()
            && !self.profile.job_title.is_empty()
            && !self.profile.department.is_empty()
            && !self.profile.phone.is_empty()
    }

    pub(crate) fn into_profile(self) -> RespondentProfile {
        self.profile
    }
}

fn fill(slot: &mut String, value: Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value {
            *slot = value;
        }
    }
}
