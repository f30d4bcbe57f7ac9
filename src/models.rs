use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seeker,
    Recruiter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Seeker => write!(f, "seeker"),
            Role::Recruiter => write!(f, "recruiter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    /// Plaintext written by the legacy variant; cleared once upgraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

impl User {
    pub fn role(&self) -> Role {
        match self.profile {
            Profile::Seeker(_) => Role::Seeker,
            Profile::Recruiter(_) => Role::Recruiter,
        }
    }

    pub fn phone(&self) -> &str {
        match &self.profile {
            Profile::Seeker(p) => &p.phone,
            Profile::Recruiter(p) => &p.phone,
        }
    }

    pub fn set_phone(&mut self, phone: String) {
        match &mut self.profile {
            Profile::Seeker(p) => p.phone = phone,
            Profile::Recruiter(p) => p.phone = phone,
        }
    }

    pub fn seeker(&self) -> Option<&SeekerProfile> {
        match &self.profile {
            Profile::Seeker(p) => Some(p),
            Profile::Recruiter(_) => None,
        }
    }

    pub fn seeker_mut(&mut self) -> Option<&mut SeekerProfile> {
        match &mut self.profile {
            Profile::Seeker(p) => Some(p),
            Profile::Recruiter(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Seeker(SeekerProfile),
    Recruiter(RecruiterProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeekerProfile {
    pub phone: String,
    pub bio: String,
    pub address: String,
    pub skills: String,
    pub resume: String,
    pub alerts: bool,
    pub saved_searches: Vec<String>,
}

impl Default for SeekerProfile {
    fn default() -> Self {
        Self {
            phone: String::new(),
            bio: String::new(),
            address: String::new(),
            skills: String::new(),
            resume: NO_RESUME.to_string(),
            alerts: true,
            saved_searches: Vec::new(),
        }
    }
}

pub const NO_RESUME: &str = "Not uploaded";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecruiterProfile {
    pub company: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub role: Role,
    pub sid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub skills: Vec<String>,
    pub exp: String,
    pub tag: String,
}

/// A job posted by a recruiter from the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedJob {
    pub id: String,
    pub title: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub applicants: u32,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Submitted,
    #[serde(rename = "Under Review")]
    UnderReview,
    Shortlisted,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub title: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applied_at: DateTime<Utc>,
    pub resume: String,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub text: String,
    pub href: String,
    pub read: bool,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub text: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub openings: u32,
    pub rating: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTicket {
    pub code: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
