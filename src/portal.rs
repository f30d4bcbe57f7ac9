use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::credential;
use crate::error::{PortalError, Result};
use crate::identity::{normalize_email, IdentityStore};
use crate::models::{
    Application, ApplicationStatus, Job, PostedJob, Profile, RecruiterProfile, ResetTicket, Role,
    SeekerProfile, Session, User, NO_RESUME,
};
use crate::records::Records;
use crate::reset::{ResetFlow, ResetState};
use crate::seed;
use crate::session::{random_token, SessionManager};
use crate::store::Store;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, Default)]
pub struct SeekerSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub bio: String,
    pub address: String,
    pub skills: String,
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecruiterSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: String,
    pub phone: String,
}

/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub resume: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeekerDashboard {
    pub name: String,
    pub applications: usize,
    pub saved_jobs: Vec<Job>,
    pub completion: u8,
    pub inbox: usize,
    pub recent: Vec<Application>,
    pub saved_searches: Vec<String>,
    pub alerts: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecruiterDashboard {
    pub name: String,
    pub company: String,
    pub posts: Vec<PostedJob>,
    pub total_applicants: usize,
    pub latest: Vec<Application>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Seeker(SeekerDashboard),
    Recruiter(RecruiterDashboard),
}

const RECENT_LIMIT: usize = 5;

/// Application context: owns the store and hands out the identity, session,
/// reset and record views over it. Every user action is one method here.
pub struct Portal {
    store: Store,
    reset_ttl: Duration,
}

impl Portal {
    pub fn new(store: Store, reset_ttl: Duration) -> Self {
        Self { store, reset_ttl }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn identities(&self) -> IdentityStore<'_> {
        IdentityStore::new(&self.store)
    }

    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(&self.store)
    }

    pub fn records(&self) -> Records<'_> {
        Records::new(&self.store)
    }

    fn resets(&self) -> ResetFlow<'_> {
        ResetFlow::new(&self.store, self.reset_ttl)
    }

    pub fn seed(&self, now: DateTime<Utc>) -> Result<bool> {
        seed::seed_demo(&self.store, now)
    }

    // --- Signup / login ---

    pub fn signup_seeker(&self, form: SeekerSignup) -> Result<User> {
        let (name, email) = validate_signup(&form.name, &form.email, &form.password)?;
        let user = User {
            name,
            email,
            password_hash: credential::hash(&form.password),
            password: None,
            profile: Profile::Seeker(SeekerProfile {
                phone: form.phone.trim().to_string(),
                bio: form.bio.trim().to_string(),
                address: form.address.trim().to_string(),
                skills: form.skills.trim().to_string(),
                resume: form
                    .resume
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| NO_RESUME.to_string()),
                alerts: true,
                saved_searches: Vec::new(),
            }),
        };
        self.identities().upsert(&user)?;
        info!(email = %user.email, "seeker account created");
        Ok(user)
    }

    pub fn signup_recruiter(&self, form: RecruiterSignup) -> Result<User> {
        let (name, email) = validate_signup(&form.name, &form.email, &form.password)?;
        if form.company.trim().is_empty() {
            return Err(PortalError::Validation("Company is required".to_string()));
        }
        let user = User {
            name,
            email,
            password_hash: credential::hash(&form.password),
            password: None,
            profile: Profile::Recruiter(RecruiterProfile {
                company: form.company.trim().to_string(),
                phone: form.phone.trim().to_string(),
            }),
        };
        self.identities().upsert(&user)?;
        info!(email = %user.email, "recruiter account created");
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let identities = self.identities();
        let Some(mut user) = identities.get(email)? else {
            warn!(email = %normalize_email(email), "login for unknown account");
            return Err(PortalError::InvalidCredentials);
        };

        if !user.password_hash.is_empty() {
            if !credential::verify(password, &user.password_hash) {
                warn!(email = %user.email, "login with wrong password");
                return Err(PortalError::InvalidCredentials);
            }
        } else {
            match user.password.as_deref() {
                Some(plain) if credential::verify_legacy(password, plain) => {
                    user.password_hash = credential::hash(password);
                    user.password = None;
                    identities.upsert(&user)?;
                    info!(email = %user.email, "legacy password upgraded to digest");
                }
                _ => {
                    warn!(email = %user.email, "login with wrong password");
                    return Err(PortalError::InvalidCredentials);
                }
            }
        }

        let session = self.sessions().start(&user.email, user.role())?;
        info!(email = %session.email, role = %session.role, "logged in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        self.sessions().end()?;
        info!("logged out");
        Ok(())
    }

    pub fn whoami(&self) -> Result<Option<(Session, Option<User>)>> {
        let Some(session) = self.sessions().current()? else {
            return Ok(None);
        };
        let user = self.identities().get(&session.email)?;
        Ok(Some((session, user)))
    }

    // --- Password reset ---

    pub fn forgot_password(&self, email: &str, now: DateTime<Utc>) -> Result<ResetTicket> {
        self.resets().issue(email, now)
    }

    pub fn reset_state(&self, now: DateTime<Utc>) -> Result<ResetState> {
        self.resets().state(now)
    }

    pub fn reset_password(&self, code: &str, new_password: &str, now: DateTime<Utc>) -> Result<String> {
        require_password(new_password)?;
        self.resets().redeem(code, new_password, now)
    }

    // --- Jobs ---

    /// Appends an application. Applying twice to the same job is allowed.
    pub fn apply(&self, job_id: &str, now: DateTime<Utc>) -> Result<Application> {
        let user = self.require(Some(Role::Seeker))?;
        let records = self.records();
        let job = records
            .job(job_id)?
            .ok_or_else(|| PortalError::NotFound(format!("Job {job_id}")))?;
        let resume = user
            .seeker()
            .map(|p| p.resume.clone())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| NO_RESUME.to_string());

        let app = Application {
            id: random_token(),
            job_id: job.id.clone(),
            title: job.title.clone(),
            applicant_name: user.name.clone(),
            applicant_email: user.email.clone(),
            applied_at: now,
            resume,
            status: ApplicationStatus::Submitted,
        };
        records.append_application(app.clone())?;
        records.push_notification(&format!("Applied to {}", job.title), "dashboard.html", now)?;
        info!(email = %user.email, job = %job.id, "applied");
        Ok(app)
    }

    pub fn toggle_saved(&self, job_id: &str) -> Result<bool> {
        self.require(Some(Role::Seeker))?;
        let records = self.records();
        let job = records
            .job(job_id)?
            .ok_or_else(|| PortalError::NotFound(format!("Job {job_id}")))?;
        records.toggle_saved(&job.id)
    }

    pub fn my_applications(&self) -> Result<Vec<Application>> {
        let user = self.require(Some(Role::Seeker))?;
        self.records().applications_for(&user.email)
    }

    // --- Recruiter actions ---

    pub fn applicants(&self) -> Result<Vec<Application>> {
        self.require(Some(Role::Recruiter))?;
        self.records().applications()
    }

    pub fn shortlist(&self, application_id: &str, now: DateTime<Utc>) -> Result<Application> {
        self.require(Some(Role::Recruiter))?;
        let records = self.records();
        let app = records.set_application_status(application_id, ApplicationStatus::Shortlisted)?;
        records.push_notification("You shortlisted a candidate", "applicants.html", now)?;
        Ok(app)
    }

    pub fn reject(&self, application_id: &str) -> Result<Application> {
        self.require(Some(Role::Recruiter))?;
        self.records()
            .set_application_status(application_id, ApplicationStatus::Rejected)
    }

    pub fn post_job(
        &self,
        title: &str,
        location: &str,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<PostedJob> {
        self.require(Some(Role::Recruiter))?;
        let title = title.trim();
        if title.is_empty() {
            return Err(PortalError::Validation("Job title is required".to_string()));
        }
        let posting = PostedJob {
            id: random_token(),
            title: title.to_string(),
            location: non_empty_or(location, "Remote"),
            kind: non_empty_or(kind, "Full-time"),
            applicants: 0,
            status: "Open".to_string(),
        };
        let records = self.records();
        records.append_posted_job(posting.clone())?;
        records.push_notification(&format!("Job posted: {}", posting.title), "dashboard.html", now)?;
        info!(title = %posting.title, "job posted");
        Ok(posting)
    }

    pub fn my_postings(&self) -> Result<Vec<PostedJob>> {
        self.require(Some(Role::Recruiter))?;
        self.records().posted_jobs()
    }

    // --- Dashboard ---

    pub fn dashboard(&self) -> Result<Dashboard> {
        let user = self.require(None)?;
        let records = self.records();
        match &user.profile {
            Profile::Seeker(profile) => {
                let apps = records.applications_for(&user.email)?;
                Ok(Dashboard::Seeker(SeekerDashboard {
                    name: user.name.clone(),
                    applications: apps.len(),
                    saved_jobs: records.saved_jobs()?,
                    completion: profile_completion(&user),
                    inbox: records.messages()?.len(),
                    recent: latest(apps),
                    saved_searches: profile.saved_searches.clone(),
                    alerts: profile.alerts,
                }))
            }
            Profile::Recruiter(profile) => {
                let apps = records.applications()?;
                Ok(Dashboard::Recruiter(RecruiterDashboard {
                    name: user.name.clone(),
                    company: profile.company.clone(),
                    posts: records.posted_jobs()?,
                    total_applicants: apps.len(),
                    latest: latest(apps),
                }))
            }
        }
    }

    // --- Profile & settings ---

    pub fn profile(&self) -> Result<User> {
        self.require(None)
    }

    pub fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let mut user = self.require(None)?;
        let old_email = user.email.clone();

        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            user.email = normalize_email(&email);
        }
        if let Some(phone) = update.phone {
            user.set_phone(phone.trim().to_string());
        }
        if let Some(profile) = user.seeker_mut() {
            if let Some(address) = update.address {
                profile.address = address.trim().to_string();
            }
            if let Some(skills) = update.skills {
                profile.skills = skills.trim().to_string();
            }
            if let Some(bio) = update.bio {
                profile.bio = bio.trim().to_string();
            }
            if let Some(resume) = update.resume.filter(|r| !r.trim().is_empty()) {
                profile.resume = resume.trim().to_string();
            }
        }

        self.save_self(&old_email, &user)?;
        Ok(user)
    }

    pub fn update_account(&self, name: &str, email: &str, phone: Option<&str>) -> Result<User> {
        self.update_profile(ProfileUpdate {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: phone.map(str::to_string),
            ..Default::default()
        })
    }

    pub fn update_address(&self, address: &str) -> Result<User> {
        self.update_seeker(|p| p.address = address.trim().to_string())
    }

    pub fn update_skills(&self, skills: &str) -> Result<User> {
        self.update_seeker(|p| p.skills = skills.trim().to_string())
    }

    /// Returns the new alerts setting.
    pub fn toggle_alerts(&self) -> Result<bool> {
        let user = self.update_seeker(|p| p.alerts = !p.alerts)?;
        Ok(user.seeker().map(|p| p.alerts).unwrap_or_default())
    }

    /// Returns false when the query was already saved.
    pub fn save_search(&self, query: &str) -> Result<bool> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(PortalError::Validation("Search query is empty".to_string()));
        }
        let mut added = false;
        self.update_seeker(|p| {
            if !p.saved_searches.contains(&query) {
                p.saved_searches.push(query.clone());
                added = true;
            }
        })?;
        Ok(added)
    }

    pub fn change_password(&self, current: &str, new_password: &str) -> Result<()> {
        let mut user = self.require(None)?;
        let matches = if user.password_hash.is_empty() {
            user.password
                .as_deref()
                .is_some_and(|plain| credential::verify_legacy(current, plain))
        } else {
            credential::verify(current, &user.password_hash)
        };
        if !matches {
            warn!(email = %user.email, "password change with wrong current password");
            return Err(PortalError::CredentialMismatch);
        }
        require_password(new_password)?;
        user.password_hash = credential::hash(new_password);
        user.password = None;
        self.save_self(&user.email.clone(), &user)?;
        info!(email = %user.email, "password changed");
        Ok(())
    }

    /// Removes the account record and ends the session. The email stays in
    /// the secondary index.
    pub fn delete_account(&self) -> Result<String> {
        let session = self.sessions().current()?.ok_or(PortalError::NotLoggedIn)?;
        self.identities().remove(&session.email)?;
        self.sessions().end()?;
        info!(email = %session.email, "account deleted");
        Ok(session.email)
    }

    // --- Helpers ---

    fn require(&self, role: Option<Role>) -> Result<User> {
        let session = self.sessions().current()?.ok_or(PortalError::NotLoggedIn)?;
        if let Some(needed) = role {
            if session.role != needed {
                return Err(PortalError::WrongRole { needed });
            }
        }
        self.identities()
            .get(&session.email)?
            .ok_or_else(|| PortalError::NotFound(format!("Account {}", session.email)))
    }

    fn update_seeker(&self, f: impl FnOnce(&mut SeekerProfile)) -> Result<User> {
        let mut user = self.require(Some(Role::Seeker))?;
        // the session role can be stale if the record was replaced since login
        let profile = user.seeker_mut().ok_or(PortalError::WrongRole {
            needed: Role::Seeker,
        })?;
        f(profile);
        self.save_self(&user.email.clone(), &user)?;
        Ok(user)
    }

    /// Writes the signed-in user's record, re-keying it when the email
    /// changed, and re-stamps the session.
    fn save_self(&self, old_email: &str, user: &User) -> Result<()> {
        if user.name.is_empty() {
            return Err(PortalError::Validation("Name is required".to_string()));
        }
        let identities = self.identities();
        if user.email != old_email {
            if !EMAIL_RE.is_match(&user.email) {
                return Err(PortalError::Validation(format!("Invalid email '{}'", user.email)));
            }
            if identities.get(&user.email)?.is_some() {
                return Err(PortalError::Validation(format!(
                    "Email {} already belongs to another account",
                    user.email
                )));
            }
        }
        identities.upsert(user)?;
        if user.email != old_email {
            identities.remove(old_email)?;
        }
        self.sessions().start(&user.email, user.role())?;
        Ok(())
    }
}

fn validate_signup(name: &str, email: &str, password: &str) -> Result<(String, String)> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(PortalError::Validation("Name is required".to_string()));
    }
    let email = normalize_email(email);
    if !EMAIL_RE.is_match(&email) {
        return Err(PortalError::Validation(format!("Invalid email '{email}'")));
    }
    require_password(password)?;
    Ok((name, email))
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(PortalError::Validation("Password is required".to_string()));
    }
    Ok(())
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Last few entries, newest first.
fn latest(apps: Vec<Application>) -> Vec<Application> {
    apps.into_iter().rev().take(RECENT_LIMIT).collect()
}

/// Percentage of name, email, phone, skills and resume that are filled in.
pub fn profile_completion(user: &User) -> u8 {
    let (skills, resume) = user
        .seeker()
        .map(|p| (p.skills.as_str(), p.resume.as_str()))
        .unwrap_or(("", ""));
    let filled = [user.name.as_str(), user.email.as_str(), user.phone(), skills, resume]
        .iter()
        .filter(|v| !v.is_empty())
        .count();
    (filled * 100 / 5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 27, 10, 0, 0).unwrap()
    }

    fn portal() -> Portal {
        let portal = Portal::new(Store::open_in_memory().unwrap(), Duration::minutes(5));
        portal.seed(t0()).unwrap();
        portal
    }

    fn as_seeker() -> Portal {
        let portal = portal();
        portal.login("rohit@demo.com", seed::DEMO_PASSWORD).unwrap();
        portal
    }

    fn as_recruiter() -> Portal {
        let portal = portal();
        portal.login("Anita.HR@confirm.com ", seed::DEMO_PASSWORD).unwrap();
        portal
    }

    #[test]
    fn test_signup_then_login() {
        let portal = portal();
        let user = portal
            .signup_seeker(SeekerSignup {
                name: " Meera ".to_string(),
                email: " Meera@Example.com".to_string(),
                password: "s3cret".to_string(),
                skills: "Rust".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(user.name, "Meera");
        assert_eq!(user.email, "meera@example.com");
        assert_eq!(user.seeker().unwrap().resume, NO_RESUME);
        assert!(portal.identities().index_contains("meera@example.com").unwrap());

        let session = portal.login("MEERA@example.com", "s3cret").unwrap();
        assert_eq!(session.role, Role::Seeker);
        assert_eq!(portal.sessions().current().unwrap(), Some(session));
    }

    #[test]
    fn test_signup_validation() {
        let portal = portal();
        let bad_email = portal.signup_seeker(SeekerSignup {
            name: "X".to_string(),
            email: "not-an-email".to_string(),
            password: "p".to_string(),
            ..Default::default()
        });
        assert!(matches!(bad_email, Err(PortalError::Validation(_))));

        let no_company = portal.signup_recruiter(RecruiterSignup {
            name: "R".to_string(),
            email: "r@co.com".to_string(),
            password: "p".to_string(),
            ..Default::default()
        });
        assert!(matches!(no_company, Err(PortalError::Validation(_))));
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let portal = portal();
        assert!(matches!(
            portal.login("rohit@demo.com", "wrong"),
            Err(PortalError::InvalidCredentials)
        ));
        assert!(matches!(
            portal.login("ghost@demo.com", "123456"),
            Err(PortalError::InvalidCredentials)
        ));
        assert!(portal.sessions().current().unwrap().is_none());
    }

    #[test]
    fn test_legacy_login_upgrades_record() {
        let portal = portal();
        portal
            .store()
            .set_raw(
                "cn-user-old@demo.com",
                r#"{"role":"seeker","name":"Old","email":"old@demo.com","password":"plain"}"#,
            )
            .unwrap();
        assert!(portal.login("old@demo.com", "wrong").is_err());
        portal.login("old@demo.com", "plain").unwrap();

        let user = portal.identities().get("old@demo.com").unwrap().unwrap();
        assert!(user.password.is_none());
        assert!(credential::verify("plain", &user.password_hash));
        assert!(portal.store().get_raw("cn-user-old@demo.com").unwrap().unwrap().contains("passwordHash"));
    }

    #[test]
    fn test_logout_ends_session() {
        let portal = as_seeker();
        portal.logout().unwrap();
        assert!(portal.whoami().unwrap().is_none());
        assert!(matches!(portal.dashboard(), Err(PortalError::NotLoggedIn)));
    }

    #[test]
    fn test_apply_twice_keeps_both_entries() {
        let portal = as_seeker();
        let before = portal.records().applications().unwrap().len();
        let first = portal.apply("J101", t0()).unwrap();
        let second = portal.apply("J101", t0()).unwrap();
        assert_ne!(first.id, second.id);

        let apps = portal.records().applications().unwrap();
        assert_eq!(apps.len(), before + 2);
        let to_j101 = portal
            .my_applications()
            .unwrap()
            .into_iter()
            .filter(|a| a.job_id == "J101")
            .count();
        // one seeded, two new
        assert_eq!(to_j101, 3);
        assert_eq!(first.resume, "Rohit_Verma_Resume.pdf");
        assert_eq!(first.status, ApplicationStatus::Submitted);

        let texts: Vec<_> = portal
            .records()
            .notifications()
            .unwrap()
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texts.iter().filter(|t| *t == "Applied to Frontend Developer").count(), 2);
    }

    #[test]
    fn test_apply_requires_seeker_and_known_job() {
        let portal = portal();
        assert!(matches!(portal.apply("J101", t0()), Err(PortalError::NotLoggedIn)));

        let portal = as_recruiter();
        assert!(matches!(
            portal.apply("J101", t0()),
            Err(PortalError::WrongRole { needed: Role::Seeker })
        ));

        let portal = as_seeker();
        assert!(matches!(portal.apply("J999", t0()), Err(PortalError::NotFound(_))));
    }

    #[test]
    fn test_toggle_saved_is_global() {
        let portal = as_seeker();
        assert!(portal.toggle_saved("J101").unwrap());
        portal.logout().unwrap();

        portal
            .signup_seeker(SeekerSignup {
                name: "Other".to_string(),
                email: "other@demo.com".to_string(),
                password: "pw".to_string(),
                ..Default::default()
            })
            .unwrap();
        portal.login("other@demo.com", "pw").unwrap();
        let Dashboard::Seeker(dash) = portal.dashboard().unwrap() else {
            panic!("expected seeker dashboard");
        };
        let saved: Vec<_> = dash.saved_jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(saved, vec!["J101", "J104"]);
    }

    #[test]
    fn test_recruiter_shortlist_reject_and_post() {
        let portal = as_recruiter();
        let apps = portal.applicants().unwrap();
        assert_eq!(apps.len(), 4);
        assert!(apps.iter().any(|a| a.id == "DX2" && a.applicant_name == "Neha Rao"));

        let shortlisted = portal.shortlist(&apps[0].id, t0()).unwrap();
        assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);
        let rejected = portal.reject(&apps[1].id).unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert!(matches!(portal.reject("nope"), Err(PortalError::NotFound(_))));
        assert_eq!(portal.reject("DX1").unwrap().applicant_name, "Amit Singh");

        let posting = portal.post_job(" Rust Engineer ", "", "Contract", t0()).unwrap();
        assert_eq!(posting.title, "Rust Engineer");
        assert_eq!(posting.location, "Remote");
        assert_eq!(portal.my_postings().unwrap().len(), 3);
        assert!(matches!(
            portal.post_job("  ", "x", "y", t0()),
            Err(PortalError::Validation(_))
        ));

        let texts: Vec<_> = portal
            .records()
            .notifications()
            .unwrap()
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert!(texts.contains(&"You shortlisted a candidate".to_string()));
        assert!(texts.contains(&"Job posted: Rust Engineer".to_string()));
    }

    #[test]
    fn test_seeker_dashboard() {
        let portal = as_seeker();
        let Dashboard::Seeker(dash) = portal.dashboard().unwrap() else {
            panic!("expected seeker dashboard");
        };
        assert_eq!(dash.name, "Rohit Verma");
        assert_eq!(dash.applications, 1);
        assert_eq!(dash.saved_jobs.len(), 1);
        assert_eq!(dash.completion, 100);
        assert_eq!(dash.inbox, 3);
        assert_eq!(dash.saved_searches, vec!["react remote", "frontend fresher"]);
        assert!(dash.alerts);
    }

    #[test]
    fn test_recruiter_dashboard_latest_first() {
        let portal = as_seeker();
        for _ in 0..6 {
            portal.apply("J105", t0()).unwrap();
        }
        portal.apply("J102", t0()).unwrap();
        portal.logout().unwrap();
        portal.login("anita.hr@confirm.com", seed::DEMO_PASSWORD).unwrap();

        let Dashboard::Recruiter(dash) = portal.dashboard().unwrap() else {
            panic!("expected recruiter dashboard");
        };
        assert_eq!(dash.company, "ConfirmNokri HR");
        assert_eq!(dash.total_applicants, 11);
        assert_eq!(dash.latest.len(), RECENT_LIMIT);
        assert_eq!(dash.latest[0].job_id, "J102");
        assert_eq!(dash.posts.len(), 2);
    }

    #[test]
    fn test_profile_completion() {
        let mut user = User {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password_hash: String::new(),
            password: None,
            profile: Profile::Seeker(SeekerProfile {
                resume: String::new(),
                ..Default::default()
            }),
        };
        assert_eq!(profile_completion(&user), 40);
        user.set_phone("1".to_string());
        assert_eq!(profile_completion(&user), 60);
    }

    #[test]
    fn test_update_profile_rekeys_on_email_change() {
        let portal = as_seeker();
        let user = portal
            .update_profile(ProfileUpdate {
                email: Some(" Rohit.V@Demo.com ".to_string()),
                bio: Some("Now writing Rust".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(user.email, "rohit.v@demo.com");
        assert!(portal.identities().get("rohit@demo.com").unwrap().is_none());
        assert_eq!(
            portal.identities().get("rohit.v@demo.com").unwrap().unwrap().seeker().unwrap().bio,
            "Now writing Rust"
        );
        assert_eq!(portal.sessions().current().unwrap().unwrap().email, "rohit.v@demo.com");
        // old email stays indexed
        assert!(portal.identities().index_contains("rohit@demo.com").unwrap());
    }

    #[test]
    fn test_update_account_refuses_taken_email() {
        let portal = as_seeker();
        let err = portal
            .update_account("Rohit", "anita.hr@confirm.com", None)
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
        assert!(portal.identities().get("rohit@demo.com").unwrap().is_some());
    }

    #[test]
    fn test_seeker_settings() {
        let portal = as_seeker();
        assert!(!portal.toggle_alerts().unwrap());
        assert!(portal.toggle_alerts().unwrap());

        assert!(portal.save_search("rust remote").unwrap());
        assert!(!portal.save_search(" rust remote ").unwrap());
        assert!(portal.save_search("").is_err());

        portal.update_address("Pune, MH").unwrap();
        portal.update_skills("Rust, SQL").unwrap();
        let user = portal.profile().unwrap();
        let profile = user.seeker().unwrap();
        assert_eq!(profile.address, "Pune, MH");
        assert_eq!(profile.skills, "Rust, SQL");
        assert_eq!(profile.saved_searches.len(), 3);

        let portal = as_recruiter();
        assert!(matches!(portal.toggle_alerts(), Err(PortalError::WrongRole { .. })));
    }

    #[test]
    fn test_seeker_settings_on_replaced_record() {
        let portal = as_seeker();
        portal
            .signup_recruiter(RecruiterSignup {
                name: "Rohit Verma".to_string(),
                email: "rohit@demo.com".to_string(),
                password: "123456".to_string(),
                company: "Verma Labs".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(matches!(
            portal.toggle_alerts(),
            Err(PortalError::WrongRole { needed: Role::Seeker })
        ));
        assert!(matches!(
            portal.save_search("rust remote"),
            Err(PortalError::WrongRole { .. })
        ));
        let user = portal.identities().get("rohit@demo.com").unwrap().unwrap();
        assert_eq!(user.role(), Role::Recruiter);
    }

    #[test]
    fn test_change_password() {
        let portal = as_seeker();
        assert!(matches!(
            portal.change_password("wrong", "new"),
            Err(PortalError::CredentialMismatch)
        ));
        portal.change_password(seed::DEMO_PASSWORD, "new-pass").unwrap();
        portal.logout().unwrap();
        assert!(portal.login("rohit@demo.com", seed::DEMO_PASSWORD).is_err());
        portal.login("rohit@demo.com", "new-pass").unwrap();
    }

    #[test]
    fn test_delete_account_keeps_index() {
        let portal = as_seeker();
        assert_eq!(portal.delete_account().unwrap(), "rohit@demo.com");
        assert!(portal.sessions().current().unwrap().is_none());
        assert!(portal.identities().get("rohit@demo.com").unwrap().is_none());
        assert!(portal.identities().index_contains("rohit@demo.com").unwrap());
        assert!(matches!(portal.delete_account(), Err(PortalError::NotLoggedIn)));
    }

    #[test]
    fn test_forgot_and_reset_password() {
        let portal = portal();
        assert!(matches!(
            portal.forgot_password("nobody@demo.com", t0()),
            Err(PortalError::NotFound(_))
        ));
        let ticket = portal.forgot_password("rohit@demo.com", t0()).unwrap();
        assert!(portal.reset_password(&ticket.code, "", t0()).is_err());
        portal
            .reset_password(&ticket.code, "fresh", t0() + Duration::minutes(4))
            .unwrap();
        assert!(matches!(
            portal.reset_password(&ticket.code, "again", t0() + Duration::seconds(270)),
            Err(PortalError::NoPendingReset)
        ));
        portal.login("rohit@demo.com", "fresh").unwrap();
    }

    #[test]
    fn test_session_for_deleted_record() {
        let portal = as_seeker();
        portal.identities().remove("rohit@demo.com").unwrap();
        assert!(matches!(portal.dashboard(), Err(PortalError::NotFound(_))));
        let (session, user) = portal.whoami().unwrap().unwrap();
        assert_eq!(session.email, "rohit@demo.com");
        assert!(user.is_none());
    }
}
