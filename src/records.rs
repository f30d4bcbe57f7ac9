use chrono::{DateTime, Utc};

use crate::error::{PortalError, Result};
use crate::identity::normalize_email;
use crate::models::{
    Application, ApplicationStatus, Company, Job, Message, Notification, PostedJob,
};
use crate::session::random_token;
use crate::store::{keys, Store};

/// Flat collections, one JSON blob per key. Mutations go through
/// `Store::update` so each one is a single transaction.
pub struct Records<'a> {
    store: &'a Store,
}

impl<'a> Records<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // --- Jobs ---

    pub fn jobs(&self) -> Result<Vec<Job>> {
        self.store.get_or(keys::JOBS, Vec::new())
    }

    pub fn job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.jobs()?.into_iter().find(|j| j.id.eq_ignore_ascii_case(id.trim())))
    }

    /// Case-insensitive substring match over everything a job card shows.
    pub fn search_jobs(&self, query: &str) -> Result<Vec<Job>> {
        let q = query.trim().to_lowercase();
        let jobs = self.jobs()?;
        if q.is_empty() {
            return Ok(jobs);
        }
        Ok(jobs.into_iter().filter(|j| job_text(j).contains(&q)).collect())
    }

    // --- Saved jobs (one list for the whole store) ---

    pub fn saved_ids(&self) -> Result<Vec<String>> {
        self.store.get_or(keys::SAVED, Vec::new())
    }

    pub fn saved_jobs(&self) -> Result<Vec<Job>> {
        let saved = self.saved_ids()?;
        Ok(self
            .jobs()?
            .into_iter()
            .filter(|j| saved.contains(&j.id))
            .collect())
    }

    /// Returns true when the job is saved after the toggle.
    pub fn toggle_saved(&self, job_id: &str) -> Result<bool> {
        let job_id = job_id.to_string();
        self.store.update(keys::SAVED, Vec::<String>::new(), |saved| {
            if let Some(pos) = saved.iter().position(|id| *id == job_id) {
                saved.remove(pos);
                Ok(false)
            } else {
                saved.push(job_id);
                Ok(true)
            }
        })
    }

    // --- Applications ---

    pub fn applications(&self) -> Result<Vec<Application>> {
        self.store.get_or(keys::APPS, Vec::new())
    }

    pub fn applications_for(&self, email: &str) -> Result<Vec<Application>> {
        let email = normalize_email(email);
        Ok(self
            .applications()?
            .into_iter()
            .filter(|a| normalize_email(&a.applicant_email) == email)
            .collect())
    }

    pub fn append_application(&self, app: Application) -> Result<()> {
        self.store.update(keys::APPS, Vec::<Application>::new(), |apps| {
            apps.push(app);
            Ok(())
        })
    }

    pub fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<Application> {
        self.store.update(keys::APPS, Vec::<Application>::new(), |apps| {
            let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
            let idx = match_id(&ids, id, "Application")?
                .ok_or_else(|| PortalError::NotFound(format!("Application {id}")))?;
            let app = &mut apps[idx];
            app.status = status;
            Ok(app.clone())
        })
    }

    // --- Recruiter postings ---

    pub fn posted_jobs(&self) -> Result<Vec<PostedJob>> {
        self.store.get_or(keys::JOBS_MINE, Vec::new())
    }

    pub fn append_posted_job(&self, job: PostedJob) -> Result<()> {
        self.store.update(keys::JOBS_MINE, Vec::<PostedJob>::new(), |jobs| {
            jobs.push(job);
            Ok(())
        })
    }

    // --- Notifications ---

    /// Newest first.
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        let mut list: Vec<Notification> = self.store.get_or(keys::NOTIF, Vec::new())?;
        list.sort_by(|a, b| b.ts.cmp(&a.ts));
        Ok(list)
    }

    pub fn push_notification(
        &self,
        text: &str,
        href: &str,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        let notification = Notification {
            id: random_token(),
            text: text.to_string(),
            href: href.to_string(),
            read: false,
            ts: now,
        };
        let stored = notification.clone();
        self.store.update(keys::NOTIF, Vec::<Notification>::new(), |list| {
            list.push(stored);
            Ok(())
        })?;
        Ok(notification)
    }

    /// Marks one notification read; `None` when the id is unknown.
    pub fn mark_read(&self, id: &str) -> Result<Option<Notification>> {
        self.store.update(keys::NOTIF, Vec::<Notification>::new(), |list| {
            let ids: Vec<&str> = list.iter().map(|n| n.id.as_str()).collect();
            Ok(match_id(&ids, id, "Notification")?.map(|idx| {
                let n = &mut list[idx];
                n.read = true;
                n.clone()
            }))
        })
    }

    pub fn mark_all_read(&self) -> Result<usize> {
        self.store.update(keys::NOTIF, Vec::<Notification>::new(), |list| {
            let mut changed = 0;
            for n in list.iter_mut().filter(|n| !n.read) {
                n.read = true;
                changed += 1;
            }
            Ok(changed)
        })
    }

    pub fn clear_notifications(&self) -> Result<()> {
        self.store.set(keys::NOTIF, &Vec::<Notification>::new())
    }

    pub fn has_unread(&self) -> Result<bool> {
        Ok(self.notifications()?.iter().any(|n| !n.read))
    }

    // --- Demo content ---

    pub fn messages(&self) -> Result<Vec<Message>> {
        self.store.get_or(keys::MSGS, Vec::new())
    }

    pub fn companies(&self) -> Result<Vec<Company>> {
        self.store.get_or(keys::COMP, Vec::new())
    }
}

fn job_text(job: &Job) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        job.title,
        job.company,
        job.location,
        job.kind,
        job.tag,
        job.skills.join(", "),
        job.exp
    )
    .to_lowercase()
}

/// Index of the exact id, or of the only id starting with `id`.
fn match_id(ids: &[&str], id: &str, what: &str) -> Result<Option<usize>> {
    let id = id.trim();
    if id.is_empty() {
        return Ok(None);
    }
    if let Some(idx) = ids.iter().position(|candidate| *candidate == id) {
        return Ok(Some(idx));
    }
    let mut hits = ids
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.starts_with(id))
        .map(|(idx, _)| idx);
    match (hits.next(), hits.next()) {
        (Some(idx), None) => Ok(Some(idx)),
        (None, _) => Ok(None),
        (Some(_), Some(_)) => Err(PortalError::Validation(format!(
            "{what} id '{id}' matches more than one entry"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn job(id: &str, title: &str, skills: &[&str]) -> Job {
        Job {
            id: id.to_string(),
            title: title.to_string(),
            company: "TechSoft Pvt Ltd".to_string(),
            location: "Remote".to_string(),
            kind: "Full-time".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            exp: "1–3 yrs".to_string(),
            tag: "Hot".to_string(),
        }
    }

    fn app(id: &str, email: &str) -> Application {
        Application {
            id: id.to_string(),
            job_id: "J101".to_string(),
            title: "Frontend Developer".to_string(),
            applicant_name: "Rohit Verma".to_string(),
            applicant_email: email.to_string(),
            applied_at: Utc.with_ymd_and_hms(2025, 8, 27, 10, 0, 0).unwrap(),
            resume: "Rohit_Verma_Resume.pdf".to_string(),
            status: ApplicationStatus::Submitted,
        }
    }

    fn with_jobs() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .set(
                keys::JOBS,
                &vec![
                    job("J101", "Frontend Developer", &["React", "JS"]),
                    job("J103", "Backend Engineer", &["Node", "MongoDB"]),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_empty_store_has_empty_collections() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        assert!(records.jobs().unwrap().is_empty());
        assert!(records.applications().unwrap().is_empty());
        assert!(records.notifications().unwrap().is_empty());
        assert!(!records.has_unread().unwrap());
    }

    #[test]
    fn test_job_lookup_and_search() {
        let store = with_jobs();
        let records = Records::new(&store);
        assert_eq!(records.job("j103").unwrap().unwrap().title, "Backend Engineer");
        assert!(records.job("J999").unwrap().is_none());

        let hits = records.search_jobs("mongo").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "J103");
        assert_eq!(records.search_jobs("REMOTE").unwrap().len(), 2);
        assert_eq!(records.search_jobs("  ").unwrap().len(), 2);
        assert!(records.search_jobs("cobol").unwrap().is_empty());
    }

    #[test]
    fn test_toggle_saved() {
        let store = with_jobs();
        let records = Records::new(&store);
        assert!(records.toggle_saved("J101").unwrap());
        assert_eq!(records.saved_ids().unwrap(), vec!["J101"]);
        assert_eq!(records.saved_jobs().unwrap()[0].id, "J101");
        assert!(!records.toggle_saved("J101").unwrap());
        assert!(records.saved_ids().unwrap().is_empty());
    }

    #[test]
    fn test_applications_append_and_filter() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        records.append_application(app("a1", "rohit@demo.com")).unwrap();
        records.append_application(app("a2", "priya@demo.com")).unwrap();
        records.append_application(app("a3", "Rohit@Demo.com")).unwrap();

        let ids: Vec<_> = records
            .applications()
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);
        assert_eq!(records.applications_for(" ROHIT@demo.com").unwrap().len(), 2);
    }

    #[test]
    fn test_set_application_status() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        records.append_application(app("a1", "rohit@demo.com")).unwrap();

        let updated = records
            .set_application_status("a1", ApplicationStatus::Rejected)
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Rejected);
        assert_eq!(records.applications().unwrap()[0].status, ApplicationStatus::Rejected);

        let err = records
            .set_application_status("zz", ApplicationStatus::Shortlisted)
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }

    #[test]
    fn test_status_by_unique_prefix() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        records.append_application(app("aa6e764a30224b6a", "rohit@demo.com")).unwrap();
        records.append_application(app("aa6e0000ffff0000", "priya@demo.com")).unwrap();
        records.append_application(app("aa6e", "neha@demo.com")).unwrap();

        let updated = records
            .set_application_status("aa6e764a", ApplicationStatus::Shortlisted)
            .unwrap();
        assert_eq!(updated.applicant_email, "rohit@demo.com");

        // an exact id wins over longer ids sharing it as a prefix
        let exact = records
            .set_application_status("aa6e", ApplicationStatus::Rejected)
            .unwrap();
        assert_eq!(exact.applicant_email, "neha@demo.com");

        let err = records
            .set_application_status("aa6", ApplicationStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
        assert!(matches!(
            records.set_application_status(" ", ApplicationStatus::Rejected),
            Err(PortalError::NotFound(_))
        ));
    }

    #[test]
    fn test_notifications_newest_first_and_read_flags() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        let t = Utc.with_ymd_and_hms(2025, 8, 27, 10, 0, 0).unwrap();
        let old = records.push_notification("old", "jobs.html", t).unwrap();
        let new = records
            .push_notification("new", "dashboard.html", t + Duration::minutes(1))
            .unwrap();

        let list = records.notifications().unwrap();
        assert_eq!(list[0].id, new.id);
        assert_eq!(list[1].id, old.id);
        assert!(records.has_unread().unwrap());

        let read = records.mark_read(&old.id).unwrap().unwrap();
        assert!(read.read);
        assert_eq!(read.href, "jobs.html");
        assert!(records.mark_read("missing").unwrap().is_none());

        assert_eq!(records.mark_all_read().unwrap(), 1);
        assert!(!records.has_unread().unwrap());

        records.clear_notifications().unwrap();
        assert!(records.notifications().unwrap().is_empty());
    }

    #[test]
    fn test_posted_jobs_append() {
        let store = Store::open_in_memory().unwrap();
        let records = Records::new(&store);
        records
            .append_posted_job(PostedJob {
                id: "P1".to_string(),
                title: "QA Engineer".to_string(),
                location: "Remote".to_string(),
                kind: "Contract".to_string(),
                applicants: 0,
                status: "Open".to_string(),
            })
            .unwrap();
        assert_eq!(records.posted_jobs().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupted_collection_surfaces_error() {
        let store = Store::open_in_memory().unwrap();
        store.set_raw(keys::APPS, "[{\"id\":").unwrap();
        let records = Records::new(&store);
        assert!(matches!(
            records.applications().unwrap_err(),
            PortalError::Decode { .. }
        ));
        assert!(records.append_application(app("a1", "x@y.z")).is_err());
    }
}
