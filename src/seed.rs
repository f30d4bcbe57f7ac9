use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::credential;
use crate::error::Result;
use crate::identity::IdentityStore;
use crate::models::{
    Application, ApplicationStatus, Company, Job, Message, Notification, PostedJob, Profile,
    RecruiterProfile, SeekerProfile, User,
};
use crate::session::random_token;
use crate::store::{keys, Store};

pub const SEED_VERSION: &str = "4";
pub const DEMO_PASSWORD: &str = "123456";

/// Populates the demo catalog, users and collections unless the seed marker is
/// already present. Returns whether anything was written.
pub fn seed_demo(store: &Store, now: DateTime<Utc>) -> Result<bool> {
    if store.contains(keys::SEED)? {
        return Ok(false);
    }

    let ids = IdentityStore::new(store);
    for user in demo_users() {
        ids.upsert(&user)?;
    }

    store.set(keys::JOBS, &demo_jobs())?;
    store.set(keys::COMP, &demo_companies())?;
    store.set(keys::MSGS, &demo_messages())?;
    store.set(
        keys::APPS,
        &vec![
            Application {
                id: random_token(),
                job_id: "J101".to_string(),
                title: "Frontend Developer".to_string(),
                applicant_name: "Rohit Verma".to_string(),
                applicant_email: "rohit@demo.com".to_string(),
                applied_at: now,
                resume: "Rohit_Verma_Resume.pdf".to_string(),
                status: ApplicationStatus::UnderReview,
            },
            Application {
                id: random_token(),
                job_id: "J103".to_string(),
                title: "Backend Engineer".to_string(),
                applicant_name: "Priya Gupta".to_string(),
                applicant_email: "priya@demo.com".to_string(),
                applied_at: now,
                resume: "Priya_Gupta.pdf".to_string(),
                status: ApplicationStatus::Submitted,
            },
            Application {
                id: "DX1".to_string(),
                job_id: "J104".to_string(),
                title: "Data Analyst".to_string(),
                applicant_name: "Amit Singh".to_string(),
                applicant_email: "amit@demo.com".to_string(),
                applied_at: now - Duration::days(5),
                resume: "Amit_Singh.pdf".to_string(),
                status: ApplicationStatus::Submitted,
            },
            Application {
                id: "DX2".to_string(),
                job_id: "J105".to_string(),
                title: "Product Manager".to_string(),
                applicant_name: "Neha Rao".to_string(),
                applicant_email: "neha@demo.com".to_string(),
                applied_at: now - Duration::days(6),
                resume: "Neha_Rao.pdf".to_string(),
                status: ApplicationStatus::UnderReview,
            },
        ],
    )?;
    store.set(keys::SAVED, &vec!["J104"])?;
    store.set(
        keys::NOTIF,
        &vec![
            notification("Welcome to ConfirmNokri!", "dashboard.html", now),
            notification("3 new jobs match your skills", "jobs.html", now),
        ],
    )?;
    store.set(keys::JOBS_MINE, &demo_postings())?;

    store.set_raw(keys::SEED, "1")?;
    store.set_raw(keys::VERSION, SEED_VERSION)?;
    info!(version = SEED_VERSION, "demo data seeded");
    Ok(true)
}

fn notification(text: &str, href: &str, now: DateTime<Utc>) -> Notification {
    Notification {
        id: random_token(),
        text: text.to_string(),
        href: href.to_string(),
        read: false,
        ts: now,
    }
}

fn demo_users() -> Vec<User> {
    let hash = credential::hash(DEMO_PASSWORD);
    vec![
        User {
            name: "Rohit Verma".to_string(),
            email: "rohit@demo.com".to_string(),
            password_hash: hash.clone(),
            password: None,
            profile: Profile::Seeker(SeekerProfile {
                phone: "+91 98765 12345".to_string(),
                bio: "Frontend dev with 2y experience in React.".to_string(),
                address: "Noida, UP".to_string(),
                skills: "React, JavaScript, CSS, HTML".to_string(),
                resume: "Rohit_Verma_Resume.pdf".to_string(),
                alerts: true,
                saved_searches: vec!["react remote".to_string(), "frontend fresher".to_string()],
            }),
        },
        User {
            name: "Anita Sharma".to_string(),
            email: "anita.hr@confirm.com".to_string(),
            password_hash: hash,
            password: None,
            profile: Profile::Recruiter(RecruiterProfile {
                company: "ConfirmNokri HR".to_string(),
                phone: "+91 98220 00011".to_string(),
            }),
        },
    ]
}

fn demo_jobs() -> Vec<Job> {
    let job = |id: &str, title: &str, company: &str, location: &str, kind: &str, skills: &[&str], exp: &str, tag: &str| Job {
        id: id.to_string(),
        title: title.to_string(),
        company: company.to_string(),
        location: location.to_string(),
        kind: kind.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        exp: exp.to_string(),
        tag: tag.to_string(),
    };
    vec![
        job("J101", "Frontend Developer", "TechSoft Pvt Ltd", "Remote", "Full-time", &["React", "JS", "CSS"], "1–3 yrs", "Hot"),
        job("J102", "HR Recruiter", "ConfirmNokri HR", "Delhi", "Part-time", &["Screening", "Excel"], "0–2 yrs", "New"),
        job("J103", "Backend Engineer", "StartUp Hub", "Bengaluru", "Full-time", &["Node", "MongoDB", "APIs"], "2–4 yrs", "Urgent"),
        job("J104", "Data Analyst", "InsightWorks", "Gurugram", "Full-time", &["SQL", "Excel", "PowerBI"], "1–3 yrs", "Featured"),
        job("J105", "Product Manager", "NovaStack", "Mumbai", "Full-time", &["Roadmaps", "Agile"], "3–6 yrs", "Priority"),
    ]
}

fn demo_companies() -> Vec<Company> {
    [
        ("TechSoft Pvt Ltd", 12, 4.3),
        ("ConfirmNokri HR", 4, 4.1),
        ("StartUp Hub", 7, 4.5),
        ("InsightWorks", 6, 4.2),
    ]
    .into_iter()
    .map(|(name, openings, rating)| Company {
        name: name.to_string(),
        openings,
        rating,
    })
    .collect()
}

fn demo_messages() -> Vec<Message> {
    [
        ("HR @ TechSoft", "Thanks for applying. Can we schedule an interview?", "Today 10:20 AM"),
        ("Recruiter @ StartUp Hub", "Share availability for a quick call.", "Yesterday 6:05 PM"),
        ("Priya (Candidate)", "Looking forward to the interview.", "Aug 20, 4:21 PM"),
    ]
    .into_iter()
    .map(|(from, text, time)| Message {
        from: from.to_string(),
        text: text.to_string(),
        time: time.to_string(),
    })
    .collect()
}

fn demo_postings() -> Vec<PostedJob> {
    vec![
        PostedJob {
            id: "P201".to_string(),
            title: "QA Engineer".to_string(),
            location: "Remote".to_string(),
            kind: "Contract".to_string(),
            applicants: 3,
            status: "Open".to_string(),
        },
        PostedJob {
            id: "P202".to_string(),
            title: "UI/UX Designer".to_string(),
            location: "Mumbai".to_string(),
            kind: "Full-time".to_string(),
            applicants: 5,
            status: "Open".to_string(),
        },
    ]
}
