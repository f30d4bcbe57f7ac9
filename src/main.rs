mod config;
mod credential;
mod error;
mod identity;
mod models;
mod portal;
mod records;
mod reset;
mod seed;
mod session;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::Config;
use models::{Application, Job, User};
use portal::{Dashboard, Portal, ProfileUpdate, RecruiterSignup, SeekerSignup};
use reset::ResetState;
use std::path::PathBuf;
use store::Store;
use tracing_subscriber::EnvFilter;

const SHORT_ID_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "nokri")]
#[command(about = "Local job portal - browse jobs, apply, and manage your account")]
struct Cli {
    /// Path to the store file (overrides NOKRI_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store and load demo data
    Init,

    /// Create an account
    Signup {
        #[command(subcommand)]
        command: SignupCommands,
    },

    /// Log in
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Log out
    Logout,

    /// Show the current session
    Whoami,

    /// Request a password reset code
    Forgot { email: String },

    /// Set a new password with a reset code
    Reset {
        code: String,
        #[arg(short, long)]
        password: String,
    },

    /// Browse, save and apply to jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// List your applications (seekers)
    Applications,

    /// Review applicants (recruiters)
    Applicants {
        #[command(subcommand)]
        command: ApplicantCommands,
    },

    /// Post a job (recruiters)
    Post {
        title: String,
        #[arg(short, long, default_value = "Remote")]
        location: String,
        #[arg(short = 't', long = "type", default_value = "Full-time")]
        kind: String,
    },

    /// List your posted jobs (recruiters)
    Posts,

    /// Show inbox messages
    Inbox,

    /// List companies
    Companies,

    /// Manage notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Show your dashboard
    Dashboard,

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Account settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SignupCommands {
    /// Job seeker account
    Seeker {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        skills: String,
        /// Resume file name
        #[arg(long)]
        resume: Option<String>,
    },

    /// Recruiter account
    Recruiter {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        company: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// List all jobs
    List,
    /// Search jobs by title, company, location, skills...
    Search { query: String },
    /// Show job details
    Show { id: String },
    /// Save or unsave a job
    Save { id: String },
    /// Apply to a job
    Apply { id: String },
    /// List saved jobs
    Saved,
}

#[derive(Subcommand)]
enum ApplicantCommands {
    /// List all applications
    List,
    /// Shortlist an application
    Shortlist { id: String },
    /// Reject an application
    Reject { id: String },
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// List notifications, newest first
    List,
    /// Mark one notification read
    Read { id: String },
    /// Mark all notifications read
    ReadAll,
    /// Delete all notifications
    Clear,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        skills: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        resume: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Update name, email and phone
    Account {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Update your address
    Address { address: String },
    /// Update your skills
    Skills { skills: String },
    /// Toggle job alerts
    Alerts,
    /// Save a search query
    SaveSearch { query: String },
    /// Change your password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Delete your account
    Delete {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let store = Store::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    let portal = Portal::new(store, config.reset_ttl);

    // first run on a fresh store loads the demo data
    let seeded = portal.seed(Utc::now())?;

    match cli.command {
        Commands::Init => {
            let location = portal.store().path().unwrap_or(path.as_path()).display().to_string();
            if seeded {
                println!("Demo data loaded into {}", location);
            } else {
                println!("Store at {} is already initialized.", location);
            }
            println!("Demo logins: rohit@demo.com / anita.hr@confirm.com (password {})", seed::DEMO_PASSWORD);
        }

        Commands::Signup { command } => {
            let user = match command {
                SignupCommands::Seeker {
                    name,
                    email,
                    password,
                    phone,
                    bio,
                    address,
                    skills,
                    resume,
                } => portal.signup_seeker(SeekerSignup {
                    name,
                    email,
                    password,
                    phone,
                    bio,
                    address,
                    skills,
                    resume,
                })?,
                SignupCommands::Recruiter {
                    name,
                    email,
                    password,
                    company,
                    phone,
                } => portal.signup_recruiter(RecruiterSignup {
                    name,
                    email,
                    password,
                    company,
                    phone,
                })?,
            };
            println!("{} account created for {}. You can log in now.", capitalize(&user.role().to_string()), user.email);
        }

        Commands::Login { email, password } => {
            let session = portal.login(&email, &password)?;
            let name = portal
                .identities()
                .get(&session.email)?
                .map(|u| u.name)
                .unwrap_or_default();
            println!("Welcome, {}", name);
        }

        Commands::Logout => {
            portal.logout()?;
            println!("Logged out");
        }

        Commands::Whoami => match portal.whoami()? {
            Some((session, user)) => {
                let name = user.map(|u| u.name).unwrap_or_else(|| "(account missing)".to_string());
                println!("{} <{}> [{}]", name, session.email, session.role);
                if portal.records().has_unread()? {
                    println!("You have unread notifications.");
                }
                if portal.reset_state(Utc::now())? == ResetState::Issued {
                    println!("A password reset code is pending.");
                }
            }
            None => println!("Not logged in."),
        },

        Commands::Forgot { email } => {
            let ticket = portal.forgot_password(&email, Utc::now())?;
            println!("OTP sent to {} (Demo OTP: {})", ticket.email, ticket.code);
            println!("Valid until {}", ticket.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"));
        }

        Commands::Reset { code, password } => {
            let email = portal.reset_password(&code, &password, Utc::now())?;
            println!("Password updated for {}", email);
        }

        Commands::Jobs { command } => match command {
            JobCommands::List => print_jobs(&portal, &portal.records().jobs()?)?,
            JobCommands::Search { query } => print_jobs(&portal, &portal.records().search_jobs(&query)?)?,
            JobCommands::Saved => print_jobs(&portal, &portal.records().saved_jobs()?)?,
            JobCommands::Show { id } => match portal.records().job(&id)? {
                Some(job) => {
                    println!("Job {}", job.id);
                    println!("Title: {}", job.title);
                    println!("Company: {}", job.company);
                    println!("Location: {}", job.location);
                    println!("Type: {}", job.kind);
                    println!("Skills: {}", job.skills.join(", "));
                    println!("Experience: {}", job.exp);
                    println!("Tag: {}", job.tag);
                }
                None => println!("Job {} not found.", id),
            },
            JobCommands::Save { id } => {
                if portal.toggle_saved(&id)? {
                    println!("Saved {}", id);
                } else {
                    println!("Removed {} from saved jobs", id);
                }
            }
            JobCommands::Apply { id } => {
                let app = portal.apply(&id, Utc::now())?;
                println!("Applied to: {}", app.title);
            }
        },

        Commands::Applications => print_applications(&portal.my_applications()?, false),

        Commands::Applicants { command } => match command {
            ApplicantCommands::List => print_applications(&portal.applicants()?, true),
            ApplicantCommands::Shortlist { id } => {
                let app = portal.shortlist(&id, Utc::now())?;
                println!("Applicant {} shortlisted", app.applicant_name);
            }
            ApplicantCommands::Reject { id } => {
                let app = portal.reject(&id)?;
                println!("Applicant {} rejected", app.applicant_name);
            }
        },

        Commands::Post { title, location, kind } => {
            let posting = portal.post_job(&title, &location, &kind, Utc::now())?;
            println!("Job posted: {} ({})", posting.title, posting.id);
        }

        Commands::Posts => {
            let posts = portal.my_postings()?;
            if posts.is_empty() {
                println!("No posts yet.");
            } else {
                println!("{:<10} {:<28} {:<14} {:<12} {:>10} {:<8}", "ID", "TITLE", "LOCATION", "TYPE", "APPLICANTS", "STATUS");
                println!("{}", "-".repeat(87));
                for p in posts {
                    println!(
                        "{:<10} {:<28} {:<14} {:<12} {:>10} {:<8}",
                        short_id(&p.id),
                        truncate(&p.title, 26),
                        truncate(&p.location, 12),
                        truncate(&p.kind, 12),
                        p.applicants,
                        p.status
                    );
                }
            }
        }

        Commands::Inbox => {
            let messages = portal.records().messages()?;
            if messages.is_empty() {
                println!("Inbox is empty.");
            }
            for m in messages {
                println!("{} ({})", m.from, m.time);
                for line in textwrap::wrap(&m.text, 72) {
                    println!("  {}", line);
                }
                println!();
            }
        }

        Commands::Companies => {
            let companies = portal.records().companies()?;
            println!("{:<24} {:>8} {:>7}", "COMPANY", "OPENINGS", "RATING");
            println!("{}", "-".repeat(41));
            for c in companies {
                println!("{:<24} {:>8} {:>7.1}", truncate(&c.name, 22), c.openings, c.rating);
            }
        }

        Commands::Notifications { command } => {
            let records = portal.records();
            match command {
                NotificationCommands::List => {
                    let list = records.notifications()?;
                    if list.is_empty() {
                        println!("No notifications");
                    }
                    for n in list {
                        let marker = if n.read { " " } else { "*" };
                        println!(
                            "{} {:<12} {:<40} {}",
                            marker,
                            short_id(&n.id),
                            truncate(&n.text, 38),
                            n.ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                NotificationCommands::Read { id } => match records.mark_read(&id)? {
                    Some(n) => println!("Marked read: {} (-> {})", n.text, n.href),
                    None => println!("Notification {} not found.", id),
                },
                NotificationCommands::ReadAll => {
                    let changed = records.mark_all_read()?;
                    println!("Marked {} notification(s) read", changed);
                }
                NotificationCommands::Clear => {
                    records.clear_notifications()?;
                    println!("Notifications cleared");
                }
            }
        }

        Commands::Dashboard => print_dashboard(&portal.dashboard()?),

        Commands::Profile { command } => match command {
            ProfileCommands::Show => print_profile(&portal.profile()?),
            ProfileCommands::Update {
                name,
                email,
                phone,
                address,
                skills,
                bio,
                resume,
            } => {
                let user = portal.update_profile(ProfileUpdate {
                    name,
                    email,
                    phone,
                    address,
                    skills,
                    bio,
                    resume,
                })?;
                println!("Profile updated");
                print_profile(&user);
            }
        },

        Commands::Settings { command } => match command {
            SettingsCommands::Account { name, email, phone } => {
                portal.update_account(&name, &email, phone.as_deref())?;
                println!("Account saved");
            }
            SettingsCommands::Address { address } => {
                portal.update_address(&address)?;
                println!("Address saved");
            }
            SettingsCommands::Skills { skills } => {
                portal.update_skills(&skills)?;
                println!("Preferences saved");
            }
            SettingsCommands::Alerts => {
                let on = portal.toggle_alerts()?;
                println!("Job Alerts {}", if on { "enabled" } else { "disabled" });
            }
            SettingsCommands::SaveSearch { query } => {
                if portal.save_search(&query)? {
                    println!("Search saved");
                } else {
                    println!("Search already saved");
                }
            }
            SettingsCommands::Password { current, new } => {
                portal.change_password(&current, &new)?;
                println!("Password changed");
            }
            SettingsCommands::Delete { yes } => {
                if !yes {
                    println!("Pass --yes to delete your saved account.");
                } else {
                    let email = portal.delete_account()?;
                    println!("Account {} deleted", email);
                }
            }
        },
    }

    Ok(())
}

fn print_jobs(portal: &Portal, jobs: &[Job]) -> Result<()> {
    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }
    let saved = portal.records().saved_ids()?;
    println!("{:<6} {:<24} {:<20} {:<12} {:<10} {:<9} {:<5}", "ID", "TITLE", "COMPANY", "LOCATION", "TYPE", "TAG", "SAVED");
    println!("{}", "-".repeat(92));
    for job in jobs {
        println!(
            "{:<6} {:<24} {:<20} {:<12} {:<10} {:<9} {:<5}",
            job.id,
            truncate(&job.title, 22),
            truncate(&job.company, 18),
            truncate(&job.location, 10),
            truncate(&job.kind, 10),
            truncate(&job.tag, 9),
            if saved.contains(&job.id) { "yes" } else { "" }
        );
    }
    Ok(())
}

fn print_applications(apps: &[Application], with_applicant: bool) {
    if apps.is_empty() {
        println!("No applications yet.");
        return;
    }
    if with_applicant {
        println!("{:<12} {:<18} {:<22} {:<22} {:<12}", "ID", "APPLICANT", "EMAIL", "JOB", "STATUS");
        println!("{}", "-".repeat(90));
        for a in apps {
            println!(
                "{:<12} {:<18} {:<22} {:<22} {:<12}",
                short_id(&a.id),
                truncate(&a.applicant_name, 16),
                truncate(&a.applicant_email, 20),
                truncate(&a.title, 20),
                a.status
            );
        }
    } else {
        println!("{:<12} {:<6} {:<24} {:<17} {:<12}", "ID", "JOB", "TITLE", "APPLIED", "STATUS");
        println!("{}", "-".repeat(75));
        for a in apps {
            println!(
                "{:<12} {:<6} {:<24} {:<17} {:<12}",
                short_id(&a.id),
                a.job_id,
                truncate(&a.title, 22),
                a.applied_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                a.status
            );
        }
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    match dashboard {
        Dashboard::Seeker(d) => {
            println!("Job Seeker Dashboard - {}", d.name);
            println!();
            println!("  Applications:        {}", d.applications);
            println!("  Saved Jobs:          {}", d.saved_jobs.len());
            println!("  Profile Completion:  {}%", d.completion);
            println!("  Inbox:               {}", d.inbox);
            println!("  Job Alerts:          {}", if d.alerts { "on" } else { "off" });

            println!("\nRecent Applications:");
            if d.recent.is_empty() {
                println!("  No applications yet. Apply from Jobs.");
            }
            for a in &d.recent {
                println!("  {} ({})", a.title, a.status);
            }

            println!("\nSaved Jobs:");
            if d.saved_jobs.is_empty() {
                println!("  No saved jobs.");
            }
            for j in &d.saved_jobs {
                println!("  {} - {} · {}", j.title, j.company, j.location);
            }

            if !d.saved_searches.is_empty() {
                println!("\nSaved Searches: {}", d.saved_searches.join(" | "));
            }
        }
        Dashboard::Recruiter(d) => {
            println!("Recruiter Dashboard - {}", d.name);
            println!();
            println!("  Active Job Posts:  {}", d.posts.len());
            println!("  Total Applicants:  {}", d.total_applicants);
            println!("  Org:               {}", if d.company.is_empty() { "Your Company" } else { d.company.as_str() });

            println!("\nLatest Applicants:");
            for a in &d.latest {
                println!("  {} <{}> - {}", a.applicant_name, a.applicant_email, a.title);
            }

            println!("\nMy Job Posts:");
            if d.posts.is_empty() {
                println!("  No posts yet.");
            }
            for p in &d.posts {
                println!("  {} - {} · {} ({})", p.title, p.location, p.kind, p.status);
            }
        }
    }
}

fn print_profile(user: &User) {
    println!("Name: {}", or_dash(&user.name));
    println!("Email: {}", user.email);
    println!("Role: {}", user.role());
    println!("Phone: {}", or_dash(user.phone()));
    match &user.profile {
        models::Profile::Seeker(p) => {
            println!("Address: {}", or_dash(&p.address));
            println!("Skills: {}", or_dash(&p.skills));
            println!("Resume: {}", p.resume);
            println!("Profile completion: {}%", portal::profile_completion(user));
            println!("Bio:");
            let bio = if p.bio.is_empty() { "No bio added." } else { p.bio.as_str() };
            for line in textwrap::wrap(bio, 72) {
                println!("  {}", line);
            }
        }
        models::Profile::Recruiter(p) => {
            println!("Company: {}", or_dash(&p.company));
        }
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Leading characters of a generated id. Commands taking an id accept any
/// unique prefix, so this is enough to type back in.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
