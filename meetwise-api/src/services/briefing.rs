//! Rule-based briefing dossier generation
//!
//! Deterministic templating over the meeting, its attendees and agenda. No
//! external data sources are consulted: company news and recent activity are
//! placeholders derived from the attendee's company.

use chrono::{DateTime, Duration, Utc};
use meetwise_common::models::{AgendaItem, Meeting};
use meetwise_common::time;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::AuthContext;
use crate::db;
use crate::db::users::UserProfile;
use crate::error::ApiResult;
use crate::models::{
    AgendaAnalysis, AttendeeProfile, BriefingDossier, Complexity, NewsItem, RecentActivity,
    TopicAnalysis,
};
use crate::services::meetings::load_viewable;

const UNKNOWN_COMPANY: &str = "Unknown Company";
const UNKNOWN_TITLE: &str = "Unknown Title";

/// Agendas longer than this (minutes) get a split recommendation
const LONG_AGENDA_MINUTES: u32 = 60;

/// Stored dossier of a meeting, generating one on first request
pub async fn get_or_generate(
    pool: &SqlitePool,
    ctx: &AuthContext,
    meeting_id: Uuid,
) -> ApiResult<BriefingDossier> {
    let meeting = load_viewable(pool, ctx, meeting_id).await?;

    if let Some(dossier) = db::dossiers::get_dossier(pool, meeting_id).await? {
        return Ok(dossier);
    }
    generate_for(pool, &meeting).await
}

/// Regenerate and store the dossier of a meeting
pub async fn regenerate(
    pool: &SqlitePool,
    ctx: &AuthContext,
    meeting_id: Uuid,
) -> ApiResult<BriefingDossier> {
    let meeting = load_viewable(pool, ctx, meeting_id).await?;
    generate_for(pool, &meeting).await
}

async fn generate_for(pool: &SqlitePool, meeting: &Meeting) -> ApiResult<BriefingDossier> {
    let attendees = db::users::profiles_for_meeting(pool, meeting.id).await?;
    let dossier = build_dossier(meeting, &attendees, time::now());
    let stored = db::dossiers::upsert_dossier(pool, &dossier).await?;

    info!(
        meeting_id = %meeting.id,
        attendees = attendees.len(),
        topics = stored.agenda_analysis.topics.len(),
        "Briefing dossier generated"
    );
    Ok(stored)
}

/// Assemble a dossier from already loaded data
pub fn build_dossier(meeting: &Meeting, attendees: &[UserProfile], now: DateTime<Utc>) -> BriefingDossier {
    let attendee_profiles: Vec<AttendeeProfile> = attendees
        .iter()
        .map(|a| attendee_profile(a, now))
        .collect();

    let companies = external_companies(attendees);
    let market_news = market_news(&companies, now);
    let agenda_analysis = analyze_agenda(&meeting.agenda_items);

    let key_insights = key_insights(&companies, &market_news, &agenda_analysis);
    let recommendations = recommendations(!companies.is_empty(), &agenda_analysis);

    BriefingDossier {
        meeting_id: meeting.id,
        attendee_profiles,
        // Meeting notes and shared documents are not stored by this backend
        relevant_documents: Vec::new(),
        market_news,
        agenda_analysis,
        key_insights,
        recommendations,
        created_at: now,
        updated_at: now,
    }
}

fn attendee_profile(profile: &UserProfile, now: DateTime<Utc>) -> AttendeeProfile {
    let name = if profile.user.name.trim().is_empty() {
        "Unknown".to_string()
    } else {
        profile.user.name.clone()
    };
    let company = profile.company.clone().unwrap_or_else(|| UNKNOWN_COMPANY.to_string());

    AttendeeProfile {
        name,
        email: profile.user.email.clone(),
        job_title: profile
            .job_title
            .clone()
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        recent_activity: vec![
            RecentActivity {
                kind: "post".to_string(),
                content: format!(
                    "Shared insights about {} trends",
                    profile.company.as_deref().unwrap_or("industry")
                ),
                date: now - Duration::days(2),
            },
            RecentActivity {
                kind: "article".to_string(),
                content: "Published article on professional development".to_string(),
                date: now - Duration::days(9),
            },
        ],
        company_news: company_news(&company, now),
        company,
    }
}

/// Distinct attendee companies, sorted
fn external_companies(attendees: &[UserProfile]) -> Vec<String> {
    attendees
        .iter()
        .filter_map(|a| a.company.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != UNKNOWN_COMPANY)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn company_news(company: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    vec![
        NewsItem {
            title: format!("{} announces new strategic initiatives", company),
            source: "Business News".to_string(),
            date: now - Duration::days(3),
            summary: "Company announces new strategic direction and partnerships.".to_string(),
            relevance: "high".to_string(),
        },
        NewsItem {
            title: format!("{} reports quarterly earnings", company),
            source: "Financial Times".to_string(),
            date: now - Duration::days(10),
            summary: "Strong quarterly performance with growth in key areas.".to_string(),
            relevance: "medium".to_string(),
        },
    ]
}

/// News for every company, newest first
fn market_news(companies: &[String], now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut news: Vec<NewsItem> = companies
        .iter()
        .flat_map(|c| company_news(c, now))
        .collect();
    news.sort_by(|a, b| b.date.cmp(&a.date));
    news
}

pub fn analyze_agenda(items: &[AgendaItem]) -> AgendaAnalysis {
    let topics: Vec<TopicAnalysis> = items
        .iter()
        .map(|item| TopicAnalysis {
            topic: item.text.clone(),
            complexity: topic_complexity(&item.text),
            estimated_time: topic_minutes(&item.text),
            key_points: key_points(&item.text),
        })
        .collect();

    AgendaAnalysis {
        key_themes: key_themes(items),
        estimated_duration: topics.iter().map(|t| t.estimated_time).sum(),
        complexity: overall_complexity(&topics),
        topics,
    }
}

pub fn topic_complexity(topic: &str) -> Complexity {
    const COMPLEX: [&str; 5] = ["strategy", "analysis", "review", "planning", "assessment"];
    const SIMPLE: [&str; 4] = ["update", "status", "check-in", "brief"];

    let lower = topic.to_lowercase();
    if COMPLEX.iter().any(|k| lower.contains(k)) {
        Complexity::High
    } else if SIMPLE.iter().any(|k| lower.contains(k)) {
        Complexity::Low
    } else {
        Complexity::Medium
    }
}

/// Estimated minutes for one agenda topic
pub fn topic_minutes(topic: &str) -> u32 {
    let lower = topic.to_lowercase();
    if lower.contains("brief") || lower.contains("update") {
        5
    } else if lower.contains("discussion") || lower.contains("review") {
        15
    } else if lower.contains("planning") || lower.contains("strategy") {
        30
    } else {
        10
    }
}

/// First three words longer than four characters
fn key_points(topic: &str) -> Vec<String> {
    topic
        .split_whitespace()
        .filter(|w| w.chars().count() > 4)
        .take(3)
        .map(str::to_string)
        .collect()
}

fn key_themes(items: &[AgendaItem]) -> Vec<String> {
    const THEMES: [(&str, &str); 4] = [
        ("strategy", "Strategic Planning"),
        ("review", "Review & Assessment"),
        ("planning", "Planning"),
        ("update", "Status Updates"),
    ];

    let mut themes: Vec<String> = Vec::new();
    for item in items {
        let lower = item.text.to_lowercase();
        for (keyword, theme) in THEMES {
            if lower.contains(keyword) && !themes.iter().any(|t| t == theme) {
                themes.push(theme.to_string());
            }
        }
    }
    themes
}

fn overall_complexity(topics: &[TopicAnalysis]) -> Complexity {
    let high = topics.iter().filter(|t| t.complexity == Complexity::High).count();
    let low = topics.iter().filter(|t| t.complexity == Complexity::Low).count();

    if high > low {
        Complexity::High
    } else if low > high {
        Complexity::Low
    } else {
        Complexity::Medium
    }
}

fn key_insights(companies: &[String], market_news: &[NewsItem], agenda: &AgendaAnalysis) -> String {
    let mut insights = Vec::new();

    if !companies.is_empty() {
        insights.push(format!(
            "Meeting includes attendees from {} external companies: {}.",
            companies.len(),
            companies.join(", ")
        ));
    }
    if !market_news.is_empty() {
        insights.push(format!(
            "Recent market news available for {} companies involved in the meeting.",
            companies.len()
        ));
    }
    if !agenda.topics.is_empty() {
        insights.push(format!(
            "Agenda covers {} topics with estimated duration of {}.",
            agenda.topics.len(),
            format_duration(agenda.estimated_duration)
        ));
    }

    insights.join(" ")
}

fn recommendations(has_external_attendees: bool, agenda: &AgendaAnalysis) -> String {
    let mut recommendations = Vec::new();

    if agenda.estimated_duration > LONG_AGENDA_MINUTES {
        recommendations.push("Consider breaking this into multiple meetings due to agenda length.");
    }
    if has_external_attendees {
        recommendations.push("Prepare company-specific talking points for external attendees.");
    }

    recommendations.join(" ")
}

/// `45 minutes`, `1h 30m`
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{} minutes", minutes);
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}
