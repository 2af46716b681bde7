//! API-local records: briefing dossiers and practice sessions
//!
//! Action items, meetings and users live in `meetwise_common::models` because
//! the sync client shares them. These types never leave the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ========================================
// Briefing dossier
// ========================================

/// Topic or meeting complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeProfile {
    pub name: String,
    pub email: String,
    pub company: String,
    pub job_title: String,
    pub recent_activity: Vec<RecentActivity>,
    pub company_news: Vec<NewsItem>,
}

/// Prior material related to the meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantDocument {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalysis {
    pub topic: String,
    pub complexity: Complexity,
    /// Minutes
    pub estimated_time: u32,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaAnalysis {
    pub topics: Vec<TopicAnalysis>,
    pub key_themes: Vec<String>,
    /// Minutes
    pub estimated_duration: u32,
    pub complexity: Complexity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingDossier {
    pub meeting_id: Uuid,
    pub attendee_profiles: Vec<AttendeeProfile>,
    pub relevant_documents: Vec<RelevantDocument>,
    pub market_news: Vec<NewsItem>,
    pub agenda_analysis: AgendaAnalysis,
    pub key_insights: String,
    pub recommendations: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ========================================
// Practice sessions
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Simulated stakeholder taking part in a practice session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub company: Option<String>,
    pub personality: String,
    pub background: String,
    pub expertise: String,
    pub communication_style: String,
    pub typical_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub user_role: String,
    pub scenario: String,
    pub difficulty: Difficulty,
    /// Minutes
    pub duration: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeInteraction {
    pub id: Uuid,
    pub practice_session_id: Uuid,
    pub speaker: String,
    pub message: String,
    pub message_type: String,
    pub persona_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeFeedback {
    pub id: Uuid,
    pub practice_session_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub score: Option<f64>,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Scored aspect of a delivery with advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAspect {
    pub score: f64,
    pub feedback: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillerWordReport {
    pub count: usize,
    /// Distinct filler words, in order of first use
    pub words: Vec<String>,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallReport {
    pub score: f64,
    pub summary: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFeedback {
    pub pacing: ScoredAspect,
    pub clarity: ScoredAspect,
    pub filler_words: FillerWordReport,
    pub confidence: ConfidenceReport,
    pub overall: OverallReport,
}
