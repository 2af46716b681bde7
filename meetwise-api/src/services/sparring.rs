//! Rule-based sparring partner
//!
//! Practice sessions pit the user against up to three personas picked from a
//! fixed catalogue by agenda keywords. Follow-up questions and delivery
//! feedback are keyword and ratio heuristics over the user's text.

use meetwise_common::models::{AgendaItem, Meeting};
use meetwise_common::time;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::auth::AuthContext;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ConfidenceReport, DeliveryFeedback, Difficulty, FillerWordReport, OverallReport, Persona,
    PracticeFeedback, PracticeInteraction, PracticeSession, ScoredAspect,
};
use crate::services::meetings::load_viewable;

// ========================================
// Persona catalogue
// ========================================

/// Catalogue entry; weights drive agenda-based selection
#[derive(Debug, Clone, Copy)]
pub struct PersonaTemplate {
    pub name: &'static str,
    pub role: &'static str,
    pub company: &'static str,
    pub personality: &'static str,
    pub background: &'static str,
    pub expertise: &'static str,
    pub communication_style: &'static str,
    pub typical_questions: [&'static str; 4],
    pub technical_depth: f64,
    pub business_focus: f64,
}

pub static PERSONAS: [PersonaTemplate; 4] = [
    PersonaTemplate {
        name: "Sarah Chen",
        role: "CFO",
        company: "TechCorp",
        personality: "Analytical and results-driven",
        background: "15+ years in finance, MBA from Harvard",
        expertise: "Financial analysis, ROI calculations, budget management",
        communication_style: "Direct, data-focused, asks tough questions",
        typical_questions: [
            "What's the ROI on this investment?",
            "How does this align with our quarterly targets?",
            "What are the risks and mitigation strategies?",
            "Can you break down the cost-benefit analysis?",
        ],
        technical_depth: 0.3,
        business_focus: 0.9,
    },
    PersonaTemplate {
        name: "Marcus Rodriguez",
        role: "Engineering Lead",
        company: "TechCorp",
        personality: "Technical and detail-oriented",
        background: "10+ years in software engineering, CS degree",
        expertise: "System architecture, technical feasibility, implementation",
        communication_style: "Technical, thorough, focuses on implementation details",
        typical_questions: [
            "How will this integrate with our existing systems?",
            "What are the technical requirements and constraints?",
            "What's the implementation timeline?",
            "Have you considered the scalability implications?",
        ],
        technical_depth: 0.9,
        business_focus: 0.4,
    },
    PersonaTemplate {
        name: "Jennifer Park",
        role: "Product Manager",
        company: "TechCorp",
        personality: "User-focused and strategic",
        background: "8+ years in product management, design background",
        expertise: "User experience, market research, product strategy",
        communication_style: "Collaborative, user-centric, strategic thinking",
        typical_questions: [
            "How does this solve the user's problem?",
            "What's the user feedback on this approach?",
            "How does this fit into our product roadmap?",
            "What are the success metrics we should track?",
        ],
        technical_depth: 0.6,
        business_focus: 0.7,
    },
    PersonaTemplate {
        name: "David Thompson",
        role: "Sales Director",
        company: "TechCorp",
        personality: "Results-oriented and relationship-focused",
        background: "12+ years in sales, psychology degree",
        expertise: "Customer relationships, market positioning, revenue growth",
        communication_style: "Persuasive, relationship-focused, outcome-driven",
        typical_questions: [
            "How will this help us close more deals?",
            "What's the competitive advantage?",
            "How do we position this to customers?",
            "What's the revenue impact?",
        ],
        technical_depth: 0.2,
        business_focus: 0.8,
    },
];

const PERSONAS_PER_SESSION: usize = 3;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Score every catalogue persona against the agenda and keep the top three
///
/// Ties keep catalogue order.
pub fn select_personas(agenda: &[AgendaItem]) -> Vec<&'static PersonaTemplate> {
    let text = agenda
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut scored: Vec<(f64, &'static PersonaTemplate)> = PERSONAS
        .iter()
        .map(|p| {
            let mut score = 0.0;
            if contains_any(&text, &["budget", "cost", "roi"]) {
                score += p.business_focus;
            }
            if contains_any(&text, &["technical", "implementation", "system"]) {
                score += p.technical_depth;
            }
            if contains_any(&text, &["user", "product", "feature"]) {
                score += p.business_focus * 0.8;
            }
            if contains_any(&text, &["sales", "market", "customer"]) {
                score += p.business_focus * 0.9;
            }
            (score, p)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(PERSONAS_PER_SESSION)
        .map(|(_, p)| p)
        .collect()
}

pub fn assess_difficulty(agenda_len: usize) -> Difficulty {
    if agenda_len > 5 {
        Difficulty::Advanced
    } else if agenda_len > 3 {
        Difficulty::Intermediate
    } else {
        Difficulty::Beginner
    }
}

/// Session length in minutes: 15 plus 5 per agenda item, capped at 60
pub fn session_duration(agenda_len: usize) -> u32 {
    agenda_len.saturating_mul(5).saturating_add(15).min(60) as u32
}

// ========================================
// Sessions
// ========================================

/// Body of `POST /ai-sparring/practice-session`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePracticeSession {
    pub meeting_id: Uuid,
    pub user_role: String,
    pub scenario: String,
}

/// Body of `POST /ai-sparring/practice-session/:id/interaction`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveInteraction {
    pub speaker: String,
    pub message: String,
    pub message_type: String,
    #[serde(default)]
    pub persona_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub title: String,
    pub description: Option<String>,
    pub agenda_items: Vec<AgendaItem>,
}

impl From<&Meeting> for MeetingSummary {
    fn from(meeting: &Meeting) -> Self {
        Self {
            title: meeting.title.clone(),
            description: meeting.description.clone(),
            agenda_items: meeting.agenda_items.clone(),
        }
    }
}

/// Session with everything a client needs to resume it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionDetail {
    #[serde(flatten)]
    pub session: PracticeSession,
    pub personas: Vec<Persona>,
    pub meeting: MeetingSummary,
    pub interactions: Vec<PracticeInteraction>,
    pub feedback: Vec<PracticeFeedback>,
}

/// Create a session for a meeting the caller can view and seed one
/// introduction per selected persona
pub async fn create_session(
    pool: &SqlitePool,
    ctx: &AuthContext,
    body: CreatePracticeSession,
) -> ApiResult<PracticeSessionDetail> {
    let user = ctx.user()?;
    let meeting = load_viewable(pool, ctx, body.meeting_id).await?;
    let agenda_len = meeting.agenda_items.len();

    let session = PracticeSession {
        id: Uuid::new_v4(),
        meeting_id: meeting.id,
        user_id: user.id,
        title: format!("Practice Session: {}", meeting.title),
        description: format!("Practice session for {} - Role: {}", meeting.title, body.user_role),
        user_role: body.user_role,
        scenario: body.scenario,
        difficulty: assess_difficulty(agenda_len),
        duration: session_duration(agenda_len),
        status: "active".to_string(),
        created_at: time::now(),
    };
    db::practice::insert_session(pool, &session).await?;

    for template in select_personas(&meeting.agenda_items) {
        let persona = Persona {
            id: Uuid::new_v4(),
            name: template.name.to_string(),
            role: template.role.to_string(),
            company: Some(template.company.to_string()),
            personality: template.personality.to_string(),
            background: template.background.to_string(),
            expertise: template.expertise.to_string(),
            communication_style: template.communication_style.to_string(),
            typical_questions: template.typical_questions.iter().map(|q| q.to_string()).collect(),
        };
        db::practice::insert_persona(pool, &persona).await?;

        let introduction = PracticeInteraction {
            id: Uuid::new_v4(),
            practice_session_id: session.id,
            speaker: persona.name.clone(),
            message: format!(
                "Hello, I'm {}, {} at {}. I'm ready to discuss {}.",
                persona.name,
                persona.role,
                template.company,
                persona.expertise.to_lowercase()
            ),
            message_type: "introduction".to_string(),
            persona_id: Some(persona.id),
            timestamp: time::now(),
        };
        db::practice::insert_interaction(pool, &introduction).await?;
    }

    info!(
        session_id = %session.id,
        meeting_id = %meeting.id,
        difficulty = session.difficulty.as_str(),
        "Practice session created"
    );

    load_detail(pool, session, &meeting).await
}

async fn load_detail(
    pool: &SqlitePool,
    session: PracticeSession,
    meeting: &Meeting,
) -> ApiResult<PracticeSessionDetail> {
    Ok(PracticeSessionDetail {
        personas: db::practice::personas_for_session(pool, session.id).await?,
        interactions: db::practice::list_interactions(pool, session.id).await?,
        feedback: db::practice::list_feedback(pool, session.id).await?,
        meeting: MeetingSummary::from(meeting),
        session,
    })
}

/// Load a session owned by the caller
async fn load_owned(pool: &SqlitePool, ctx: &AuthContext, id: Uuid) -> ApiResult<PracticeSession> {
    let user = ctx.user()?;
    let session = db::practice::get_session(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Practice session not found".to_string()))?;

    if session.user_id != user.id {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }
    Ok(session)
}

pub async fn get_session(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
) -> ApiResult<PracticeSessionDetail> {
    let session = load_owned(pool, ctx, id).await?;
    let meeting = db::meetings::get_meeting(pool, session.meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;
    load_detail(pool, session, &meeting).await
}

pub async fn save_interaction(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: SaveInteraction,
) -> ApiResult<PracticeInteraction> {
    let session = load_owned(pool, ctx, id).await?;

    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if let Some(persona_id) = body.persona_id {
        if !db::practice::persona_exists(pool, persona_id).await? {
            return Err(ApiError::NotFound("Persona not found".to_string()));
        }
    }

    let interaction = PracticeInteraction {
        id: Uuid::new_v4(),
        practice_session_id: session.id,
        speaker: body.speaker,
        message: body.message,
        message_type: body.message_type,
        persona_id: body.persona_id,
        timestamp: time::now(),
    };
    db::practice::insert_interaction(pool, &interaction).await?;
    Ok(interaction)
}

// ========================================
// Follow-up questions
// ========================================

const MAX_FOLLOW_UPS: usize = 3;

/// Up to three follow-up questions for the current topic and answer
pub fn follow_up_questions(topic: &str, response: &str) -> Vec<String> {
    const RULES: [(&[&str], [&str; 4]); 4] = [
        (
            &["budget", "cost"],
            [
                "Can you provide more specific cost breakdowns?",
                "What assumptions are you making in these estimates?",
                "How does this compare to alternative solutions?",
                "What's the payback period for this investment?",
            ],
        ),
        (
            &["timeline", "schedule"],
            [
                "What are the critical path dependencies?",
                "How will delays impact the overall project?",
                "What resources will be needed at each phase?",
                "Have you built in buffer time for unexpected issues?",
            ],
        ),
        (
            &["technical", "implementation"],
            [
                "What are the technical risks involved?",
                "How will this integrate with existing systems?",
                "What's the learning curve for the team?",
                "Have you considered the maintenance overhead?",
            ],
        ),
        (
            &["user", "customer"],
            [
                "How have you validated this with users?",
                "What's the user adoption strategy?",
                "How does this improve the user experience?",
                "What feedback have you received so far?",
            ],
        ),
    ];
    const HEDGES: [&str; 3] = ["we think", "probably", "maybe"];
    const EVIDENCE: [&str; 4] = [
        "Can you provide more concrete evidence for that?",
        "What data supports this conclusion?",
        "Have you tested this assumption?",
        "What would you need to be more certain?",
    ];

    let topic = topic.to_lowercase();
    let response = response.to_lowercase();

    let mut questions: Vec<&str> = Vec::new();
    for (keywords, rule_questions) in RULES {
        if contains_any(&topic, keywords) {
            questions.extend(rule_questions);
        }
    }
    if contains_any(&response, &HEDGES) {
        questions.extend(EVIDENCE);
    }

    questions
        .into_iter()
        .take(MAX_FOLLOW_UPS)
        .map(str::to_string)
        .collect()
}

/// Validate access and produce follow-up questions
pub async fn follow_ups_for_session(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    topic: &str,
    response: &str,
) -> ApiResult<Vec<String>> {
    load_owned(pool, ctx, id).await?;
    Ok(follow_up_questions(topic, response))
}

// ========================================
// Persona replies
// ========================================

/// Per-role reply templates; `{message}` is replaced with the user's message
struct ReplyScript {
    role: &'static str,
    rules: [(&'static [&'static str], &'static str); 2],
    fallback: &'static str,
}

static REPLY_SCRIPTS: [ReplyScript; 4] = [
    ReplyScript {
        role: "CFO",
        rules: [
            (
                &["budget", "cost", "roi"],
                "As CFO, I need to see concrete numbers. {message} sounds promising, but what's the exact ROI calculation? What assumptions are you making about revenue growth and cost savings?",
            ),
            (
                &["timeline", "schedule"],
                "Time is money. {message} - but how does this timeline impact our quarterly targets? What are the opportunity costs of this timeline?",
            ),
        ],
        fallback: "I appreciate {message}, but I need to understand the financial implications. How does this align with our strategic objectives and what's the risk-adjusted return?",
    },
    ReplyScript {
        role: "Engineering Lead",
        rules: [
            (
                &["technical", "implementation"],
                "From a technical perspective, {message} raises some questions. How will this integrate with our existing architecture? What are the technical debt implications?",
            ),
            (
                &["timeline", "schedule"],
                "The timeline for {message} seems aggressive. Have you considered the technical complexity and learning curve for the team? What about testing and deployment overhead?",
            ),
        ],
        fallback: "I see the value in {message}, but I need to understand the technical feasibility. What are the system requirements and potential bottlenecks?",
    },
    ReplyScript {
        role: "Product Manager",
        rules: [
            (
                &["user", "customer"],
                "I like the direction of {message}, but how does this solve the user's core problem? What user research supports this approach?",
            ),
            (
                &["feature", "product"],
                "{message} sounds interesting, but how does this fit into our product roadmap? What are the success metrics we should track?",
            ),
        ],
        fallback: "I appreciate {message}, but I need to understand the user impact. How does this improve the user experience and what's the adoption strategy?",
    },
    ReplyScript {
        role: "Sales Director",
        rules: [
            (
                &["sales", "customer"],
                "From a sales perspective, {message} could be compelling. How do we position this to customers? What's the competitive advantage?",
            ),
            (
                &["market", "revenue"],
                "I see the potential in {message}, but how does this help us close more deals? What's the revenue impact and market opportunity?",
            ),
        ],
        fallback: "I like {message}, but I need to understand how this helps our sales team. How do we communicate this value proposition to prospects?",
    },
];

const GENERIC_REPLY: &str = "Thank you for {message}. I'd like to understand more about how this aligns with our objectives and what the next steps would be.";

/// In-character reply for a persona role; the first matching context rule wins
pub fn persona_reply(role: &str, context: &str, user_message: &str) -> String {
    let context = context.to_lowercase();
    let template = REPLY_SCRIPTS
        .iter()
        .find(|script| script.role == role)
        .map(|script| {
            script
                .rules
                .iter()
                .find(|(keywords, _)| contains_any(&context, keywords))
                .map(|(_, template)| *template)
                .unwrap_or(script.fallback)
        })
        .unwrap_or(GENERIC_REPLY);
    template.replace("{message}", user_message)
}

/// Body of `POST /ai-sparring/practice-session/:id/ai-response`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaPrompt {
    pub persona_id: Uuid,
    #[serde(default)]
    pub context: String,
    pub user_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaCard {
    pub name: String,
    pub role: String,
    pub company: Option<String>,
    pub expertise: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaReply {
    pub speaker: String,
    pub message: String,
    pub persona: PersonaCard,
}

/// Generate a persona's reply and store it as an `ai_response` interaction
pub async fn persona_response(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: PersonaPrompt,
) -> ApiResult<PersonaReply> {
    let session = load_owned(pool, ctx, id).await?;

    if body.user_message.trim().is_empty() {
        return Err(ApiError::BadRequest("userMessage must not be empty".to_string()));
    }
    let persona = db::practice::get_persona(pool, body.persona_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Persona not found".to_string()))?;

    let message = persona_reply(&persona.role, &body.context, &body.user_message);
    let interaction = PracticeInteraction {
        id: Uuid::new_v4(),
        practice_session_id: session.id,
        speaker: persona.name.clone(),
        message: message.clone(),
        message_type: "ai_response".to_string(),
        persona_id: Some(persona.id),
        timestamp: time::now(),
    };
    db::practice::insert_interaction(pool, &interaction).await?;
    debug!(session_id = %session.id, persona = %persona.name, "Persona replied");

    Ok(PersonaReply {
        speaker: persona.name.clone(),
        message,
        persona: PersonaCard {
            name: persona.name,
            role: persona.role,
            company: persona.company,
            expertise: persona.expertise,
        },
    })
}

// ========================================
// Delivery feedback
// ========================================

fn normalized_words(transcript: &str) -> Vec<String> {
    transcript
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn filler_words(words: &[String]) -> FillerWordReport {
    const FILLERS: [&str; 6] = ["um", "uh", "like", "basically", "actually", "literally"];

    let detected: Vec<&String> = words
        .iter()
        .filter(|w| FILLERS.contains(&w.as_str()))
        .collect();

    let mut distinct: Vec<String> = Vec::new();
    for word in &detected {
        if !distinct.contains(*word) {
            distinct.push((*word).clone());
        }
    }

    let feedback = if detected.len() > 10 {
        "High use of filler words detected. Consider pausing instead of using filler words."
    } else if detected.len() > 5 {
        "Moderate use of filler words. Practice pausing to reduce them."
    } else {
        "Good control of filler words."
    };

    FillerWordReport {
        count: detected.len(),
        words: distinct,
        feedback: feedback.to_string(),
    }
}

fn aspect(score: f64, feedback: &str, suggestions: [&str; 2]) -> ScoredAspect {
    ScoredAspect {
        score,
        feedback: feedback.to_string(),
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}

fn pacing(word_count: usize, duration_seconds: f64) -> ScoredAspect {
    let wpm = word_count as f64 / duration_seconds * 60.0;

    if wpm < 120.0 {
        aspect(
            0.6,
            "Speaking pace is slow. Consider picking up the pace slightly.",
            ["Practice speaking at a moderate pace", "Use more energy in your delivery"],
        )
    } else if wpm > 200.0 {
        aspect(
            0.7,
            "Speaking pace is fast. Slow down for better comprehension.",
            ["Take more pauses between points", "Practice breathing exercises"],
        )
    } else {
        aspect(
            0.9,
            "Good speaking pace. Maintain this rhythm.",
            ["Continue with current pace", "Use strategic pauses for emphasis"],
        )
    }
}

fn clarity(transcript: &str) -> ScoredAspect {
    let sentences: Vec<&str> = transcript
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .collect();

    let avg_len = if sentences.is_empty() {
        0.0
    } else {
        let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
        words as f64 / sentences.len() as f64
    };

    if avg_len > 25.0 {
        aspect(
            0.6,
            "Sentences are long and complex. Simplify for better clarity.",
            ["Break down complex sentences", "Use shorter, direct statements"],
        )
    } else if avg_len < 8.0 {
        aspect(
            0.7,
            "Sentences are very short. Vary sentence length for better flow.",
            ["Combine related short sentences", "Add transitional phrases"],
        )
    } else {
        aspect(
            0.9,
            "Good sentence structure and clarity.",
            ["Maintain current clarity", "Use examples to illustrate points"],
        )
    }
}

fn confidence(words: &[String]) -> ConfidenceReport {
    const POSITIVE: [&str; 5] = ["confident", "certain", "definitely", "clearly", "obviously"];
    const NEGATIVE: [&str; 5] = ["maybe", "perhaps", "might", "could", "possibly"];

    let positive = words.iter().filter(|w| POSITIVE.contains(&w.as_str())).count() as f64;
    let negative = words.iter().filter(|w| NEGATIVE.contains(&w.as_str())).count() as f64;
    let score = (0.7 + positive * 0.1 - negative * 0.15).clamp(0.3, 1.0);

    let feedback = if score > 0.8 {
        "High confidence level detected. Maintain this assertive tone."
    } else if score > 0.6 {
        "Moderate confidence level. Consider being more assertive."
    } else {
        "Low confidence indicators detected. Practice being more decisive."
    };

    ConfidenceReport {
        score,
        feedback: feedback.to_string(),
    }
}

/// Score a spoken delivery from its transcript and length in seconds
pub fn analyze_delivery(transcript: &str, duration_seconds: f64) -> DeliveryFeedback {
    let words = normalized_words(transcript);
    let filler_words = filler_words(&words);
    let pacing = pacing(words.len(), duration_seconds);
    let clarity = clarity(transcript);
    let confidence = confidence(&words);

    let score = (pacing.score + clarity.score + confidence.score) / 3.0;
    let summary = if score > 0.8 {
        "Excellent delivery! Your presentation was clear, well-paced, and confident."
    } else if score > 0.6 {
        "Good delivery with room for improvement. Focus on the areas highlighted in feedback."
    } else {
        "Delivery needs improvement. Practice the suggested techniques to enhance your presentation skills."
    };

    let mut recommendations: Vec<String> = Vec::new();
    if pacing.score < 0.8 {
        recommendations.extend(pacing.suggestions.iter().cloned());
    }
    if clarity.score < 0.8 {
        recommendations.extend(clarity.suggestions.iter().cloned());
    }
    if filler_words.count > 5 {
        recommendations.push("Practice pausing instead of using filler words".to_string());
        recommendations.push("Record yourself and identify filler word patterns".to_string());
    }
    if confidence.score < 0.7 {
        recommendations.push("Use more assertive language".to_string());
        recommendations.push("Practice power poses before presenting".to_string());
        recommendations.push("Prepare thoroughly to boost confidence".to_string());
    }
    recommendations.truncate(5);

    DeliveryFeedback {
        pacing,
        clarity,
        filler_words,
        confidence,
        overall: OverallReport {
            score,
            summary: summary.to_string(),
            recommendations,
        },
    }
}

/// One persisted entry per feedback category
pub fn feedback_entries(session_id: Uuid, feedback: &DeliveryFeedback) -> Vec<PracticeFeedback> {
    let now = time::now();
    let entry = |category: &str, score: Option<f64>, text: &str, suggestions: Vec<String>| {
        PracticeFeedback {
            id: Uuid::new_v4(),
            practice_session_id: session_id,
            kind: "delivery".to_string(),
            category: category.to_string(),
            score,
            feedback: text.to_string(),
            suggestions,
            timestamp: now,
        }
    };

    vec![
        entry(
            "pacing",
            Some(feedback.pacing.score),
            &feedback.pacing.feedback,
            feedback.pacing.suggestions.clone(),
        ),
        entry(
            "clarity",
            Some(feedback.clarity.score),
            &feedback.clarity.feedback,
            feedback.clarity.suggestions.clone(),
        ),
        entry(
            "filler_words",
            None,
            &feedback.filler_words.feedback,
            feedback.filler_words.words.clone(),
        ),
        entry(
            "confidence",
            Some(feedback.confidence.score),
            &feedback.confidence.feedback,
            Vec::new(),
        ),
        entry(
            "overall",
            Some(feedback.overall.score),
            &feedback.overall.summary,
            feedback.overall.recommendations.clone(),
        ),
    ]
}

/// Body of `POST /ai-sparring/practice-session/:id/analyze-delivery`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDelivery {
    pub transcript: String,
    pub duration_seconds: f64,
}

/// Analyze a delivery and store the five feedback entries
pub async fn record_feedback(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: AnalyzeDelivery,
) -> ApiResult<DeliveryFeedback> {
    let session = load_owned(pool, ctx, id).await?;

    if body.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest("Transcript is required".to_string()));
    }
    if !(body.duration_seconds.is_finite() && body.duration_seconds > 0.0) {
        return Err(ApiError::BadRequest(
            "durationSeconds must be a positive number".to_string(),
        ));
    }

    let feedback = analyze_delivery(&body.transcript, body.duration_seconds);
    db::practice::insert_feedback(pool, &feedback_entries(session.id, &feedback)).await?;

    info!(session_id = %session.id, score = feedback.overall.score, "Delivery feedback recorded");
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agenda(texts: &[&str]) -> Vec<AgendaItem> {
        texts
            .iter()
            .map(|t| AgendaItem {
                text: t.to_string(),
                author: String::new(),
            })
            .collect()
    }

    fn names(personas: &[&PersonaTemplate]) -> Vec<&'static str> {
        personas.iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_personas_default_to_catalogue_order() {
        let selected = select_personas(&[]);
        assert_eq!(
            names(&selected),
            vec!["Sarah Chen", "Marcus Rodriguez", "Jennifer Park"]
        );
    }

    #[test]
    fn test_technical_agenda_prefers_engineering() {
        let selected = select_personas(&agenda(&["Technical implementation review"]));
        assert_eq!(selected[0].name, "Marcus Rodriguez");
        assert_eq!(selected[1].name, "Jennifer Park");
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_sales_agenda_prefers_business_focus() {
        let selected = select_personas(&agenda(&["Customer pipeline", "Budget"]));
        assert_eq!(
            names(&selected),
            vec!["Sarah Chen", "David Thompson", "Jennifer Park"]
        );
    }

    #[test]
    fn test_difficulty_and_duration() {
        assert_eq!(assess_difficulty(0), Difficulty::Beginner);
        assert_eq!(assess_difficulty(3), Difficulty::Beginner);
        assert_eq!(assess_difficulty(4), Difficulty::Intermediate);
        assert_eq!(assess_difficulty(6), Difficulty::Advanced);

        assert_eq!(session_duration(0), 15);
        assert_eq!(session_duration(4), 35);
        assert_eq!(session_duration(9), 60);
        assert_eq!(session_duration(20), 60);
    }

    #[test]
    fn test_follow_up_questions() {
        let budget = follow_up_questions("Budget for Q3", "We have numbers");
        assert_eq!(budget.len(), 3);
        assert_eq!(budget[0], "Can you provide more specific cost breakdowns?");

        let hedged = follow_up_questions("Lunch", "Maybe next week");
        assert_eq!(hedged[0], "Can you provide more concrete evidence for that?");

        assert!(follow_up_questions("Lunch", "Sure").is_empty());
    }

    #[test]
    fn test_persona_reply_follows_role_and_context() {
        let reply = persona_reply("CFO", "Q3 Budget review", "a new tool");
        assert!(reply.starts_with("As CFO, I need to see concrete numbers. a new tool"));

        let reply = persona_reply("Engineering Lead", "hiring", "the migration");
        assert!(reply.starts_with("I see the value in the migration"));

        // Customer matches the first Sales Director rule before market/revenue
        let reply = persona_reply("Sales Director", "customer revenue", "bundling");
        assert!(reply.starts_with("From a sales perspective, bundling"));

        let reply = persona_reply("Legal Counsel", "budget", "the plan");
        assert!(reply.starts_with("Thank you for the plan."));
    }

    #[test]
    fn test_filler_words_counted() {
        let words = normalized_words("Um, so, like, we basically um shipped it. Like really.");
        let report = filler_words(&words);
        assert_eq!(report.count, 5);
        assert_eq!(report.words, vec!["um", "like", "basically"]);
        assert_eq!(report.feedback, "Good control of filler words.");
    }

    #[test]
    fn test_good_delivery() {
        // 12 words per sentence, 150 words per minute
        let sentence = "We will definitely ship the new onboarding flow before the quarter ends. ";
        let transcript = sentence.repeat(5);
        let feedback = analyze_delivery(&transcript, 24.0);

        assert_eq!(feedback.pacing.score, 0.9);
        assert_eq!(feedback.clarity.score, 0.9);
        assert!(feedback.confidence.score > 0.8);
        assert!(feedback.overall.summary.starts_with("Excellent delivery"));
        assert!(feedback.overall.recommendations.is_empty());
    }

    #[test]
    fn test_hesitant_delivery() {
        let transcript = "Maybe. Perhaps. It could work. Possibly.";
        let feedback = analyze_delivery(transcript, 60.0);

        assert_eq!(feedback.pacing.score, 0.6);
        assert_eq!(feedback.clarity.score, 0.7);
        assert_eq!(feedback.confidence.score, 0.3);
        assert!(feedback.overall.summary.starts_with("Delivery needs improvement"));
        assert_eq!(feedback.overall.recommendations.len(), 5);
    }

    #[test]
    fn test_feedback_entries_cover_all_categories() {
        let feedback = analyze_delivery("We are confident in this plan.", 3.0);
        let entries = feedback_entries(Uuid::new_v4(), &feedback);

        let categories: Vec<&str> = entries.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["pacing", "clarity", "filler_words", "confidence", "overall"]
        );
        assert!(entries[2].score.is_none());
        assert!(entries.iter().all(|e| e.kind == "delivery"));
    }
}
