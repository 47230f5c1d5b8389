use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an idea. The review workflow only ever moves forward:
/// submitted/organized/under_review -> approved or rejected, and an
/// approved idea may later become scheduled or completed. All transitions
/// are written by the backend or the direction flow, never inferred here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    Draft,
    Submitted,
    Organized,
    UnderReview,
    Approved,
    Rejected,
    Scheduled,
    Completed,
}

impl IdeaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IdeaStatus::Draft => "draft",
            IdeaStatus::Submitted => "submitted",
            IdeaStatus::Organized => "organized",
            IdeaStatus::UnderReview => "under_review",
            IdeaStatus::Approved => "approved",
            IdeaStatus::Rejected => "rejected",
            IdeaStatus::Scheduled => "scheduled",
            IdeaStatus::Completed => "completed",
        }
    }

    /// Statuses the direction panel still has to rule on.
    pub fn is_pending_review(self) -> bool {
        matches!(
            self,
            IdeaStatus::Submitted | IdeaStatus::Organized | IdeaStatus::UnderReview
        )
    }
}

/// The two rating axes. Each maps to its own column on the votes table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteKind {
    Quality,
    Priority,
}

impl VoteKind {
    pub fn column(self) -> &'static str {
        match self {
            VoteKind::Quality => "quality_rating",
            VoteKind::Priority => "priority_rating",
        }
    }
}

/// Outcome of a direction review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Rejected => "rejected",
        }
    }

    pub fn status(self) -> IdeaStatus {
        match self {
            Verdict::Approved => IdeaStatus::Approved,
            Verdict::Rejected => IdeaStatus::Rejected,
        }
    }

    /// Notification type written for the idea's author.
    pub fn notification_kind(self) -> &'static str {
        match self {
            Verdict::Approved => "idea_approved",
            Verdict::Rejected => "idea_rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub department: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub is_direction: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

/// An idea row. `author` and `category` are only present on joined reads;
/// plain selects leave them `None`.
///
/// `quality_score`, `priority_score` and the three counts are aggregates
/// owned by the backend. The only local write path into them is the
/// merge-patch applied after a refetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub ai_summary: Option<String>,
    pub ai_tags: Option<Vec<String>>,
    pub quality_score: f64,
    pub priority_score: f64,
    pub quality_votes_count: i32,
    pub priority_votes_count: i32,
    pub comments_count: i32,
    pub status: IdeaStatus,
    pub review_cycle: Option<i32>,
    pub direction_verdict: Option<String>,
    pub direction_motivation: Option<String>,
    pub direction_reviewed_by: Option<Uuid>,
    pub direction_reviewed_at: Option<DateTime<Utc>>,
    pub scheduled_quarter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<Profile>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Idea {
    /// Ranking key used by the direction panel (sum of both averages).
    pub fn combined_score(&self) -> f64 {
        self.quality_score + self.priority_score
    }
}

/// One row per (idea, user); uniqueness is enforced by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub user_id: Uuid,
    pub quality_rating: Option<i16>,
    pub priority_rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    pub fn rating(&self, kind: VoteKind) -> Option<i16> {
        match kind {
            VoteKind::Quality => self.quality_rating,
            VoteKind::Priority => self.priority_rating,
        }
    }

    pub fn set_rating(&mut self, kind: VoteKind, rating: i16) {
        match kind {
            VoteKind::Quality => self.quality_rating = Some(rating),
            VoteKind::Priority => self.priority_rating = Some(rating),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub author_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub content: String,
    pub is_direction_reply: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<Profile>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub idea_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewCycle {
    pub id: i64,
    pub cycle_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub review_date: NaiveDate,
    pub status: String,
}

/// Lazily created on first sign-in when the profile row is missing.
#[derive(Clone, Debug, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub department: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewIdea {
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub status: IdeaStatus,
}

/// Insert payload carrying exactly one rating axis.
#[derive(Clone, Debug, Serialize)]
pub struct NewVote {
    pub idea_id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_rating: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_rating: Option<i16>,
}

impl NewVote {
    pub fn new(idea_id: Uuid, user_id: Uuid, kind: VoteKind, rating: i16) -> Self {
        let mut payload = Self {
            idea_id,
            user_id,
            quality_rating: None,
            priority_rating: None,
        };
        match kind {
            VoteKind::Quality => payload.quality_rating = Some(rating),
            VoteKind::Priority => payload.priority_rating = Some(rating),
        }
        payload
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewComment {
    pub idea_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_anonymous: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub idea_id: Option<Uuid>,
}

/// The single atomic update a direction decision writes to an idea.
/// `scheduled_quarter` is serialized even when `None` so a rejection
/// clears any previously set quarter.
#[derive(Clone, Debug, Serialize)]
pub struct DecisionUpdate {
    pub status: IdeaStatus,
    pub direction_verdict: String,
    pub direction_motivation: String,
    pub direction_reviewed_by: Uuid,
    pub direction_reviewed_at: DateTime<Utc>,
    pub scheduled_quarter: Option<String>,
    pub review_cycle: Option<i32>,
}

/// The four backend-maintained aggregates refetched after a vote.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct IdeaScores {
    pub quality_score: f64,
    pub priority_score: f64,
    pub quality_votes_count: i32,
    pub priority_votes_count: i32,
}

/// Merge patch for a cached idea. Unset fields are left untouched.
/// `scheduled_quarter` is doubly optional: the outer level says whether
/// to touch the field, the inner one is the new (nullable) value.
#[derive(Clone, Debug, Default)]
pub struct IdeaPatch {
    pub status: Option<IdeaStatus>,
    pub quality_score: Option<f64>,
    pub priority_score: Option<f64>,
    pub quality_votes_count: Option<i32>,
    pub priority_votes_count: Option<i32>,
    pub comments_count: Option<i32>,
    pub review_cycle: Option<i32>,
    pub direction_verdict: Option<String>,
    pub direction_motivation: Option<String>,
    pub direction_reviewed_by: Option<Uuid>,
    pub direction_reviewed_at: Option<DateTime<Utc>>,
    pub scheduled_quarter: Option<Option<String>>,
}

impl IdeaPatch {
    pub fn apply(&self, idea: &mut Idea) {
        if let Some(status) = self.status {
            idea.status = status;
        }
        if let Some(score) = self.quality_score {
            idea.quality_score = score;
        }
        if let Some(score) = self.priority_score {
            idea.priority_score = score;
        }
        if let Some(count) = self.quality_votes_count {
            idea.quality_votes_count = count;
        }
        if let Some(count) = self.priority_votes_count {
            idea.priority_votes_count = count;
        }
        if let Some(count) = self.comments_count {
            idea.comments_count = count;
        }
        if let Some(cycle) = self.review_cycle {
            idea.review_cycle = Some(cycle);
        }
        if let Some(verdict) = &self.direction_verdict {
            idea.direction_verdict = Some(verdict.clone());
        }
        if let Some(motivation) = &self.direction_motivation {
            idea.direction_motivation = Some(motivation.clone());
        }
        if let Some(reviewer) = self.direction_reviewed_by {
            idea.direction_reviewed_by = Some(reviewer);
        }
        if let Some(reviewed_at) = self.direction_reviewed_at {
            idea.direction_reviewed_at = Some(reviewed_at);
        }
        if let Some(quarter) = &self.scheduled_quarter {
            idea.scheduled_quarter = quarter.clone();
        }
    }
}

impl From<IdeaScores> for IdeaPatch {
    fn from(scores: IdeaScores) -> Self {
        IdeaPatch {
            quality_score: Some(scores.quality_score),
            priority_score: Some(scores.priority_score),
            quality_votes_count: Some(scores.quality_votes_count),
            priority_votes_count: Some(scores.priority_votes_count),
            ..IdeaPatch::default()
        }
    }
}

impl From<&DecisionUpdate> for IdeaPatch {
    fn from(update: &DecisionUpdate) -> Self {
        IdeaPatch {
            status: Some(update.status),
            direction_verdict: Some(update.direction_verdict.clone()),
            direction_motivation: Some(update.direction_motivation.clone()),
            direction_reviewed_by: Some(update.direction_reviewed_by),
            direction_reviewed_at: Some(update.direction_reviewed_at),
            scheduled_quarter: Some(update.scheduled_quarter.clone()),
            review_cycle: update.review_cycle,
            ..IdeaPatch::default()
        }
    }
}
