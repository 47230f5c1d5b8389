use crate::backend::Backend;
use crate::domain::models::{
    Comment, DecisionUpdate, Idea, IdeaPatch, IdeaStatus, NewComment, NewIdea, NewNotification,
    NewVote, Profile, ProfileUpdate, Verdict, Vote, VoteKind,
};
use crate::gateway::GatewayError;
use crate::routes::Route;
use crate::store::SharedStore;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ActionError {
    /// The same flow is already in flight; the request was suppressed
    /// before anything hit the wire.
    #[error("operation already in progress")]
    Busy,
    #[error("not signed in")]
    NotSignedIn,
    /// Client-side convenience check only; the backend's row policies
    /// are the real boundary.
    #[error("not permitted")]
    Forbidden,
    #[error("validation failed: {0}")]
    Validation(&'static str),
    #[error(transparent)]
    Backend(#[from] GatewayError),
}

/// Releases the busy flag on every exit path, including early `?`
/// returns. The flag must never survive a failed request.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn acquire(flag: &AtomicBool) -> Result<BusyGuard<'_>, ActionError> {
    flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .map(|_| BusyGuard(flag))
        .map_err(|_| ActionError::Busy)
}

/// Everything the idea detail screen renders in one load.
#[derive(Clone, Debug)]
pub struct IdeaDetail {
    pub idea: Idea,
    pub comments: Vec<Comment>,
    pub votes: Vec<Vote>,
}

/// The mutation surface the screens call: vote, comment, submit,
/// decide, profile edit and notification reads. Every operation writes
/// through the backend first and then optimistically patches the
/// session store; a failed request leaves the local state untouched.
pub struct Actions {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    route: Arc<RwLock<Route>>,
    voting: AtomicBool,
    commenting: AtomicBool,
    submitting: AtomicBool,
    deciding: AtomicBool,
    saving_profile: AtomicBool,
}

impl Actions {
    pub fn new(backend: Arc<dyn Backend>, store: SharedStore, route: Arc<RwLock<Route>>) -> Self {
        Self {
            backend,
            store,
            route,
            voting: AtomicBool::new(false),
            commenting: AtomicBool::new(false),
            submitting: AtomicBool::new(false),
            deciding: AtomicBool::new(false),
            saving_profile: AtomicBool::new(false),
        }
    }

    async fn current_user(&self) -> Result<Profile, ActionError> {
        self.store
            .read()
            .await
            .user()
            .cloned()
            .ok_or(ActionError::NotSignedIn)
    }

    async fn navigate(&self, route: Route) {
        tracing::info!(route = %route, "navigating");
        *self.route.write().await = route;
    }

    /// Casts or updates this user's rating on one axis, then refetches
    /// the idea's aggregates. The averages are never computed here; the
    /// cached idea gets whatever the backend reports.
    pub async fn cast_vote(
        &self,
        idea_id: Uuid,
        kind: VoteKind,
        rating: i16,
    ) -> Result<(), ActionError> {
        let _guard = acquire(&self.voting)?;
        let user = self.current_user().await?;

        let existing = self.store.read().await.user_vote(idea_id).cloned();
        match existing {
            Some(vote) => {
                self.backend
                    .update_vote_rating(vote.id, kind, rating)
                    .await?;
                // Merge into the cached row so the other axis survives.
                let mut merged = vote;
                merged.set_rating(kind, rating);
                self.store.write().await.set_vote(idea_id, merged);
            }
            None => {
                let row = self
                    .backend
                    .insert_vote(&NewVote::new(idea_id, user.id, kind, rating))
                    .await?;
                self.store.write().await.set_vote(idea_id, row);
            }
        }

        let scores = self.backend.fetch_idea_scores(idea_id).await?;
        self.store
            .write()
            .await
            .update_idea(idea_id, &IdeaPatch::from(scores));
        tracing::info!(idea = %idea_id, "vote recorded");
        Ok(())
    }

    /// Posts a comment and bumps the cached idea's comment count by
    /// exactly one. The count is a display hint; the next full reload
    /// reconciles it with the server-side aggregate.
    pub async fn post_comment(
        &self,
        idea_id: Uuid,
        content: &str,
        anonymous: bool,
    ) -> Result<Comment, ActionError> {
        let _guard = acquire(&self.commenting)?;
        let user = self.current_user().await?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ActionError::Validation("comment must not be empty"));
        }

        let comment = self
            .backend
            .insert_comment(&NewComment {
                idea_id,
                author_id: user.id,
                content: content.to_string(),
                is_anonymous: anonymous,
            })
            .await?;

        let mut store = self.store.write().await;
        if let Some(count) = store.idea(idea_id).map(|idea| idea.comments_count) {
            store.update_idea(
                idea_id,
                &IdeaPatch {
                    comments_count: Some(count + 1),
                    ..IdeaPatch::default()
                },
            );
        }
        Ok(comment)
    }

    /// Submits a new idea. Status is forced to `submitted` regardless of
    /// what the caller might try; the created row is prepended to the
    /// list and navigation moves to its detail screen.
    pub async fn submit_idea(
        &self,
        title: &str,
        description: &str,
        category_id: Option<Uuid>,
        anonymous: bool,
    ) -> Result<Idea, ActionError> {
        let _guard = acquire(&self.submitting)?;
        let user = self.current_user().await?;
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() {
            return Err(ActionError::Validation("title must not be empty"));
        }
        if description.is_empty() {
            return Err(ActionError::Validation("description must not be empty"));
        }

        let idea = self
            .backend
            .insert_idea(&NewIdea {
                author_id: user.id,
                title: title.to_string(),
                description: description.to_string(),
                category_id,
                is_anonymous: anonymous,
                status: IdeaStatus::Submitted,
            })
            .await?;

        self.store.write().await.add_idea(idea.clone());
        tracing::info!(idea = %idea.id, "idea submitted");
        self.navigate(Route::IdeaDetail(idea.id)).await;
        Ok(idea)
    }

    /// Records a direction decision: one atomic idea update, then a
    /// best-effort notification to the author. A notification failure is
    /// logged and accepted; the decision itself already stands.
    pub async fn decide_idea(
        &self,
        idea_id: Uuid,
        verdict: Verdict,
        motivation: &str,
        scheduled_quarter: Option<&str>,
    ) -> Result<(), ActionError> {
        let _guard = acquire(&self.deciding)?;
        let user = self.current_user().await?;
        if !user.is_direction {
            return Err(ActionError::Forbidden);
        }
        let motivation = motivation.trim();
        if motivation.is_empty() {
            return Err(ActionError::Validation("motivation must not be empty"));
        }

        let (idea_title, idea_author, review_cycle) = {
            let store = self.store.read().await;
            let idea = store
                .idea(idea_id)
                .ok_or(ActionError::Validation("unknown idea"))?;
            (
                idea.title.clone(),
                idea.author_id,
                store.current_cycle().map(|c| c.cycle_number),
            )
        };

        let update = DecisionUpdate {
            status: verdict.status(),
            direction_verdict: verdict.as_str().to_string(),
            direction_motivation: motivation.to_string(),
            direction_reviewed_by: user.id,
            direction_reviewed_at: Utc::now(),
            scheduled_quarter: match verdict {
                Verdict::Approved => scheduled_quarter.map(str::to_string),
                Verdict::Rejected => None,
            },
            review_cycle,
        };
        self.backend.apply_decision(idea_id, &update).await?;
        tracing::info!(idea = %idea_id, verdict = verdict.as_str(), "decision recorded");

        // Second, independent write. Anonymous ideas carry no author to
        // notify.
        if let Some(author_id) = idea_author {
            let notification = NewNotification {
                user_id: author_id,
                kind: verdict.notification_kind().to_string(),
                title: match verdict {
                    Verdict::Approved => "Your idea was approved!".to_string(),
                    Verdict::Rejected => "An update on your idea".to_string(),
                },
                message: Some(match verdict {
                    Verdict::Approved => {
                        format!("\"{idea_title}\" was approved by the direction.")
                    }
                    Verdict::Rejected => format!(
                        "\"{idea_title}\" was not approved this time. Read the motivation."
                    ),
                }),
                idea_id: Some(idea_id),
            };
            if let Err(err) = self.backend.insert_notification(&notification).await {
                tracing::warn!(
                    idea = %idea_id,
                    "decision saved but author notification failed: {err}"
                );
            }
        }

        self.store
            .write()
            .await
            .update_idea(idea_id, &IdeaPatch::from(&update));
        Ok(())
    }

    /// Detail-screen read path: the idea joined with author/category,
    /// its comments oldest-first, and the votes cast on it.
    pub async fn load_idea(&self, idea_id: Uuid) -> Result<IdeaDetail, ActionError> {
        let idea = self.backend.fetch_idea(idea_id).await?;
        let comments = self.backend.fetch_comments(idea_id).await?;
        let votes = self.backend.fetch_votes_for_idea(idea_id).await?;
        Ok(IdeaDetail {
            idea,
            comments,
            votes,
        })
    }

    /// Profile edit: trimmed name, empty department stored as null.
    pub async fn save_profile(
        &self,
        full_name: &str,
        department: &str,
    ) -> Result<(), ActionError> {
        let _guard = acquire(&self.saving_profile)?;
        let user = self.current_user().await?;
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ActionError::Validation("name must not be empty"));
        }
        let department = department.trim();

        let updated = self
            .backend
            .update_profile(
                user.id,
                &ProfileUpdate {
                    full_name: full_name.to_string(),
                    department: if department.is_empty() {
                        None
                    } else {
                        Some(department.to_string())
                    },
                },
            )
            .await?;
        self.store.write().await.set_user(Some(updated));
        Ok(())
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<(), ActionError> {
        self.backend.mark_notification_read(id).await?;
        self.store.write().await.mark_as_read(id);
        Ok(())
    }

    /// One filtered update for all unread ids; a no-op when everything
    /// is already read.
    pub async fn mark_all_notifications_read(&self) -> Result<(), ActionError> {
        let unread: Vec<Uuid> = self
            .store
            .read()
            .await
            .notifications()
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();
        if unread.is_empty() {
            return Ok(());
        }
        self.backend.mark_notifications_read(&unread).await?;
        self.store.write().await.mark_all_as_read();
        Ok(())
    }
}
