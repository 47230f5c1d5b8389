use crate::backend::Backend;
use crate::domain::models::NewProfile;
use crate::gateway::auth::{AuthEvent, Session};
use crate::gateway::GatewayError;
use crate::routes::Route;
use crate::store::SharedStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Session-check state machine. `SignedIn`, `SignedOut` and
/// `TokenRefreshed` arrive as edge events from the auth listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPhase {
    Uninitialized,
    CheckingSession,
    Authenticated,
    Unauthenticated,
}

/// Owns the authenticated session for the whole client: checks for an
/// existing session on startup, lazily creates the profile row, runs the
/// bootstrap fetches, and reacts to auth-state change events for as long
/// as it is started.
pub struct SessionController {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    route: Arc<RwLock<Route>>,
    phase: Arc<RwLock<AuthPhase>>,
    initialized: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn Backend>, store: SharedStore) -> Arc<Self> {
        Arc::new(Self {
            backend,
            store,
            route: Arc::new(RwLock::new(Route::Home)),
            phase: Arc::new(RwLock::new(AuthPhase::Uninitialized)),
            initialized: AtomicBool::new(false),
            listener: Mutex::new(None),
        })
    }

    /// Subscribes to auth-state change events. Idempotent: a second call
    /// while the listener runs is ignored, so the subscription exists at
    /// most once for the controller's lifetime. The task holds only a
    /// weak handle back to the controller and exits once it is dropped.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.listener.lock().expect("listener lock poisoned");
        if slot.is_some() {
            tracing::debug!("auth listener already running");
            return;
        }
        let mut receiver = self.backend.subscribe_auth();
        let weak: Weak<Self> = Arc::downgrade(self);
        *slot = Some(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let Some(controller) = weak.upgrade() else {
                            break;
                        };
                        controller.handle_event(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("auth listener lagged, dropped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("auth listener stopped");
        }));
    }

    /// Tears the listener down. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(handle) = self.listener.lock().expect("listener lock poisoned").take() {
            handle.abort();
        }
    }

    /// Mount-time entry point. Public routes render without a session
    /// check; protected routes go through session restore, profile
    /// lookup/creation and the bootstrap fetches. Re-entrant calls after
    /// the first are no-ops.
    pub async fn initialize(&self, initial: Route) {
        *self.route.write().await = initial;
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("initialize called twice, ignoring");
            return;
        }
        if initial.is_public() {
            tracing::debug!(route = %initial, "public route, skipping session check");
            return;
        }

        *self.phase.write().await = AuthPhase::CheckingSession;
        match self.backend.restore_session().await {
            Some(session) => {
                if self.establish(&session).await {
                    *self.phase.write().await = AuthPhase::Authenticated;
                } else {
                    *self.phase.write().await = AuthPhase::Unauthenticated;
                    self.navigate(Route::Login).await;
                }
            }
            None => {
                tracing::info!("no existing session");
                *self.phase.write().await = AuthPhase::Unauthenticated;
                self.navigate(Route::Login).await;
            }
        }
    }

    async fn navigate(&self, route: Route) {
        tracing::info!(route = %route, "navigating");
        *self.route.write().await = route;
    }

    pub async fn phase(&self) -> AuthPhase {
        *self.phase.read().await
    }

    pub async fn current_route(&self) -> Route {
        *self.route.read().await
    }

    /// Shared navigation slot, handed to the actions layer.
    pub fn route_handle(&self) -> Arc<RwLock<Route>> {
        Arc::clone(&self.route)
    }

    /// Render contract: block only while the session check is in flight
    /// on a protected route. Public routes always render.
    pub async fn blocks_render(&self) -> bool {
        *self.phase.read().await == AuthPhase::CheckingSession
            && !self.route.read().await.is_public()
    }

    async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                tracing::info!(user = %session.user.id, "auth event: signed in");
                if self.establish(&session).await {
                    *self.phase.write().await = AuthPhase::Authenticated;
                    // Leave the user where they are unless they were
                    // still sitting on a public screen.
                    if self.route.read().await.is_public() {
                        self.navigate(Route::Home).await;
                    }
                } else {
                    *self.phase.write().await = AuthPhase::Unauthenticated;
                }
            }
            AuthEvent::SignedOut => {
                tracing::info!("auth event: signed out");
                self.store.write().await.clear_session();
                *self.phase.write().await = AuthPhase::Unauthenticated;
                self.navigate(Route::Login).await;
            }
            AuthEvent::TokenRefreshed(session) => {
                // Permissions may have changed; re-read the profile but
                // leave the cached collections alone.
                match self.backend.fetch_profile(session.user.id).await {
                    Ok(profile) => self.store.write().await.set_user(Some(profile)),
                    Err(err) => {
                        tracing::warn!("profile refresh after token refresh failed: {err}")
                    }
                }
            }
        }
    }

    /// Profile lookup/creation plus the data bootstrap. Returns false
    /// when the profile cannot be loaded or created; bootstrap fetch
    /// failures are isolated per collection and never fail the session.
    async fn establish(&self, session: &Session) -> bool {
        let profile = match self.ensure_profile(session).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::error!(user = %session.user.id, "profile load failed: {err}");
                return false;
            }
        };
        self.store.write().await.set_user(Some(profile));
        self.bootstrap(session.user.id).await;
        true
    }

    async fn ensure_profile(
        &self,
        session: &Session,
    ) -> Result<crate::domain::models::Profile, GatewayError> {
        match self.backend.fetch_profile(session.user.id).await {
            Ok(profile) => Ok(profile),
            Err(err) if err.is_not_found() => {
                tracing::info!(user = %session.user.id, "profile missing, creating");
                let email = session.user.email.clone().unwrap_or_default();
                let full_name = session
                    .user
                    .user_metadata
                    .full_name
                    .clone()
                    .or_else(|| email.split('@').next().map(str::to_string))
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "User".to_string());
                self.backend
                    .create_profile(&NewProfile {
                        id: session.user.id,
                        email,
                        full_name,
                    })
                    .await
            }
            Err(err) => Err(err),
        }
    }

    /// The five bootstrap reads, issued concurrently. Each result
    /// patches its own slice of the store; a failed fetch is logged and
    /// skipped so the rest still populate.
    pub async fn bootstrap(&self, user_id: uuid::Uuid) {
        let (categories, ideas, votes, notifications, cycle) = futures::join!(
            self.backend.fetch_categories(),
            self.backend.fetch_ideas(),
            self.backend.fetch_votes_for_user(user_id),
            self.backend.fetch_notifications(user_id),
            self.backend.fetch_latest_cycle(),
        );

        let mut store = self.store.write().await;
        match categories {
            Ok(categories) => store.set_categories(categories),
            Err(err) => tracing::warn!("bootstrap: categories fetch failed: {err}"),
        }
        match ideas {
            Ok(ideas) => store.set_ideas(ideas),
            Err(err) => tracing::warn!("bootstrap: ideas fetch failed: {err}"),
        }
        match votes {
            Ok(votes) => store.set_user_votes(votes),
            Err(err) => tracing::warn!("bootstrap: votes fetch failed: {err}"),
        }
        match notifications {
            Ok(notifications) => store.set_notifications(notifications),
            Err(err) => tracing::warn!("bootstrap: notifications fetch failed: {err}"),
        }
        match cycle {
            Ok(cycle) => store.set_current_cycle(cycle),
            Err(err) => tracing::warn!("bootstrap: review cycle fetch failed: {err}"),
        }
        tracing::info!(
            ideas = store.ideas().len(),
            unread = store.unread_count(),
            "bootstrap complete"
        );
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}
