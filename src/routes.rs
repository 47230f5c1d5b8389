use std::fmt;
use uuid::Uuid;

/// The screens the client navigates between. Navigation is held in one
/// shared slot owned by the session controller; views and actions write
/// to it instead of steering routing from inside render code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    Home,
    NewIdea,
    IdeaDetail(Uuid),
    Direction,
    Notifications,
    Profile,
    MyIdeas,
    Approved,
    Rejected,
}

impl Route {
    /// Public routes render without a session check.
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Register | Route::ForgotPassword)
    }

    pub fn path(self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::ForgotPassword => "/forgot-password".into(),
            Route::Home => "/".into(),
            Route::NewIdea => "/ideas/new".into(),
            Route::IdeaDetail(id) => format!("/ideas/{id}"),
            Route::Direction => "/direction".into(),
            Route::Notifications => "/notifications".into(),
            Route::Profile => "/profile".into(),
            Route::MyIdeas => "/my-ideas".into(),
            Route::Approved => "/approved".into(),
            Route::Rejected => "/rejected".into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
