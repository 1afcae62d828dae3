use tick::core::projection::FilterMode;
use tick::core::store::Completion;
use tick::core::task::TaskId;
use tick::error::TaskError;
use tick::remote::Session;
use tick::remote::auth::UserSummary;
use tick::remote::keyring::StoredSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub enum Message {
    // Session
    SessionLoaded(Result<StoredSession, TaskError>),
    SetAuthMode(AuthMode),
    AuthInput(AuthField, String),
    SubmitAuth,
    AuthCompleted(Result<(Session, Option<UserSummary>), TaskError>),
    Logout,
    LoggedOut(Result<(), TaskError>),

    // Tasks
    Refresh,
    NewTaskInput(String),
    SubmitNewTask,
    ToggleTask(TaskId),
    DeleteTask(TaskId),
    TaskSettled(Completion),

    // View state
    SearchChanged(String),
    SetFilter(FilterMode),
    DismissError,

    // Settings
    SetApiUrl(String),
    ApplyApiUrl,
    ToggleDebugLogging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Todo,
    Profile,
    Settings,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Todo => "To-Do List",
            Self::Profile => "Profile",
            Self::Settings => "Settings",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Todo => "object-select-symbolic",
            Self::Profile => "avatar-default-symbolic",
            Self::Settings => "emblem-system-symbolic",
        }
    }

    /// Pages that render the task collection and refetch it on entry.
    pub fn shows_tasks(&self) -> bool {
        matches!(self, Self::Todo | Self::Profile)
    }

    pub const ALL: &'static [Page] = &[Page::Todo, Page::Profile, Page::Settings];
}
