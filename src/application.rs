use cosmic::app::{Core, Task as CosmicTask};
use cosmic::iced::Length;
use cosmic::widget::{button, container, icon, nav_bar, row, text};
use cosmic::{Application, Element, executor};

use tick::config::TickConfig;
use tick::core::projection::ViewState;
use tick::core::store::{self, Request, TaskStore, Ticket};
use tick::error::TaskError;
use tick::remote::auth::{AuthClient, UserSummary};
use tick::remote::{HttpTaskClient, Session, keyring};

use crate::message::{AuthField, AuthMode, Message, Page};
use crate::pages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting on the keyring at startup.
    Checking,
    SignedOut,
    SignedIn,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            name: String::new(),
            email: String::new(),
            password: String::new(),
        }
    }
}

impl AuthForm {
    pub fn is_complete(&self) -> bool {
        let has_name = self.mode == AuthMode::Login || !self.name.trim().is_empty();
        has_name && !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

pub struct Tick {
    core: Core,
    nav_model: nav_bar::Model,
    config: TickConfig,
    cosmic_config: cosmic::cosmic_config::Config,
    page: Page,

    // Session
    session_state: SessionState,
    client: Option<HttpTaskClient>,
    user: Option<UserSummary>,
    auth_form: AuthForm,
    auth_busy: bool,

    // Tasks
    store: TaskStore,
    view_state: ViewState,
    new_task_input: String,

    // UI state
    api_url_input: String,
    error: Option<String>,
}

pub struct Flags {
    pub config: TickConfig,
    pub cosmic_config: cosmic::cosmic_config::Config,
}

impl Application for Tick {
    type Executor = executor::Default;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = tick::config::APP_ID;

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, CosmicTask<Self::Message>) {
        let config = flags.config;

        let mut nav_model = nav_bar::Model::default();
        for page in Page::ALL {
            nav_model
                .insert()
                .text(page.title())
                .icon(icon::from_name(page.icon_name()).icon())
                .data(*page);
        }
        nav_model.activate_position(0);

        let app = Self {
            core,
            nav_model,
            view_state: ViewState::new(config.default_filter),
            api_url_input: config.api_url.clone(),
            config,
            cosmic_config: flags.cosmic_config,
            page: Page::Todo,
            session_state: SessionState::Checking,
            client: None,
            user: None,
            auth_form: AuthForm::default(),
            auth_busy: false,
            store: TaskStore::new(),
            new_task_input: String::new(),
            error: None,
        };

        let task = app.load_session();
        (app, task)
    }

    fn nav_model(&self) -> Option<&nav_bar::Model> {
        match self.session_state {
            SessionState::SignedIn => Some(&self.nav_model),
            _ => None,
        }
    }

    fn on_nav_select(&mut self, id: nav_bar::Id) -> CosmicTask<Message> {
        let Some(page) = self.nav_model.data::<Page>(id).cloned() else {
            return CosmicTask::none();
        };
        self.nav_model.activate(id);
        if page == self.page {
            return CosmicTask::none();
        }

        let leaving = self.page;
        self.page = page;

        // The list is refetched on every visit; late answers for the old
        // visit are dropped.
        if leaving.shows_tasks() {
            self.store.detach();
        }
        if page.shows_tasks() && self.client.is_some() {
            return self.refresh();
        }
        CosmicTask::none()
    }

    fn header_end(&self) -> Vec<Element<'_, Message>> {
        if self.session_state != SessionState::SignedIn || !self.page.shows_tasks() {
            return Vec::new();
        }
        vec![
            row()
                .spacing(4)
                .push(
                    button::icon(icon::from_name("view-refresh-symbolic"))
                        .on_press(Message::Refresh),
                )
                .into(),
        ]
    }

    fn update(&mut self, message: Message) -> CosmicTask<Message> {
        match message {
            // --- Session ---
            Message::SessionLoaded(result) => match result {
                Ok(stored) if stored.session.is_authenticated() => {
                    self.user = stored.user;
                    return self.sign_in(stored.session);
                }
                Ok(_) => self.session_state = SessionState::SignedOut,
                Err(e) => {
                    log::warn!("Could not read session from keyring: {}", e);
                    self.session_state = SessionState::SignedOut;
                    self.error = Some(e.to_string());
                }
            },

            Message::SetAuthMode(mode) => {
                self.auth_form.mode = mode;
                self.error = None;
            }

            Message::AuthInput(field, value) => match field {
                AuthField::Name => self.auth_form.name = value,
                AuthField::Email => self.auth_form.email = value,
                AuthField::Password => self.auth_form.password = value,
            },

            Message::SubmitAuth => {
                if self.auth_busy || !self.auth_form.is_complete() {
                    return CosmicTask::none();
                }
                self.auth_busy = true;
                self.error = None;
                let server = self.config.server_key();
                let form = self.auth_form.clone();
                return CosmicTask::perform(
                    async move {
                        let client = AuthClient::new(&server)?;
                        let (token, user) = match form.mode {
                            AuthMode::Login => client.login(&form.email, &form.password).await?,
                            AuthMode::Signup => {
                                client.signup(&form.name, &form.email, &form.password).await?
                            }
                        };
                        let stored = keyring::store_session(&server, &token, user.as_ref()).await;
                        if let Err(e) = stored {
                            log::warn!("Session will not survive a restart: {}", e);
                        }
                        Ok::<_, TaskError>((Session::with_token(token), user))
                    },
                    |result| cosmic::Action::App(Message::AuthCompleted(result)),
                );
            }

            Message::AuthCompleted(result) => {
                self.auth_busy = false;
                match result {
                    Ok((session, user)) => {
                        self.auth_form = AuthForm::default();
                        self.user = user;
                        return self.sign_in(session);
                    }
                    Err(e) => {
                        log::warn!("Authentication failed: {}", e);
                        self.error = Some(e.to_string());
                    }
                }
            }

            Message::Logout => {
                self.sign_out(None);
                return self.forget_token();
            }

            Message::LoggedOut(result) => {
                if let Err(e) = result {
                    log::warn!("Failed to remove session from keyring: {}", e);
                }
            }

            // --- Tasks ---
            Message::Refresh => {
                if self.client.is_some() {
                    return self.refresh();
                }
            }

            Message::NewTaskInput(value) => {
                self.new_task_input = value;
            }

            Message::SubmitNewTask => match self.store.begin_add(&self.new_task_input) {
                Ok(ticket) => return self.dispatch(ticket),
                Err(e) => self.error = Some(e.to_string()),
            },

            Message::ToggleTask(id) => match self.store.begin_toggle(&id) {
                Ok(Some(ticket)) => return self.dispatch(ticket),
                Ok(None) => {}
                Err(e) => return self.surface(e),
            },

            Message::DeleteTask(id) => match self.store.begin_remove(&id) {
                Ok(Some(ticket)) => return self.dispatch(ticket),
                Ok(None) => {}
                Err(e) => return self.surface(e),
            },

            Message::TaskSettled(completion) => {
                if let (Request::Create(title), Ok(_)) =
                    (completion.ticket.request(), &completion.outcome)
                {
                    if self.new_task_input.trim() == title.as_str() {
                        self.new_task_input.clear();
                    }
                }

                let settled = self.store.settle(completion);
                if settled.discarded {
                    return CosmicTask::none();
                }

                let wants_refresh = settled.errors.iter().any(TaskError::suggests_refresh);
                let mut batch: Vec<CosmicTask<Message>> = settled
                    .follow_up
                    .into_iter()
                    .map(|ticket| self.dispatch(ticket))
                    .collect();

                if let Some(e) = settled.errors.into_iter().next() {
                    if e.requires_login() {
                        return self.surface(e);
                    }
                    batch.push(self.surface(e));
                    if wants_refresh {
                        batch.push(self.refresh());
                    }
                } else {
                    // A successful round trip clears a stale banner.
                    self.error = None;
                }

                return CosmicTask::batch(batch);
            }

            // --- View state ---
            Message::SearchChanged(q) => {
                self.view_state.search = q;
            }

            Message::SetFilter(mode) => {
                self.view_state.filter = mode;
            }

            Message::DismissError => {
                self.error = None;
            }

            // --- Settings ---
            Message::SetApiUrl(url) => {
                self.api_url_input = url;
            }

            Message::ApplyApiUrl => {
                let url = self.api_url_input.trim().trim_end_matches('/').to_string();
                if url.is_empty() || url == self.config.server_key() {
                    return CosmicTask::none();
                }
                log::info!("API URL changed to {}", url);
                self.config.api_url = url.clone();
                self.api_url_input = url;
                self.save_config();

                // Tokens are per server; look up the one for the new URL.
                self.sign_out(None);
                self.session_state = SessionState::Checking;
                return self.load_session();
            }

            Message::ToggleDebugLogging => {
                self.config.debug_logging = !self.config.debug_logging;
                tick::set_debug_logging(self.config.debug_logging);
                self.save_config();
            }
        }

        CosmicTask::none()
    }

    fn view(&self) -> Element<'_, Message> {
        match self.session_state {
            SessionState::Checking => container(text::body(crate::fl!("auth-checking")))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
            SessionState::SignedOut => {
                pages::login::login_view(&self.auth_form, self.auth_busy, self.error.as_deref())
            }
            SessionState::SignedIn => match self.page {
                Page::Todo => pages::todo::todo_view(
                    &self.store,
                    &self.view_state,
                    &self.new_task_input,
                    self.error.as_deref(),
                ),
                Page::Profile => pages::profile::profile_view(
                    self.user.as_ref(),
                    &self.store,
                    self.error.as_deref(),
                ),
                Page::Settings => pages::settings::settings_view(
                    &self.config,
                    &self.api_url_input,
                    self.user.as_ref(),
                    self.client.is_some(),
                ),
            },
        }
    }
}

impl Tick {
    fn load_session(&self) -> CosmicTask<Message> {
        let server = self.config.server_key();
        CosmicTask::perform(
            async move { keyring::load_session(&server).await },
            |result| cosmic::Action::App(Message::SessionLoaded(result)),
        )
    }

    fn sign_in(&mut self, session: Session) -> CosmicTask<Message> {
        match HttpTaskClient::with_timeout(
            &self.config.api_url,
            session,
            self.config.request_timeout(),
        ) {
            Ok(client) => {
                log::info!("Signed in to {}", self.config.server_key());
                self.client = Some(client);
                self.session_state = SessionState::SignedIn;
                self.error = None;
                self.store.reset();
                self.page = Page::Todo;
                self.nav_model.activate_position(0);
                self.refresh()
            }
            Err(e) => {
                log::error!("Failed to create task client: {}", e);
                self.session_state = SessionState::SignedOut;
                self.error = Some(e.to_string());
                CosmicTask::none()
            }
        }
    }

    fn sign_out(&mut self, reason: Option<String>) {
        self.store.reset();
        self.client = None;
        self.user = None;
        self.new_task_input.clear();
        self.session_state = SessionState::SignedOut;
        self.error = reason;
    }

    fn forget_token(&self) -> CosmicTask<Message> {
        let server = self.config.server_key();
        CosmicTask::perform(
            async move { keyring::delete_token(&server).await },
            |result| cosmic::Action::App(Message::LoggedOut(result)),
        )
    }

    fn refresh(&mut self) -> CosmicTask<Message> {
        let ticket = self.store.begin_refresh();
        self.dispatch(ticket)
    }

    /// Run a store ticket against the backend in the background.
    fn dispatch(&self, ticket: Ticket) -> CosmicTask<Message> {
        let Some(client) = self.client.clone() else {
            log::debug!("No task client; dropping {:?}", ticket.request());
            return CosmicTask::none();
        };
        CosmicTask::perform(
            async move { store::execute(&client, ticket).await },
            |completion| cosmic::Action::App(Message::TaskSettled(completion)),
        )
    }

    /// Show a task failure. A rejected credential ends the session.
    fn surface(&mut self, error: TaskError) -> CosmicTask<Message> {
        if error.requires_login() {
            log::info!("Session rejected by server, signing out");
            self.sign_out(Some(error.to_string()));
            return self.forget_token();
        }
        self.error = Some(error.to_string());
        CosmicTask::none()
    }

    fn save_config(&self) {
        use cosmic::cosmic_config::CosmicConfigEntry;
        if let Err(e) = self.config.write_entry(&self.cosmic_config) {
            log::error!("Failed to save config: {:?}", e);
        }
    }
}
