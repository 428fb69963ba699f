//! Application shell: loads the configuration, bootstraps the session and
//! hosts the projects page.
//!
//! # Design
//! - The screen stays in a shared cell. Page loads and dialog submissions
//!   run as issue, fetch and apply steps; each step borrows the screen only
//!   briefly and the page is redrawn between steps, so loading and
//!   submitting states reach the user.
//! - Commands run one at a time. Commands raised while one is running are
//!   queued; consecutive search edits collapse into the latest one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gloo_net::http::Request;
use tracing::{Level, info, warn};
use vigil_config::{CONFIG_DOCUMENT, ConsoleConfig};
use vigil_core::Services;
use vigil_telemetry::{DEFAULT_LOG_LEVEL, LineSink, init_sink_logging};
use yew::prelude::*;

use crate::features::projects::error::ActionError;
use crate::features::projects::screen::{PageFetch, ProjectsScreen};
use crate::features::projects::view::{Command, apply_command, render};
use crate::i18n::TranslationBundle;
use crate::services::api::ApiClient;

type ScreenCell = Rc<RefCell<Option<ProjectsScreen>>>;

#[derive(Default)]
struct Pending {
    commands: VecDeque<Command>,
    running: bool,
}

impl Pending {
    fn push(&mut self, command: Command) {
        if matches!(command, Command::Search(_))
            && matches!(self.commands.back(), Some(Command::Search(_)))
        {
            self.commands.pop_back();
        }
        self.commands.push_back(command);
    }
}

fn write_console(level: Level, line: &str) {
    let line = line.into();
    if level == Level::ERROR {
        web_sys::console::error_1(&line);
    } else if level == Level::WARN {
        web_sys::console::warn_1(&line);
    } else if level == Level::INFO {
        web_sys::console::info_1(&line);
    } else {
        web_sys::console::debug_1(&line);
    }
}

fn install_logging(level: &str) {
    if let Err(err) = init_sink_logging(level, LineSink::new(write_console)) {
        web_sys::console::warn_1(&format!("console logging disabled: {err}").into());
    }
}

async fn load_config() -> Result<ConsoleConfig, String> {
    let response = Request::get(CONFIG_DOCUMENT)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let raw = if response.status() == 404 {
        None
    } else if response.ok() {
        Some(response.text().await.map_err(|err| err.to_string())?)
    } else {
        return Err(format!(
            "{CONFIG_DOCUMENT}: {} {}",
            response.status(),
            response.status_text()
        ));
    };
    ConsoleConfig::from_optional_json(raw.as_deref()).map_err(|err| err.to_string())
}

async fn bootstrap(config: &ConsoleConfig) -> Result<ProjectsScreen, String> {
    let user = ApiClient::new(config.api_base_url.clone(), String::new())
        .current_user()
        .await
        .map_err(|err| err.to_string())?;
    let client = Rc::new(ApiClient::new(config.api_base_url.clone(), user.login.clone()));
    ProjectsScreen::open(Services::from_backend(client), user, config)
        .await
        .map_err(|err| err.to_string())
}

#[derive(Clone)]
struct Driver {
    screen: ScreenCell,
    pending: Rc<RefCell<Pending>>,
    redraw: UseForceUpdateHandle,
}

impl Driver {
    fn dispatch(&self, command: Command) {
        {
            let mut pending = self.pending.borrow_mut();
            pending.push(command);
            if pending.running {
                return;
            }
            pending.running = true;
        }
        let driver = self.clone();
        yew::platform::spawn_local(async move {
            loop {
                let next = driver.pending.borrow_mut().commands.pop_front();
                let Some(command) = next else {
                    break;
                };
                if let Err(err) = driver.run(command).await
                    && !err.is_silent()
                {
                    warn!(error = %err, "projects command failed");
                }
                driver.redraw.force_update();
            }
            driver.pending.borrow_mut().running = false;
        });
    }

    fn with_screen<T>(
        &self,
        step: impl FnOnce(&mut ProjectsScreen) -> Result<Option<T>, ActionError>,
    ) -> Result<Option<T>, ActionError> {
        self.screen.borrow_mut().as_mut().map_or(Ok(None), step)
    }

    fn services(&self) -> Option<Services> {
        self.screen
            .borrow()
            .as_ref()
            .map(|screen| screen.services().clone())
    }

    async fn run(&self, command: Command) -> Result<(), ActionError> {
        match command {
            Command::Filter(update) => {
                let fetch = self.with_screen(|screen| {
                    Ok(screen.update_filters(update)?.then(|| screen.begin_reload()))
                })?;
                self.run_page(fetch).await
            }
            Command::Search(text) => {
                let fetch = self.with_screen(|screen| {
                    Ok(screen.update_search(&text).then(|| screen.begin_reload()))
                })?;
                self.run_page(fetch).await
            }
            Command::LoadMore => {
                let fetch = self.with_screen(|screen| Ok(screen.begin_load_more()))?;
                self.run_page(fetch).await
            }
            Command::Submit => self.run_submit().await,
            other => self.run_whole(other).await,
        }
    }

    async fn run_page(&self, fetch: Option<PageFetch>) -> Result<(), ActionError> {
        let (Some(fetch), Some(services)) = (fetch, self.services()) else {
            return Ok(());
        };
        self.redraw.force_update();
        let response = fetch.send(&services).await;
        self.with_screen(|screen| screen.apply_page(&fetch.request, response).map(Some))?;
        Ok(())
    }

    async fn run_submit(&self) -> Result<(), ActionError> {
        let submission = self.with_screen(|screen| screen.begin_submit().map(Some))?;
        let (Some(submission), Some(services)) = (submission, self.services()) else {
            return Ok(());
        };
        self.redraw.force_update();
        let result = submission.send(&services).await;
        let reload = self.with_screen(|screen| {
            screen
                .finish_submit(result)
                .map(|(_, reload)| Some(reload))
        })?;
        self.redraw.force_update();
        self.run_page(reload).await
    }

    // Menu and dialog openers only await catalogue lookups; the screen is
    // lent to them for the duration.
    async fn run_whole(&self, command: Command) -> Result<(), ActionError> {
        let taken = self.screen.borrow_mut().take();
        let Some(mut screen) = taken else {
            return Ok(());
        };
        let result = apply_command(&mut screen, command).await;
        *self.screen.borrow_mut() = Some(screen);
        result
    }
}

#[derive(Properties, PartialEq)]
struct ConsoleProps {
    config: Rc<ConsoleConfig>,
    #[prop_or_default]
    config_error: Option<String>,
}

#[function_component(ConsoleApp)]
fn console_app(props: &ConsoleProps) -> Html {
    let bundle = use_memo(
        |locale: &String| TranslationBundle::for_code(locale),
        props.config.locale.clone(),
    );
    let screen: ScreenCell = use_mut_ref(|| None);
    let pending = use_mut_ref(Pending::default);
    let startup_error = use_state(|| props.config_error.clone());
    let force_update = use_force_update();

    {
        let config = props.config.clone();
        let screen = screen.clone();
        let startup_error = startup_error.clone();
        let force_update = force_update.clone();
        let failed = props.config_error.is_some();
        use_effect_with_deps(
            move |_| {
                if !failed {
                    yew::platform::spawn_local(async move {
                        match bootstrap(&config).await {
                            Ok(opened) => {
                                *screen.borrow_mut() = Some(opened);
                                force_update.force_update();
                            }
                            Err(message) => {
                                warn!(error = %message, "console bootstrap failed");
                                startup_error.set(Some(message));
                            }
                        }
                    });
                }
                || ()
            },
            (),
        );
    }

    let on_command = {
        let driver = Driver {
            screen: screen.clone(),
            pending,
            redraw: force_update,
        };
        Callback::from(move |command: Command| driver.dispatch(command))
    };

    if let Some(message) = (*startup_error).as_ref() {
        return html! {
            <main class="console">
                <div class="alert alert-error" role="alert">{message.clone()}</div>
            </main>
        };
    }
    let body = screen.borrow().as_ref().map_or_else(
        || html! { <p class="loading">{bundle.text("projects_management.loading", "Loading")}</p> },
        |current| render(current, &bundle, &on_command),
    );
    html! {
        <main class="console">{body}</main>
    }
}

fn mount(props: ConsoleProps) {
    let root = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("root"));
    if let Some(root) = root {
        yew::Renderer::<ConsoleApp>::with_root_and_props(root, props).render();
    } else {
        yew::Renderer::<ConsoleApp>::with_props(props).render();
    }
}

/// Load `vigil.json`, install browser logging and mount the console on
/// `#root` (or the body when the element is absent).
pub fn run_app() {
    console_error_panic_hook::set_once();
    yew::platform::spawn_local(async {
        let props = match load_config().await {
            Ok(config) => {
                install_logging(&config.logging.level);
                info!(
                    github_provisioning = config.features.github_provisioning,
                    page_size = config.page_size,
                    "console configuration loaded"
                );
                ConsoleProps {
                    config: Rc::new(config),
                    config_error: None,
                }
            }
            Err(message) => {
                install_logging(DEFAULT_LOG_LEVEL);
                warn!(error = %message, "console configuration rejected");
                ConsoleProps {
                    config: Rc::new(ConsoleConfig::default()),
                    config_error: Some(message),
                }
            }
        };
        mount(props);
    });
}
