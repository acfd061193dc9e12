//! Fish Leaderboard entry point
//!
//! In the browser this wires the leaderboard to the page. Natively it is a
//! small CLI over a directory-backed store.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        Blob, BlobPropertyBag, Document, Element, File, HtmlAnchorElement, HtmlInputElement, Url,
        Window,
    };

    use fish_leaderboard::leaderboard::clear_shared;
    use fish_leaderboard::platform::LocalStorage;
    use fish_leaderboard::scheduler::TaskHandle;
    use fish_leaderboard::session::mirror_job;
    use fish_leaderboard::{
        Config, ExportFile, Leaderboard, LeaderboardRenderer, LeaderboardView, SessionId,
        SessionMirror,
    };

    /// Renders into the `#leaderboardList` container
    struct DomRenderer {
        document: Document,
        container: Element,
    }

    impl DomRenderer {
        fn try_render(&self, view: &LeaderboardView) -> Result<(), JsValue> {
            self.container.set_inner_html("");

            match view {
                LeaderboardView::Empty => {
                    let placeholder = self.document.create_element("div")?;
                    placeholder.set_attribute("style", "opacity:.7")?;
                    placeholder.set_text_content(Some(LeaderboardView::EMPTY_TEXT));
                    self.container.append_child(&placeholder)?;
                }
                LeaderboardView::Ranked(rows) => {
                    let list = self.document.create_element("ol")?;
                    for row in rows {
                        let item = self.document.create_element("li")?;
                        if row.live {
                            item.set_class_name("live");
                        }

                        let name = self.document.create_element("span")?;
                        name.set_class_name("name");
                        name.set_text_content(Some(&row.name));

                        let score = self.document.create_element("span")?;
                        score.set_class_name("score");
                        score.set_text_content(Some(&row.score.to_string()));

                        item.append_child(&name)?;
                        item.append_child(&score)?;
                        list.append_child(&item)?;
                    }
                    self.container.append_child(&list)?;
                }
            }
            Ok(())
        }
    }

    impl LeaderboardRenderer for DomRenderer {
        fn render(&mut self, view: &LeaderboardView) {
            if let Err(e) = self.try_render(view) {
                log::warn!("Leaderboard render error: {:?}", e);
            }
        }
    }

    /// `window.getFishScore()`, if the game defines it
    fn window_score() -> Option<f64> {
        let window = web_sys::window()?;
        let getter = js_sys::Reflect::get(&window, &JsValue::from_str("getFishScore")).ok()?;
        let getter = getter.dyn_into::<js_sys::Function>().ok()?;
        // A throwing getter counts as no score
        let value = getter.call0(&window).ok()?;
        let score = value
            .as_f64()
            .or_else(|| value.as_string().and_then(|s| s.trim().parse().ok()))
            .unwrap_or(0.0);
        Some(score)
    }

    fn confirm_dialog(message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn input_by_id(document: &Document, id: &str) -> Result<HtmlInputElement, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
            .dyn_into::<HtmlInputElement>()
            .map_err(JsValue::from)
    }

    /// Run `job` on a browser interval until the returned handle is cancelled
    fn schedule_interval(
        window: &Window,
        interval_ms: u32,
        mut job: impl FnMut() + 'static,
    ) -> Result<TaskHandle, JsValue> {
        let handle = TaskHandle::new();
        let interval_id = Rc::new(Cell::new(None::<i32>));

        let closure = {
            let handle = handle.clone();
            let interval_id = interval_id.clone();
            let window = window.clone();
            Closure::<dyn FnMut()>::new(move || {
                if handle.is_cancelled() {
                    if let Some(id) = interval_id.take() {
                        window.clear_interval_with_handle(id);
                    }
                    return;
                }
                job();
            })
        };
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            interval_ms as i32,
        )?;
        interval_id.set(Some(id));
        closure.forget();

        Ok(handle)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let storage = LocalStorage::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let config = Config::load(&storage);
        let container = document
            .get_element_by_id("leaderboardList")
            .ok_or_else(|| JsValue::from_str("missing #leaderboardList"))?;

        let renderer = DomRenderer {
            document: document.clone(),
            container,
        };
        let mut leaderboard = Leaderboard::new(Box::new(storage), config.clone())
            .with_provider(Box::new(window_score))
            .with_renderer(Box::new(renderer));
        if let Err(e) = leaderboard.init() {
            log::error!("Failed to seed leaderboard: {}", e);
            leaderboard.render();
        }
        let leaderboard = Rc::new(RefCell::new(leaderboard));

        let name_input = input_by_id(&document, "playerName")?;
        let score_input = input_by_id(&document, "playerScore")?;

        setup_submit(&document, leaderboard.clone(), name_input.clone(), score_input.clone());
        setup_export(&document, leaderboard.clone());
        setup_import(&document, leaderboard.clone())?;
        setup_clear(&document, leaderboard.clone());

        // Live score hint in the score field
        {
            let leaderboard = leaderboard.clone();
            let document = document.clone();
            let score_input = score_input.clone();
            schedule_interval(&window, config.poll_interval_ms, move || {
                let Some(score) = leaderboard.borrow().live_score() else {
                    return;
                };
                let input_node: &web_sys::Node = &score_input;
                let focused = document
                    .active_element()
                    .is_some_and(|el| el.is_same_node(Some(input_node)));
                if !focused {
                    score_input.set_placeholder(&score.to_string());
                }
            })?;
        }

        // Session row mirroring the in-game score
        let entropy = (js_sys::Math::random() * u32::MAX as f64) as u64;
        let seed = (js_sys::Date::now() as u64) ^ (entropy << 32);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mirror = SessionMirror::new(SessionId::generate(&mut rng));
        log::info!("Leaderboard session {}", mirror.session_id());
        let name_field = name_input.clone();
        let job = mirror_job(leaderboard.clone(), mirror, move || name_field.value());
        schedule_interval(&window, config.poll_interval_ms, job)?;

        log::info!("Leaderboard ready");
        Ok(())
    }

    fn setup_submit(
        document: &Document,
        leaderboard: Rc<RefCell<Leaderboard>>,
        name_input: HtmlInputElement,
        score_input: HtmlInputElement,
    ) {
        if let Some(btn) = document.get_element_by_id("submitScore") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut lb = leaderboard.borrow_mut();
                let score = lb.resolve_submitted_score(&score_input.value());
                if let Err(e) = lb.add_score(&name_input.value(), score) {
                    log::error!("Failed to save score: {}", e);
                    alert(&format!("Failed to save score: {}", e));
                    return;
                }
                name_input.set_value("");
                score_input.set_value("");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Offer `file` as a download, revoking the object URL after `ttl_ms`
    fn download(document: &Document, file: &ExportFile, ttl_ms: u32) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
        let options = BlobPropertyBag::new();
        options.set_type(ExportFile::MIME_TYPE);
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        let anchor = document
            .create_element("a")?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(JsValue::from)?;
        anchor.set_href(&url);
        anchor.set_download(&file.file_name);
        let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;
        body.append_child(&anchor)?;
        anchor.click();
        anchor.remove();

        let revoke = Closure::once(move || {
            let _ = Url::revoke_object_url(&url);
        });
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            revoke.as_ref().unchecked_ref(),
            ttl_ms as i32,
        )?;
        revoke.forget();
        Ok(())
    }

    fn setup_export(document: &Document, leaderboard: Rc<RefCell<Leaderboard>>) {
        if let Some(btn) = document.get_element_by_id("exportLb") {
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                // Released before the download click hands control to the browser
                let exported = {
                    let lb = leaderboard.borrow();
                    lb.export().map(|file| (file, lb.config().export_url_ttl_ms))
                };
                let result = exported
                    .map_err(|e| JsValue::from_str(&e.to_string()))
                    .and_then(|(file, ttl_ms)| download(&document, &file, ttl_ms));
                if let Err(e) = result {
                    log::error!("Export failed: {:?}", e);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    async fn read_text(file: &File) -> Result<String, JsValue> {
        let text = JsFuture::from(file.text()).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("file is not text"))
    }

    fn setup_import(document: &Document, leaderboard: Rc<RefCell<Leaderboard>>) -> Result<(), JsValue> {
        let file_input = input_by_id(document, "importFile")?;

        // The visible button just opens the hidden file picker
        if let Some(btn) = document.get_element_by_id("importLb") {
            let file_input = file_input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                file_input.click();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let input = file_input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let file = input.files().and_then(|files| files.get(0));
            // Reset so picking the same file again fires another change
            input.set_value("");
            let Some(file) = file else {
                return;
            };

            let leaderboard = leaderboard.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let message = match read_text(&file).await {
                    Ok(text) => match leaderboard.borrow_mut().import(&text) {
                        Ok(_) => "Leaderboard imported.".to_string(),
                        Err(e) => format!("Failed to import leaderboard: {}", e),
                    },
                    Err(e) => format!("Failed to import leaderboard: {:?}", e),
                };
                alert(&message);
            });
        });
        file_input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_clear(document: &Document, leaderboard: Rc<RefCell<Leaderboard>>) {
        if let Some(btn) = document.get_element_by_id("clearLb") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Err(e) = clear_shared(&leaderboard, &confirm_dialog) {
                    log::error!("Failed to clear leaderboard: {}", e);
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::fs;
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{ArgAction, Parser, Subcommand};

    use fish_leaderboard::platform::FileStorage;
    use fish_leaderboard::{Config, ConfigError, Leaderboard};

    #[derive(Parser, Debug)]
    #[command(
        name = "fish-leaderboard",
        version,
        about = "Local leaderboard for the fishing game",
        arg_required_else_help = true
    )]
    struct Cli {
        /// Directory holding the leaderboard files
        #[arg(long, global = true, value_name = "PATH", default_value = ".fish-leaderboard")]
        data_dir: PathBuf,

        /// Log more (repeat for debug output)
        #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
        verbose: u8,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Print the ranked leaderboard
        Show,
        /// Submit a score
        Add {
            name: String,
            /// Non-numeric input counts as 0
            score: String,
        },
        /// Write the leaderboard to a JSON file
        Export {
            /// Defaults to the configured export file name
            path: Option<PathBuf>,
        },
        /// Merge a leaderboard JSON file into the stored one
        Import { path: PathBuf },
        /// Delete every score
        Clear {
            /// Skip the confirmation prompt
            #[arg(long)]
            yes: bool,
        },
        /// Show or change the stored settings
        Config {
            #[command(subcommand)]
            action: Option<ConfigAction>,
        },
    }

    #[derive(Subcommand, Debug)]
    enum ConfigAction {
        /// Print the settings in effect
        Show,
        /// Change one setting and save it
        Set {
            /// One of the fields printed by `config show`
            field: String,
            value: String,
        },
    }

    fn init_logging(verbose: u8) {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }

    fn prompt_confirm(message: &str) -> bool {
        print!("{} [y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    /// Leaderboard over `storage`, started like a page load (seeded if empty)
    fn open(storage: &FileStorage, config: Config) -> Result<Leaderboard, Box<dyn Error>> {
        let mut leaderboard = Leaderboard::new(Box::new(storage.clone()), config);
        leaderboard.init()?;
        Ok(leaderboard)
    }

    /// Apply a `config set` and persist it. Returns the saved config.
    fn set_config(
        storage: &FileStorage,
        mut config: Config,
        field: &str,
        value: &str,
    ) -> Result<Config, Box<dyn Error>> {
        match config.set(field, value) {
            Ok(()) => {}
            Err(e @ ConfigError::UnknownField(_)) => {
                let expected = Config::FIELDS.join(", ");
                return Err(format!("{} (expected one of: {})", e, expected).into());
            }
            Err(e) => return Err(e.into()),
        }
        config.save(storage)?;
        Ok(config)
    }

    fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
        let storage = FileStorage::new(&cli.data_dir);
        let config = Config::load(&storage);

        match cli.command {
            Command::Show => println!("{}", open(&storage, config)?.view()),
            Command::Add { name, score } => {
                let mut leaderboard = open(&storage, config)?;
                let score = leaderboard.resolve_submitted_score(&score);
                let entry = leaderboard.add_score(&name, score)?;
                println!("Added {} ({})", entry.name, entry.score);
                println!("{}", leaderboard.view());
            }
            Command::Export { path } => {
                let file = open(&storage, config)?.export()?;
                let path = path.unwrap_or_else(|| PathBuf::from(&file.file_name));
                fs::write(&path, &file.contents)?;
                println!("Exported to {}", path.display());
            }
            Command::Import { path } => {
                let text = fs::read_to_string(&path)?;
                let mut leaderboard = open(&storage, config)?;
                match leaderboard.import(&text) {
                    Ok(_) => println!("Leaderboard imported."),
                    Err(e) => return Err(format!("Failed to import leaderboard: {}", e).into()),
                }
                println!("{}", leaderboard.view());
            }
            Command::Clear { yes } => {
                // Not opened through `open`: clearing must not reseed first
                let mut leaderboard = Leaderboard::new(Box::new(storage), config);
                let confirm = move |message: &str| yes || prompt_confirm(message);
                if leaderboard.clear(&confirm)? {
                    println!("Leaderboard cleared.");
                } else {
                    println!("Cancelled.");
                }
            }
            Command::Config { action } => match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => println!("{}", serde_json::to_string_pretty(&config)?),
                ConfigAction::Set { field, value } => {
                    let config = set_config(&storage, config, &field, &value)?;
                    println!("Saved {} to {}", field, Config::STORAGE_KEY);
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            },
        }
        Ok(())
    }

    pub fn main() -> ExitCode {
        let cli = Cli::parse();
        init_logging(cli.verbose);
        log::info!("Fish Leaderboard (native) using {}", cli.data_dir.display());

        match run(cli) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        fn scratch_dir(name: &str) -> PathBuf {
            let dir = std::env::temp_dir().join(format!(
                "fish-leaderboard-cli-{}-{}",
                name,
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            dir
        }

        #[test]
        fn test_cli_definition() {
            Cli::command().debug_assert();
        }

        #[test]
        fn test_parse_config_set() {
            let cli = Cli::parse_from(["fish-leaderboard", "config", "set", "max_displayed", "10"]);
            match cli.command {
                Command::Config {
                    action: Some(ConfigAction::Set { field, value }),
                } => {
                    assert_eq!(field, "max_displayed");
                    assert_eq!(value, "10");
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_set_config_persists() {
            let dir = scratch_dir("config");
            let storage = FileStorage::new(&dir);

            set_config(&storage, Config::load(&storage), "max_displayed", "5").unwrap();
            set_config(&storage, Config::load(&storage), "seed_presets", "false").unwrap();

            let config = Config::load(&storage);
            assert_eq!(config.max_displayed, 5);
            assert!(!config.seed_presets);

            let err = set_config(&storage, config.clone(), "volume", "3").unwrap_err();
            assert!(err.to_string().contains("max_displayed"));
            assert!(set_config(&storage, config, "max_displayed", "0").is_err());
            assert_eq!(Config::load(&storage).max_displayed, 5);

            let _ = fs::remove_dir_all(&dir);
        }

        #[test]
        fn test_saved_config_drives_the_leaderboard() {
            let dir = scratch_dir("config-view");
            let storage = FileStorage::new(&dir);
            set_config(&storage, Config::load(&storage), "max_displayed", "3").unwrap();

            let leaderboard = open(&storage, Config::load(&storage)).unwrap();
            assert_eq!(leaderboard.entries().len(), 20);
            assert_eq!(leaderboard.view().rows().len(), 3);

            let _ = fs::remove_dir_all(&dir);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    web_app::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
