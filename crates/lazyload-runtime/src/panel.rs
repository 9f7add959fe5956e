use std::fmt;
use std::ops::ControlFlow;

use lazyload_core::config::PanelConfig;
use lazyload_core::{paths, Asset, LoadError, LoadMode, Result};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::context::LoaderContext;

// ─── MainView ─────────────────────────────────────────────────────────────

/// The view a panel shows once its package is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum MainView {
    Class(String),
    Xtype(String),
}

impl MainView {
    /// `main_class` wins over `main_xtype`; with neither, the package's
    /// conventional `<module>.view.main.Main` class is used.
    pub fn resolve(module: &str, main_class: Option<&str>, main_xtype: Option<&str>) -> Self {
        match (main_class, main_xtype) {
            (Some(class), _) if !class.is_empty() => MainView::Class(class.to_string()),
            (_, Some(xtype)) if !xtype.is_empty() => MainView::Xtype(xtype.to_string()),
            _ => MainView::Class(paths::default_main_class(module)),
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            MainView::Class(c) => Some(c),
            MainView::Xtype(_) => None,
        }
    }

    pub fn xtype(&self) -> Option<&str> {
        match self {
            MainView::Xtype(x) => Some(x),
            MainView::Class(_) => None,
        }
    }
}

impl fmt::Display for MainView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainView::Class(c) => write!(f, "class {c}"),
            MainView::Xtype(x) => write!(f, "xtype {x}"),
        }
    }
}

// ─── Events ───────────────────────────────────────────────────────────────

/// Payload of the before/start notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadInfo {
    pub panel_id: String,
    pub module: String,
    pub main_class: Option<String>,
    pub main_xtype: Option<String>,
}

#[derive(Debug)]
pub enum PanelEvent<'a> {
    /// Vetoable: a listener returning `ControlFlow::Break` stops the load.
    BeforePackageLoad(&'a LoadInfo),
    StartPackageLoad(&'a LoadInfo),
    EndPackageLoad { panel_id: &'a str },
    ErrorPackageLoad {
        panel_id: &'a str,
        error: &'a LoadError,
    },
}

impl PanelEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PanelEvent::BeforePackageLoad(_) => "beforepackageload",
            PanelEvent::StartPackageLoad(_) => "startpackageload",
            PanelEvent::EndPackageLoad { .. } => "endpackageload",
            PanelEvent::ErrorPackageLoad { .. } => "errorpackageload",
        }
    }
}

pub type Listener = Box<dyn Fn(&PanelEvent<'_>) -> ControlFlow<()> + Send + Sync>;

// ─── PanelHost ────────────────────────────────────────────────────────────

/// The UI side of a panel: loading indicator and main-view construction.
pub trait PanelHost: Send + Sync {
    type View: Send;

    fn show_loading(&self, panel_id: &str, text: &str);

    fn clear_loading(&self, panel_id: &str);

    fn create_view(&self, main: &MainView, config: &serde_json::Value) -> Self::View;
}

// ─── PanelState ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    Idle,
    CheckingExistence,
    BeforeLoadCheck,
    LoadingScript,
    LoadingStyle,
    Activated,
    Cancelled,
    Failed,
}

impl PanelState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PanelState::Activated | PanelState::Cancelled | PanelState::Failed
        )
    }
}

// ─── LazyPanel ────────────────────────────────────────────────────────────

/// A container that loads one package the first time it is rendered and
/// then fills itself with that package's main view.
pub struct LazyPanel<H: PanelHost> {
    id: String,
    module: String,
    main: MainView,
    main_config: serde_json::Value,
    loading_text: String,
    package_path: String,
    package_build_path: String,
    contains_css: bool,
    context: LoaderContext,
    host: H,
    listeners: Vec<Listener>,
    state: PanelState,
    content: Option<H::View>,
    error: Option<LoadError>,
}

impl<H: PanelHost> LazyPanel<H> {
    pub fn new(config: PanelConfig, context: LoaderContext, host: H) -> Result<Self> {
        let module = match config.module {
            Some(m) if !m.trim().is_empty() => m,
            _ => {
                return Err(LoadError::MissingConfiguration(
                    "lazy panel requires a module name".into(),
                ))
            }
        };
        let main = MainView::resolve(
            &module,
            config.main_class.as_deref(),
            config.main_xtype.as_deref(),
        );
        let id = config
            .id
            .unwrap_or_else(|| format!("lazypanel-{}", Uuid::new_v4().simple()));

        Ok(Self {
            id,
            main,
            main_config: config.main_config,
            loading_text: config.loading_text,
            package_path: config
                .package_path
                .unwrap_or_else(|| context.defaults.package_path.clone()),
            package_build_path: config
                .package_build_path
                .unwrap_or_else(|| context.defaults.package_build_path.clone()),
            contains_css: config.contains_css,
            module,
            context,
            host,
            listeners: Vec::new(),
            state: PanelState::Idle,
            content: None,
            error: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn main_view(&self) -> &MainView {
        &self.main
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn content(&self) -> Option<&H::View> {
        self.content.as_ref()
    }

    /// The failure that moved the panel to [`PanelState::Failed`].
    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn on<F>(&mut self, listener: F)
    where
        F: Fn(&PanelEvent<'_>) -> ControlFlow<()> + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Run the load sequence. Only the first call does anything; later calls
    /// return the state the panel settled in.
    pub async fn before_render(&mut self) -> PanelState {
        if self.state != PanelState::Idle {
            return self.state;
        }

        self.transition(PanelState::CheckingExistence);
        if self.context.registry.contains(&self.module) {
            debug!(panel = %self.id, module = %self.module, "package already present");
            self.add_main_view();
            self.transition(PanelState::Activated);
            return self.state;
        }

        self.transition(PanelState::BeforeLoadCheck);
        let info = self.load_info();
        if self.emit(&PanelEvent::BeforePackageLoad(&info)).is_break() {
            info!(panel = %self.id, module = %self.module, "package load vetoed");
            self.transition(PanelState::Cancelled);
            return self.state;
        }

        let _ = self.emit(&PanelEvent::StartPackageLoad(&info));
        self.transition(PanelState::LoadingScript);
        self.host.show_loading(&self.id, &self.loading_text);

        match self.load().await {
            Ok(()) => self.complete_load(),
            Err(e) => self.fail(e),
        }
        self.state
    }

    fn load_info(&self) -> LoadInfo {
        LoadInfo {
            panel_id: self.id.clone(),
            module: self.module.clone(),
            main_class: self.main.class().map(str::to_string),
            main_xtype: self.main.xtype().map(str::to_string),
        }
    }

    /// Script first, then the optional stylesheet.
    async fn load(&mut self) -> Result<()> {
        let (script, stylesheet) = self.plan()?;
        info!(panel = %self.id, module = %self.module, url = %script.url, "loading package");

        if let Err(source) = self.context.fetcher.fetch(&script).await {
            return Err(LoadError::PackageLoad {
                package: self.module.clone(),
                url: script.url,
                source,
            });
        }

        if self.contains_css {
            self.transition(PanelState::LoadingStyle);
            if let Err(source) = self.context.fetcher.fetch(&stylesheet).await {
                return Err(LoadError::StyleLoad {
                    package: self.module.clone(),
                    url: stylesheet.url,
                    source,
                });
            }
        }
        Ok(())
    }

    /// The build artifact is used in build mode and whenever the main view
    /// is only known by xtype; otherwise the main class source is fetched.
    /// The stylesheet location follows the same choice.
    fn plan(&self) -> Result<(Asset, Asset)> {
        match (&self.main, self.context.env.mode) {
            (MainView::Class(class), LoadMode::Dev) => {
                let root = paths::source_root(&self.package_path, &self.module);
                let url = paths::class_source_url(&root, &self.module, class).ok_or_else(|| {
                    LoadError::UnresolvableClass {
                        package: self.module.clone(),
                        class: class.clone(),
                    }
                })?;
                let css = paths::dev_stylesheet_url(
                    &self.context.env.app_name,
                    &self.package_build_path,
                    &self.module,
                );
                Ok((Asset::script(url), Asset::stylesheet(css)))
            }
            _ => Ok((
                Asset::script(paths::build_script_url(
                    &self.package_build_path,
                    &self.module,
                )),
                Asset::stylesheet(paths::build_stylesheet_url(
                    &self.package_build_path,
                    &self.module,
                )),
            )),
        }
    }

    fn complete_load(&mut self) {
        self.context.registry.mark_loaded(self.module.clone());
        self.host.clear_loading(&self.id);
        let _ = self.emit(&PanelEvent::EndPackageLoad { panel_id: &self.id });
        self.add_main_view();
        self.transition(PanelState::Activated);
    }

    fn fail(&mut self, e: LoadError) {
        error!(panel = %self.id, module = %self.module, error = %e, "package load error");
        self.host.clear_loading(&self.id);
        let _ = self.emit(&PanelEvent::ErrorPackageLoad {
            panel_id: &self.id,
            error: &e,
        });
        self.error = Some(e);
        self.transition(PanelState::Failed);
    }

    fn add_main_view(&mut self) {
        if self.content.is_some() {
            return;
        }
        let view = self.host.create_view(&self.main, &self.main_config);
        self.content = Some(view);
    }

    /// Listeners run in registration order; the first `Break` stops the rest.
    fn emit(&self, event: &PanelEvent<'_>) -> ControlFlow<()> {
        debug!(panel = %self.id, event = event.name(), "panel event");
        for listener in &self.listeners {
            listener(event)?;
        }
        ControlFlow::Continue(())
    }

    fn transition(&mut self, next: PanelState) {
        debug!(panel = %self.id, from = ?self.state, to = ?next, "panel state");
        self.state = next;
    }
}

impl<H: PanelHost> fmt::Debug for LazyPanel<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyPanel")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("main", &self.main)
            .field("state", &self.state)
            .field("loaded", &self.content.is_some())
            .finish_non_exhaustive()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
