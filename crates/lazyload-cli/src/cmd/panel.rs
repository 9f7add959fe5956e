use super::FetchArgs;
use crate::output::print_json;
use lazyload_core::config::PanelConfig;
use lazyload_core::ModuleRegistry;
use lazyload_runtime::{LazyPanel, LoaderContext, MainView, PanelEvent, PanelHost, PanelState};
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared, ordered record of what happened to the panel.
#[derive(Debug, Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, line: String) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(line);
        }
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

/// Host that "renders" into the log instead of a UI.
struct ConsoleHost {
    log: Log,
}

impl PanelHost for ConsoleHost {
    type View = String;

    fn show_loading(&self, _panel_id: &str, text: &str) {
        self.log.push(format!("mask: {text}"));
    }

    fn clear_loading(&self, _panel_id: &str) {
        self.log.push("unmask".to_string());
    }

    fn create_view(&self, main: &MainView, config: &serde_json::Value) -> String {
        self.log.push(format!("create {main} with {config}"));
        main.to_string()
    }
}

#[derive(Serialize)]
struct PanelOutcome {
    id: String,
    module: String,
    state: PanelState,
    main_view: MainView,
    content: Option<String>,
    error: Option<String>,
    log: Vec<String>,
}

pub fn run(
    config_path: &Path,
    module: &str,
    loaded: &[String],
    args: &FetchArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    args.apply(&mut config);
    let fetcher = args.fetcher(config_path)?;

    let panel_config = config
        .panel(module)
        .cloned()
        .unwrap_or_else(|| PanelConfig::for_module(module));
    let context = LoaderContext::from_config(&config, fetcher)
        .with_registry(ModuleRegistry::with_modules(loaded.iter().cloned()));

    let log = Log::default();
    let host = ConsoleHost { log: log.clone() };
    let mut panel = LazyPanel::new(panel_config, context, host)?;
    let events = log.clone();
    panel.on(move |event: &PanelEvent<'_>| {
        events.push(format!("event: {}", event.name()));
        ControlFlow::Continue(())
    });

    let state = super::block_on(panel.before_render())?;

    let outcome = PanelOutcome {
        id: panel.id().to_string(),
        module: panel.module().to_string(),
        state,
        main_view: panel.main_view().clone(),
        content: panel.content().cloned(),
        error: panel.error().map(|e| e.to_string()),
        log: log.lines(),
    };

    if json {
        print_json(&outcome)?;
    } else {
        println!("panel {} ({})", outcome.id, outcome.module);
        for line in &outcome.log {
            println!("  {line}");
        }
        println!("state: {}", state_label(outcome.state));
    }

    if let Some(err) = panel.error() {
        anyhow::bail!("panel '{}' failed: {err}", outcome.module);
    }
    Ok(())
}

fn state_label(state: PanelState) -> &'static str {
    match state {
        PanelState::Idle => "idle",
        PanelState::CheckingExistence => "checking existence",
        PanelState::BeforeLoadCheck => "before load check",
        PanelState::LoadingScript => "loading script",
        PanelState::LoadingStyle => "loading style",
        PanelState::Activated => "activated",
        PanelState::Cancelled => "cancelled",
        PanelState::Failed => "failed",
    }
}
