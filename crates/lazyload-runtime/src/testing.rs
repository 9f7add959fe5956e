//! Scripted collaborators shared by the orchestrator and panel tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lazyload_core::{Asset, FetchError};
use tokio::sync::oneshot;

use crate::fetch::AssetFetcher;
use crate::panel::{MainView, PanelHost};

/// Ordered record of everything the collaborators observed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline(Arc<Mutex<Vec<String>>>);

impl Timeline {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Fetcher whose outcome per URL is decided by the test.
///
/// Every URL succeeds unless marked with [`fail`](Self::fail). A URL with a
/// [`gate`](Self::gate) stays pending until the returned sender fires.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFetcher {
    timeline: Timeline,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }

    pub(crate) fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub(crate) fn gate(&self, url: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        tx
    }

    /// URLs whose fetch has resolved, in resolution order.
    pub(crate) fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    /// URLs requested so far, in request order.
    pub(crate) fn requested(&self) -> Vec<String> {
        self.timeline
            .entries()
            .into_iter()
            .filter_map(|e| {
                e.strip_prefix("fetch script ")
                    .or_else(|| e.strip_prefix("fetch stylesheet "))
                    .map(str::to_string)
            })
            .collect()
    }
}

#[async_trait]
impl AssetFetcher for ScriptedFetcher {
    async fn fetch(&self, asset: &Asset) -> Result<(), FetchError> {
        self.timeline.push(format!("fetch {asset}"));
        let gate = self.gates.lock().unwrap().remove(&asset.url);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.completed.lock().unwrap().push(asset.url.clone());
        if self.failing.lock().unwrap().contains(&asset.url) {
            return Err(FetchError::NotFound {
                url: asset.url.clone(),
            });
        }
        Ok(())
    }
}

/// Panel host that records indicator and view calls on the timeline.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingHost {
    pub(crate) timeline: Timeline,
}

impl PanelHost for RecordingHost {
    type View = String;

    fn show_loading(&self, _panel_id: &str, text: &str) {
        self.timeline.push(format!("mask {text}"));
    }

    fn clear_loading(&self, _panel_id: &str) {
        self.timeline.push("unmask");
    }

    fn create_view(&self, main: &MainView, config: &serde_json::Value) -> String {
        self.timeline.push(format!("create {main} {config}"));
        main.to_string()
    }
}
