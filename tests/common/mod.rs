//! Shared test fixtures.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tessera::assets::io::source_filename;
use tessera::{
    ElementRegistry, Image, LoadError, LoaderSettings, MemoryRegistry, NoElements, PhongComponent,
    TextureFetcher,
};
use url::Url;

type Gate = flume::Sender<Result<Image, LoadError>>;

/// A fetcher whose loads only finish when the test releases them.
///
/// Every `fetch` call is recorded and parks on its own gate, keyed by the
/// file name of the address.
#[derive(Default)]
pub struct ScriptedFetcher {
    gates: Mutex<HashMap<String, VecDeque<Gate>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// File names fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Finishes the oldest pending fetch of `name` with a 1x1 image labelled
    /// after it. Returns `false` if nothing was waiting or the load was
    /// already aborted.
    pub fn release(&self, name: &str) -> bool {
        self.finish(name, Ok(Image::solid(name, [255, 255, 255, 255])))
    }

    pub fn fail(&self, name: &str, error: LoadError) -> bool {
        self.finish(name, Err(error))
    }

    fn finish(&self, name: &str, result: Result<Image, LoadError>) -> bool {
        let gate = self
            .gates
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front);
        gate.is_some_and(|gate| gate.send(result).is_ok())
    }
}

impl TextureFetcher for ScriptedFetcher {
    fn fetch(&self, url: &Url) -> BoxFuture<'static, Result<Image, LoadError>> {
        let name = source_filename(url).to_string();
        let (tx, rx) = flume::bounded(1);
        self.gates.lock().entry(name.clone()).or_default().push_back(tx);
        self.calls.lock().push(name);
        Box::pin(async move {
            rx.recv_async()
                .await
                .unwrap_or_else(|_| Err(LoadError::Network("gate dropped".to_string())))
        })
    }
}

pub fn settings() -> LoaderSettings {
    LoaderSettings::default().with_base_url("https://assets.test/textures/")
}

pub fn component(settings: &LoaderSettings) -> (PhongComponent, Arc<ScriptedFetcher>) {
    component_with(settings, Arc::new(NoElements))
}

pub fn component_with(
    settings: &LoaderSettings,
    registry: Arc<dyn ElementRegistry>,
) -> (PhongComponent, Arc<ScriptedFetcher>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let fetcher = ScriptedFetcher::new();
    let phong = PhongComponent::new(settings, registry, fetcher.clone()).unwrap();
    (phong, fetcher)
}

pub fn registry() -> Arc<MemoryRegistry> {
    Arc::new(MemoryRegistry::new())
}
