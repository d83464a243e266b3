//! Shared runtime state: the resolved configuration, the
//! stores, the fill backend, the publisher, the in-flight set, and the tick
//! reentrancy flag. `Scheduler` is a thin, cheaply-cloneable handle around
//! `Arc<Inner>`, keeping a lightweight caller-facing handle separate from
//! the heavier state it owns.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;

use plashboard_config::Config;
use plashboard_fill::FillBackend;
use plashboard_publish::Publisher;
use plashboard_store::{RunStore, StateStore, TemplateStore};
use plashboard_utils::paths::DataLayout;
use tokio::sync::Mutex;

pub struct Inner {
    pub config: Config,
    pub layout: DataLayout,
    pub templates: TemplateStore,
    pub state: StateStore,
    pub runs: RunStore,
    pub fill_backend: Box<dyn FillBackend>,
    pub publisher: Publisher,

    /// Templates with a run currently executing. Acts as the per-template
    /// mutex: the in-flight set itself enforces at-most-one-run-per-template.
    pub in_flight: Mutex<HashSet<String>>,

    /// Reentrancy guard for `tick`.
    /// A plain `AtomicBool` rather than a held mutex: the tick's
    /// due-template computation is synchronous and fast, while the work it
    /// schedules keeps running after the flag is cleared.
    pub tick_in_progress: AtomicBool,
}

impl Inner {
    #[must_use]
    pub fn new(
        config: Config,
        templates: TemplateStore,
        state: StateStore,
        runs: RunStore,
        fill_backend: Box<dyn FillBackend>,
        publisher: Publisher,
    ) -> Self {
        let layout = DataLayout::new(config.data_dir.clone());
        Self {
            config,
            layout,
            templates,
            state,
            runs,
            fill_backend,
            publisher,
            in_flight: Mutex::new(HashSet::new()),
            tick_in_progress: AtomicBool::new(false),
        }
    }
}
