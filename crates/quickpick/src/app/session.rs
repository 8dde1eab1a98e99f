//! Quick-open session lifecycle: strategy selection, source replacement, and selection handling.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use crate::app::accumulator::Accumulator;
use crate::app::classify::classify_batch;
use crate::app::dispatch::dispatch;
use crate::app::menu::Menu;
use crate::app::source::{
    Strategy, bookmark_items, buffer_line_items, colorscheme_items, select_strategy,
};
use crate::domain::errors::QuickOpenError;
use crate::domain::model::{Item, ItemKind, MenuOption};
use crate::infra::config::ConfigSource;
use crate::infra::finder::{Finder, FinderEvent, FinderFactory, FinderSpec, SystemFinders};
use crate::infra::git;
use crate::infra::host::{FsProbe, Host, Platform, StdFs};

/// Controller owning the menu registration, the active source, and the accumulated items.
///
/// At most one finder is active. Starting any session stops and drops the previous one before
/// the next is created, so batches from two sources never mix.
pub struct QuickOpen<M: Menu, H: Host> {
    menu: M,
    host: H,
    platform: Platform,
    config: Box<dyn ConfigSource>,
    finders: Box<dyn FinderFactory>,
    fs: Box<dyn FsProbe>,
    work_tree_probe: fn(&Path) -> bool,
    accumulator: Accumulator,
    active: Option<Box<dyn Finder>>,
    loading: bool,
    selections: Receiver<MenuOption>,
}

impl<M: Menu, H: Host> QuickOpen<M, H> {
    /// Create a controller and register for the menu's selections.
    pub fn new(
        mut menu: M,
        host: H,
        platform: Platform,
        config: impl ConfigSource + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        menu.attach(tx);
        Self {
            menu,
            host,
            platform,
            config: Box::new(config),
            finders: Box::new(SystemFinders),
            fs: Box::new(StdFs),
            work_tree_probe: git::is_work_tree,
            accumulator: Accumulator::new(),
            active: None,
            loading: false,
            selections: rx,
        }
    }

    pub fn with_finders(mut self, finders: impl FinderFactory + 'static) -> Self {
        self.finders = Box::new(finders);
        self
    }

    pub fn with_fs_probe(mut self, fs: impl FsProbe + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn with_work_tree_probe(mut self, probe: fn(&Path) -> bool) -> Self {
        self.work_tree_probe = probe;
        self
    }

    pub fn menu(&self) -> &M {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut M {
        &mut self.menu
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn items(&self) -> &[Item] {
        self.accumulator.items()
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// True while a streaming source has not completed.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_active_source(&self) -> bool {
        self.active.is_some()
    }

    /// Start a session, choosing bookmarks or a streamed listing from the host's working directory.
    pub fn show(&mut self) {
        self.begin_session();

        let cwd = self.host.current_dir();
        let strategy = select_strategy(
            &cwd,
            &self.platform,
            &*self.config,
            self.work_tree_probe,
        );
        tracing::debug!(cwd = %cwd.display(), ?strategy, "starting quick open session");

        match strategy {
            Strategy::Bookmarks => {
                let items = bookmark_items(&self.config.bookmarks());
                self.finish_snapshot(items);
            }
            Strategy::Stream(spec) => self.start_stream(&spec),
        }
    }

    /// Start a session over the lines of the host's active buffer.
    pub fn show_buffer_lines(&mut self) {
        self.begin_session();
        let items = buffer_line_items(&self.host.buffer_lines());
        self.finish_snapshot(items);
    }

    /// Start a session listing the host's colorschemes.
    pub fn show_colorschemes(&mut self) {
        self.begin_session();
        let items = colorscheme_items(&self.host.colorschemes());
        self.finish_snapshot(items);
    }

    /// Drain pending source events and dispatch pending selections.
    pub fn pump(&mut self) -> Result<(), QuickOpenError> {
        self.drain_source();
        while let Ok(option) = self.selections.try_recv() {
            self.select(&option)?;
        }
        Ok(())
    }

    /// Execute the action bound to `option`.
    pub fn select(&mut self, option: &MenuOption) -> Result<(), QuickOpenError> {
        let seen_before = self.accumulator.seen().len();
        dispatch(
            option,
            &mut self.host,
            &self.platform,
            &*self.fs,
            &mut self.accumulator,
        )?;
        if self.accumulator.seen().len() != seen_before {
            self.accumulator.render(&mut self.menu);
        }
        Ok(())
    }

    fn begin_session(&mut self) {
        self.stop_active();
        self.accumulator.clear();
        self.menu.show();
    }

    fn stop_active(&mut self) {
        if let Some(mut finder) = self.active.take() {
            finder.stop();
            tracing::debug!(items = self.accumulator.len(), "stopped previous listing");
        }
    }

    fn finish_snapshot(&mut self, items: Vec<Item>) {
        self.loading = false;
        self.menu.set_loading(false);
        self.accumulator.extend(items);
        self.accumulator.render(&mut self.menu);
    }

    fn start_stream(&mut self, spec: &FinderSpec) {
        self.loading = true;
        self.menu.set_loading(true);
        self.accumulator.render(&mut self.menu);

        let mut finder = self.finders.create(spec);
        match finder.start() {
            Ok(()) => self.active = Some(finder),
            Err(err) => {
                tracing::warn!(error = %err, "listing source failed to start");
                self.complete_stream();
            }
        }
    }

    fn drain_source(&mut self) {
        while let Some(finder) = self.active.as_mut() {
            match finder.try_next() {
                Some(FinderEvent::Data(batch)) => {
                    tracing::trace!(entries = batch.len(), "received listing batch");
                    self.accumulator.extend(classify_batch(batch, ItemKind::File));
                    self.accumulator.render(&mut self.menu);
                }
                Some(FinderEvent::Complete) => {
                    self.active = None;
                    self.complete_stream();
                }
                None => return,
            }
        }
    }

    fn complete_stream(&mut self) {
        self.loading = false;
        self.menu.set_loading(false);
        tracing::debug!(items = self.accumulator.len(), "listing complete");
    }
}

impl<M: Menu, H: Host> Drop for QuickOpen<M, H> {
    fn drop(&mut self) {
        self.stop_active();
        self.menu.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::mpsc::Sender;

    use crate::infra::config::Config;
    use crate::infra::host::{HostAction, ScriptHost};

    #[derive(Default)]
    struct RecordingMenu {
        shown: usize,
        loading: Vec<bool>,
        renders: Vec<Vec<MenuOption>>,
        selections: Option<Sender<MenuOption>>,
    }

    impl RecordingMenu {
        fn last(&self) -> &[MenuOption] {
            self.renders.last().map(Vec::as_slice).unwrap_or_default()
        }

        fn pick(&self, index: usize) {
            let option = self.last()[index].clone();
            self.selections
                .as_ref()
                .expect("attached")
                .send(option)
                .expect("controller alive");
        }
    }

    impl Menu for RecordingMenu {
        fn show(&mut self) {
            self.shown += 1;
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading.push(loading);
        }

        fn set_items(&mut self, options: Vec<MenuOption>) {
            self.renders.push(options);
        }

        fn attach(&mut self, selections: Sender<MenuOption>) {
            self.selections = Some(selections);
        }

        fn detach(&mut self) {
            self.selections = None;
        }
    }

    /// Shared log of what scripted finders were asked to do.
    #[derive(Default)]
    struct Script {
        queued: VecDeque<Vec<FinderEvent>>,
        specs: Vec<FinderSpec>,
        stops: Vec<usize>,
    }

    struct ScriptedFinder {
        id: usize,
        pending: VecDeque<FinderEvent>,
        stopped: bool,
        script: Rc<RefCell<Script>>,
    }

    impl Finder for ScriptedFinder {
        fn start(&mut self) -> Result<(), QuickOpenError> {
            Ok(())
        }

        fn stop(&mut self) {
            if !self.stopped {
                self.stopped = true;
                self.pending.clear();
            }
            self.script.borrow_mut().stops.push(self.id);
        }

        fn try_next(&mut self) -> Option<FinderEvent> {
            self.pending.pop_front()
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedFinders(Rc<RefCell<Script>>);

    impl ScriptedFinders {
        fn queue(&self, events: Vec<FinderEvent>) {
            self.0.borrow_mut().queued.push_back(events);
        }
    }

    impl FinderFactory for ScriptedFinders {
        fn create(&self, spec: &FinderSpec) -> Box<dyn Finder> {
            let mut script = self.0.borrow_mut();
            script.specs.push(spec.clone());
            let id = script.specs.len();
            let pending = script.queued.pop_front().unwrap_or_default().into();
            Box::new(ScriptedFinder {
                id,
                pending,
                stopped: false,
                script: Rc::clone(&self.0),
            })
        }
    }

    struct FailingFinders;

    impl FinderFactory for FailingFinders {
        fn create(&self, _spec: &FinderSpec) -> Box<dyn Finder> {
            struct Broken;
            impl Finder for Broken {
                fn start(&mut self) -> Result<(), QuickOpenError> {
                    Err(QuickOpenError::FinderSpawn {
                        program: "missing".into(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    })
                }
                fn stop(&mut self) {}
                fn try_next(&mut self) -> Option<FinderEvent> {
                    None
                }
            }
            Box::new(Broken)
        }
    }

    fn data(entries: &[&str]) -> FinderEvent {
        FinderEvent::Data(entries.iter().map(|s| s.to_string()).collect())
    }

    fn controller(
        cwd: &str,
        config: Config,
        finders: ScriptedFinders,
    ) -> QuickOpen<RecordingMenu, ScriptHost> {
        let platform = Platform::new(Some("/home/ada".into()), Some("/opt/editor".into()));
        QuickOpen::new(RecordingMenu::default(), ScriptHost::new(cwd), platform, config)
            .with_finders(finders)
            .with_work_tree_probe(|_| true)
    }

    fn labels(options: &[MenuOption]) -> Vec<&str> {
        options.iter().map(|o| o.label.as_str()).collect()
    }

    #[test]
    fn streaming_session_renders_full_list_per_batch() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["a.rs", "src/b.rs"]), data(&["c.rs"]), FinderEvent::Complete]);
        let mut qo = controller("/proj", Config::default(), finders.clone());

        qo.show();
        assert!(qo.is_loading());
        assert_eq!(finders.0.borrow().specs, vec![FinderSpec::git_ls_files(Path::new("/proj"))]);

        qo.pump().expect("pump");
        let menu = qo.menu();
        assert_eq!(menu.renders.len(), 3);
        assert_eq!(labels(&menu.renders[1]), vec!["a.rs", "b.rs"]);
        assert_eq!(labels(menu.last()), vec!["a.rs", "b.rs", "c.rs"]);
        assert_eq!(menu.loading, vec![true, false]);
        assert!(!qo.is_loading());
        assert!(!qo.has_active_source());
    }

    #[test]
    fn new_session_discards_pending_batches_of_previous_source() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["old1.rs"]), data(&["old2.rs"])]);
        finders.queue(vec![data(&["new.rs"]), FinderEvent::Complete]);
        let mut qo = controller("/proj", Config::default(), finders.clone());

        qo.show();
        qo.show();
        qo.pump().expect("pump");

        let contents: Vec<_> = qo.items().iter().map(Item::content).collect();
        assert_eq!(contents, vec!["new.rs"]);
        assert_eq!(finders.0.borrow().stops, vec![1]);
        assert_eq!(labels(qo.menu().last()), vec!["new.rs"]);
    }

    #[test]
    fn bookmark_session_is_synchronous() {
        let mut config = Config::default();
        config.quick_open.bookmarks = vec!["~/notes".into()];
        let finders = ScriptedFinders::default();
        let mut qo = controller("/home/ada", config, finders.clone());

        qo.show();

        assert!(finders.0.borrow().specs.is_empty());
        assert!(!qo.is_loading());
        let kinds: Vec<_> = qo.items().iter().map(Item::kind).collect();
        assert_eq!(kinds, vec![ItemKind::FolderHelp, ItemKind::Bookmark]);
        assert_eq!(qo.menu().loading, vec![false]);
        assert_eq!(labels(qo.menu().last()), vec!["Open Folder", "notes"]);
    }

    #[test]
    fn bookmark_session_stops_running_stream() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["late.rs"])]);
        let mut qo = controller("/proj", Config::default(), finders.clone());

        qo.show();
        qo.host_mut().chdir(Path::new("/home/ada"));
        qo.show();
        qo.pump().expect("pump");

        assert_eq!(finders.0.borrow().stops, vec![1]);
        assert!(qo.items().iter().all(|item| item.kind() != ItemKind::File));
        assert!(!qo.is_loading());
    }

    #[test]
    fn buffer_lines_render_once_without_loading() {
        let finders = ScriptedFinders::default();
        let platform = Platform::default();
        let host = ScriptHost::new("/proj").with_buffer_lines(vec!["one".into(), "two".into()]);
        let mut qo = QuickOpen::new(RecordingMenu::default(), host, platform, Config::default())
            .with_finders(finders);

        qo.show_buffer_lines();

        assert_eq!(qo.menu().renders.len(), 1);
        assert!(!qo.menu().loading.contains(&true));
        let last = qo.menu().last();
        assert_eq!(labels(last), vec!["1", "2"]);
        assert_eq!(last[1].detail, "two");
    }

    #[test]
    fn selecting_a_file_pins_it_on_rerender() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["src/lib.rs", "README.md"])]);
        let mut qo = controller("/proj", Config::default(), finders);

        qo.show();
        qo.pump().expect("pump");
        qo.menu().pick(0);
        qo.pump().expect("pump");

        assert_eq!(
            qo.host().actions(),
            &[HostAction::Command("e! src/lib.rs".into())]
        );
        let pinned: Vec<_> = qo.menu().last().iter().map(|o| o.pinned).collect();
        assert_eq!(pinned, vec![true, false]);
    }

    #[test]
    fn seen_paths_survive_new_sessions() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["a.rs"])]);
        finders.queue(vec![data(&["a.rs", "b.rs"])]);
        let mut qo = controller("/proj", Config::default(), finders);

        qo.show();
        qo.pump().expect("pump");
        let option = qo.menu().last()[0].clone();
        qo.select(&option).expect("select");

        qo.show();
        qo.pump().expect("pump");
        let pinned: Vec<_> = qo.menu().last().iter().map(|o| o.pinned).collect();
        assert_eq!(pinned, vec![true, false]);
    }

    #[test]
    fn spawn_failure_completes_empty() {
        let platform = Platform::default();
        let mut qo = QuickOpen::new(
            RecordingMenu::default(),
            ScriptHost::new("/proj"),
            platform,
            Config::default(),
        )
        .with_finders(FailingFinders)
        .with_work_tree_probe(|_| true);

        qo.show();

        assert!(!qo.is_loading());
        assert!(!qo.has_active_source());
        assert_eq!(qo.menu().loading, vec![true, false]);
        assert!(qo.items().is_empty());
    }

    #[test]
    fn missing_bookmark_aborts_pump_with_error() {
        let mut config = Config::default();
        config.quick_open.bookmarks = vec!["/definitely/not/here".into()];
        let mut qo = controller("/home/ada", config, ScriptedFinders::default());

        qo.show();
        qo.menu().pick(1);
        let err = qo.pump().expect_err("bookmark target is missing");

        assert!(matches!(err, QuickOpenError::BookmarkUnreachable { .. }));
        assert!(qo.accumulator().is_seen("/definitely/not/here"));
        assert_eq!(qo.items().len(), 2);
    }

    #[test]
    fn drop_stops_active_source() {
        let finders = ScriptedFinders::default();
        finders.queue(vec![data(&["a.rs"])]);
        let mut qo = controller("/proj", Config::default(), finders.clone());
        qo.show();
        drop(qo);
        assert_eq!(finders.0.borrow().stops, vec![1]);
    }

    #[test]
    fn override_command_streams_through_shell() {
        let mut config = Config::default();
        config.quick_open.exec_command = Some("fd ${search}".into());
        let finders = ScriptedFinders::default();
        let mut qo = controller("/proj", config, finders.clone());

        qo.show();

        assert_eq!(finders.0.borrow().specs, vec![FinderSpec::shell("fd ", Path::new("/proj"))]);
    }
}
