#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use cgmath::Vector3;
use haunted_house::{
    AppState, Config, FrameTarget, Preset, Scheduler,
    camera::Viewport,
    resources::{AssetLoader, LoadingManager, LoadingObserver},
};
use rand::{SeedableRng, rngs::StdRng};

pub const SEED: u64 = 0x6a05;

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(SEED)
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoadEvent {
    Start { url: String, loaded: usize, total: usize },
    Progress { url: String, loaded: usize, total: usize },
    Load,
    Error { url: String },
}

/// Observer that appends every notification to a shared list.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub events: Rc<RefCell<Vec<LoadEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.borrow().clone()
    }

    pub fn loader(&self) -> AssetLoader {
        AssetLoader::new(LoadingManager::new(Box::new(self.clone())))
    }
}

impl LoadingObserver for RecordingObserver {
    fn on_start(&mut self, url: &str, loaded: usize, total: usize) {
        self.events.borrow_mut().push(LoadEvent::Start {
            url: url.to_string(),
            loaded,
            total,
        });
    }

    fn on_progress(&mut self, url: &str, loaded: usize, total: usize) {
        self.events.borrow_mut().push(LoadEvent::Progress {
            url: url.to_string(),
            loaded,
            total,
        });
    }

    fn on_load(&mut self) {
        self.events.borrow_mut().push(LoadEvent::Load);
    }

    fn on_error(&mut self, url: &str) {
        self.events.borrow_mut().push(LoadEvent::Error {
            url: url.to_string(),
        });
    }
}

/// Shared call log of a [`RecordingTarget`] and a [`RecordingScheduler`].
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Frame target that remembers what the state looked like at draw time.
pub struct RecordingTarget {
    pub journal: Journal,
    pub ghost_positions: Vec<Vector3<f32>>,
    pub fail: bool,
}

impl RecordingTarget {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ghost_positions: Vec::new(),
            fail: false,
        }
    }
}

impl FrameTarget for RecordingTarget {
    type Error = String;

    fn draw(&mut self, state: &mut AppState) -> Result<(), String> {
        self.journal.borrow_mut().push("draw".to_string());
        self.ghost_positions.push(state.lights.ghosts[0].light.position);
        if self.fail {
            Err("surface lost".to_string())
        } else {
            Ok(())
        }
    }
}

pub struct RecordingScheduler {
    pub journal: Journal,
}

impl Scheduler for RecordingScheduler {
    fn schedule_next(&self) {
        self.journal.borrow_mut().push("schedule".to_string());
    }
}

pub fn config(preset: Preset) -> Config {
    Config {
        preset,
        ..Config::default()
    }
}

pub fn app_state(preset: Preset) -> AppState {
    AppState::new(
        &config(preset),
        Viewport::new(800.0, 600.0, 1.0),
        &mut seeded_rng(),
    )
}

pub fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4 && (a.z - b.z).abs() < 1e-4
}
