use std::collections::HashMap;

use image::RgbaImage;

use crate::data_structures::texture::{ColourSpace, TextureHandle};

/**
 * This module contains all logic for loading textures from external files and
 * turning generated geometry into GPU meshes.
 *
 * Loading never blocks scene construction: [`AssetLoader::load_texture`] hands
 * out a pending handle right away and the host fetches the file in the
 * background, feeding the outcome back through [`AssetLoader::complete`].
 */
pub mod mesh;
pub mod texture;

pub use texture::fetch_image;

/// Receives the progress notifications of a [`LoadingManager`].
pub trait LoadingObserver {
    fn on_start(&mut self, url: &str, loaded: usize, total: usize);

    fn on_progress(&mut self, url: &str, loaded: usize, total: usize);

    fn on_load(&mut self);

    fn on_error(&mut self, url: &str);
}

/// Reports loading progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl LoadingObserver for LogObserver {
    fn on_start(&mut self, url: &str, loaded: usize, total: usize) {
        log::info!("Started loading file: {url}. Loaded {loaded} of {total} files.");
    }

    fn on_progress(&mut self, url: &str, loaded: usize, total: usize) {
        log::info!("Loading file: {url}. Loaded {loaded} of {total} files.");
    }

    fn on_load(&mut self) {
        log::info!("Loading complete!");
    }

    fn on_error(&mut self, url: &str) {
        log::warn!("There was an error loading {url}");
    }
}

/// Counts started and finished items and tells its observer about them.
pub struct LoadingManager {
    loaded: usize,
    total: usize,
    loading: bool,
    observer: Box<dyn LoadingObserver>,
}

impl LoadingManager {
    pub fn new(observer: Box<dyn LoadingObserver>) -> Self {
        Self {
            loaded: 0,
            total: 0,
            loading: false,
            observer,
        }
    }

    pub fn item_start(&mut self, url: &str) {
        self.total += 1;
        if !self.loading {
            self.observer.on_start(url, self.loaded, self.total);
        }
        self.loading = true;
    }

    pub fn item_end(&mut self, url: &str) {
        self.loaded += 1;
        self.observer.on_progress(url, self.loaded, self.total);
        if self.loaded == self.total {
            self.loading = false;
            self.observer.on_load();
        }
    }

    /// Reports the failure, then ends the item so the totals still add up.
    pub fn item_error(&mut self, url: &str) {
        self.observer.on_error(url);
        self.item_end(url);
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

impl Default for LoadingManager {
    fn default() -> Self {
        Self::new(Box::new(LogObserver))
    }
}

/// Hands out texture handles and tracks which files still have to be fetched.
#[derive(Default)]
pub struct AssetLoader {
    manager: LoadingManager,
    waiting: HashMap<String, Vec<TextureHandle>>,
    requests: Vec<String>,
}

impl AssetLoader {
    pub fn new(manager: LoadingManager) -> Self {
        Self {
            manager,
            waiting: HashMap::new(),
            requests: Vec::new(),
        }
    }

    /// Returns a pending handle immediately and queues `url` for fetching.
    pub fn load_texture(&mut self, url: &str, colour_space: ColourSpace) -> TextureHandle {
        let handle = TextureHandle::new(url, colour_space);
        self.manager.item_start(url);
        let waiting = self.waiting.entry(url.to_string()).or_default();
        if waiting.is_empty() {
            self.requests.push(url.to_string());
        }
        waiting.push(handle.clone());
        handle
    }

    /// Drains the urls queued since the last call.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }

    /// Resolves every handle waiting on `url` with the outcome of its fetch.
    pub fn complete(&mut self, url: &str, result: anyhow::Result<RgbaImage>) {
        let Some(handles) = self.waiting.remove(url) else {
            log::warn!("completion for {url}, which nobody requested");
            return;
        };
        if let Err(e) = &result {
            log::warn!("texture {url} failed to load: {e:#}");
        }
        for handle in handles {
            if handle.resolve(&result) {
                self.manager.item_end(url);
            } else {
                self.manager.item_error(url);
            }
        }
    }

    /// Number of handles not yet resolved.
    pub fn pending(&self) -> usize {
        self.waiting.values().map(Vec::len).sum()
    }

    pub fn manager(&self) -> &LoadingManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_urls_are_fetched_once() {
        let mut loader = AssetLoader::default();
        let a = loader.load_texture("textures/door/color.jpg", ColourSpace::Srgb);
        let b = loader.load_texture("textures/door/color.jpg", ColourSpace::Srgb);
        assert_eq!(loader.take_requests(), vec!["textures/door/color.jpg".to_string()]);
        assert_eq!(loader.manager().total(), 2);

        loader.complete("textures/door/color.jpg", Ok(RgbaImage::new(2, 2)));
        assert!(a.is_ready() && b.is_ready());
        assert_eq!(loader.manager().loaded(), 2);
        assert!(!loader.manager().is_loading());
    }

    #[test]
    fn unknown_completion_is_ignored() {
        let mut loader = AssetLoader::default();
        loader.complete("nope.jpg", Ok(RgbaImage::new(1, 1)));
        assert_eq!(loader.manager().loaded(), 0);
        assert_eq!(loader.pending(), 0);
    }
}
