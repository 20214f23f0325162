use std::sync::Arc;

use crate::platforms::facebook::FacebookHandler;
use crate::platforms::tiktok::TikTokHandler;
use crate::platforms::traits::PlatformHandler;
use crate::platforms::Platform;

pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn PlatformHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// TikTok and Facebook, in classification priority order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TikTokHandler::new()));
        registry.register(Arc::new(FacebookHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn PlatformHandler>) {
        self.handlers.push(handler);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformHandler>> {
        self.handlers
            .iter()
            .find(|h| h.platform() == platform)
            .cloned()
    }

    pub fn find_handler(&self, url: &str) -> Option<Arc<dyn PlatformHandler>> {
        self.get(Platform::classify(url))
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.handlers.iter().map(|h| h.platform())
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
