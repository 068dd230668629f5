use livepdf_protocol::{Engine, Orientation, PageSize};

use crate::domain::{DocumentPayload, OptionChange, RenderConfig};

/// Current render configuration plus the latest document payload.
///
/// Pure state: setters overwrite, `snapshot` copies. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    config: RenderConfig,
    payload: DocumentPayload,
}

/// Point-in-time copy of an [`OptionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSnapshot {
    pub config: RenderConfig,
    pub payload: DocumentPayload,
}

impl OptionStore {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            payload: DocumentPayload::default(),
        }
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.config.orientation = orientation;
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.config.page_size = page_size;
    }

    pub fn set_custom_size(&mut self, text: impl Into<String>) {
        self.config.custom_size = Some(text.into());
    }

    pub fn set_engine(&mut self, engine: Engine) {
        self.config.engine = Some(engine);
    }

    pub fn set_payload(&mut self, payload: impl Into<DocumentPayload>) {
        self.payload = payload.into();
    }

    pub fn apply(&mut self, change: OptionChange) {
        match change {
            OptionChange::Orientation(value) => self.set_orientation(value),
            OptionChange::PageSize(value) => self.set_page_size(value),
            OptionChange::CustomSize(text) => self.set_custom_size(text),
            OptionChange::Engine(engine) => self.set_engine(engine),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn snapshot(&self) -> OptionSnapshot {
        OptionSnapshot {
            config: self.config.clone(),
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_portrait_a4_without_payload() {
        let snapshot = OptionStore::default().snapshot();
        assert_eq!(snapshot.config.orientation, Orientation::Portrait);
        assert_eq!(snapshot.config.page_size, PageSize::A4);
        assert!(snapshot.config.custom_size.is_none());
        assert!(snapshot.config.engine.is_none());
        assert!(snapshot.payload.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let mut store = OptionStore::default();
        store.set_page_size(PageSize::F4);
        store.apply(OptionChange::PageSize(PageSize::A5));
        store.set_payload("v1");
        store.set_payload("v2");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.config.page_size, PageSize::A5);
        assert_eq!(snapshot.payload.as_str(), "v2");
    }

    #[test]
    fn custom_size_is_stored_verbatim() {
        let mut store = OptionStore::default();
        store.apply(OptionChange::CustomSize("  not a size  ".into()));
        assert_eq!(
            store.config().custom_size.as_deref(),
            Some("  not a size  ")
        );
    }

    #[test]
    fn snapshots_are_detached_from_later_writes() {
        let mut store = OptionStore::default();
        store.set_payload("first");
        let before = store.snapshot();
        store.set_payload("second");
        store.set_engine(Engine::Chromium);

        assert_eq!(before.payload.as_str(), "first");
        assert!(before.config.engine.is_none());
    }
}
