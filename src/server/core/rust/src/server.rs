/* src/server/core/rust/src/server.rs */

use std::sync::Arc;

use crate::config::{I18nSection, MosaicConfig};
use crate::editor::SegmentEditor;
use crate::errors::MosaicError;
use crate::memory::MemoryStore;
use crate::page::PageService;
use crate::store::{ContentStore, RegistryStore};
use crate::translator::{HttpTranslator, Translator};

/// Services assembled by `MosaicServer`. Routing layers hold on to these.
#[derive(Clone)]
pub struct MosaicParts {
  pub pages: PageService,
  pub editor: SegmentEditor,
}

pub struct MosaicServer {
  content: Option<Arc<dyn ContentStore>>,
  registry: Option<Arc<dyn RegistryStore>>,
  translator: Option<Arc<dyn Translator>>,
  i18n: I18nSection,
}

impl MosaicServer {
  pub fn new() -> Self {
    Self { content: None, registry: None, translator: None, i18n: I18nSection::default() }
  }

  pub fn content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
    self.content = Some(store);
    self
  }

  pub fn registry_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
    self.registry = Some(store);
    self
  }

  /// One in-memory store serving as both content store and registry.
  pub fn memory_store(self, store: Arc<MemoryStore>) -> Self {
    self.content_store(store.clone()).registry_store(store)
  }

  pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
    self.translator = Some(translator);
    self
  }

  pub fn i18n(mut self, i18n: I18nSection) -> Self {
    self.i18n = i18n;
    self
  }

  /// Apply a loaded config: languages, and an HTTP translator when the
  /// config has a `[translator]` section and none was set explicitly.
  pub fn config(mut self, config: &MosaicConfig) -> Result<Self, MosaicError> {
    self.i18n = config.i18n.clone();
    if self.translator.is_none() {
      if let Some(section) = &config.translator {
        self.translator = Some(Arc::new(HttpTranslator::from_config(section)?));
      }
    }
    Ok(self)
  }

  /// Consume the builder. Both stores are required; a translator is optional
  /// and only needed for the translation operations.
  pub fn into_parts(self) -> Result<MosaicParts, MosaicError> {
    self.i18n.validate().map_err(|e| MosaicError::validation(format!("{e:#}")))?;
    let content =
      self.content.ok_or_else(|| MosaicError::internal("content store not configured"))?;
    let registry =
      self.registry.ok_or_else(|| MosaicError::internal("registry store not configured"))?;

    let pages = PageService::new(content.clone(), registry.clone());
    let mut editor = SegmentEditor::new(content, self.i18n).with_registry(registry);
    if let Some(translator) = self.translator {
      editor = editor.with_translator(translator);
    }
    tracing::debug!(
      languages = ?editor.i18n().languages,
      reference = %editor.i18n().reference,
      "mosaic services assembled"
    );
    Ok(MosaicParts { pages, editor })
  }
}

impl Default for MosaicServer {
  fn default() -> Self {
    Self::new()
  }
}
