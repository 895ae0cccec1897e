/* src/server/core/rust/src/lib.rs */

pub mod config;
pub mod editor;
pub mod errors;
pub mod memory;
pub mod page;
pub mod server;
pub mod store;
pub mod translator;

// Re-exports for ergonomic use
pub use config::{
  CONFIG_FILE, I18nSection, MosaicConfig, TranslatorSection, find_mosaic_config, load_mosaic_config,
};
pub use editor::{CommitReport, LanguageSyncOutcome, LanguageSyncResult, SegmentEditor, SyncReport};
pub use errors::MosaicError;
pub use memory::MemoryStore;
pub use page::PageService;
pub use server::{MosaicParts, MosaicServer};
pub use store::{ContentStore, RegistryStore, RowPatch, RowQuery, WriteGuard};
pub use translator::{HttpTranslator, TranslationRequest, TranslationResponse, Translator};

pub use mosaic_engine as engine;
