/* src/server/core/rust/src/page.rs */

use std::sync::Arc;

use mosaic_engine::{RenderNode, ResolvedPage};

use crate::errors::MosaicError;
use crate::store::{ContentStore, RegistryStore, RowQuery};

/// Read path: fetch a page's rows and registry, then run the resolver.
#[derive(Clone)]
pub struct PageService {
  content: Arc<dyn ContentStore>,
  registry: Arc<dyn RegistryStore>,
}

impl PageService {
  pub fn new(content: Arc<dyn ContentStore>, registry: Arc<dyn RegistryStore>) -> Self {
    Self { content, registry }
  }

  /// Either fetch failing is fatal for the whole page; parse problems inside
  /// individual rows are not (see `ResolvedPage::diagnostics`).
  pub async fn resolve(
    &self,
    page_slug: &str,
    language: &str,
  ) -> Result<ResolvedPage, MosaicError> {
    let query = RowQuery::page(page_slug).language(language);
    let (rows, registry) =
      futures_util::future::join(self.content.get(&query), self.registry.list(page_slug, false))
        .await;
    let rows = rows.map_err(|e| unavailable(page_slug, language, &e))?;
    let registry = registry.map_err(|e| unavailable(page_slug, language, &e))?;

    let page = mosaic_engine::resolve(page_slug, language, &rows, &registry);
    tracing::debug!(
      page = page_slug,
      language,
      segments = page.segments.len(),
      tab_entries = page.tab_order.len(),
      "resolved page"
    );
    Ok(page)
  }

  pub async fn render_plan(
    &self,
    page_slug: &str,
    language: &str,
  ) -> Result<Vec<RenderNode>, MosaicError> {
    let page = self.resolve(page_slug, language).await?;
    Ok(mosaic_engine::render_plan(&page))
  }
}

fn unavailable(page_slug: &str, language: &str, cause: &MosaicError) -> MosaicError {
  tracing::warn!(page = page_slug, language, error = %cause, "content fetch failed");
  MosaicError::content_unavailable(format!(
    "content unavailable for {page_slug}/{language}: {}",
    cause.message()
  ))
}
