use crate::api::{ApiErrorKind, ApiResult, PlantApi};
use crate::dom::DomSurface;
use crate::models::{normalize_all, NormalizedPlant};
use crate::render::ResultRenderer;
use std::rc::Rc;

/// Runs catalog searches and applies their results to the page.
pub(crate) struct SearchController<A, D> {
    api: Rc<A>,
    dom: Rc<D>,
    renderer: ResultRenderer<A, D>,
}

impl<A, D> SearchController<A, D>
where
    A: PlantApi + 'static,
    D: DomSurface + 'static,
{
    pub fn new(api: Rc<A>, dom: Rc<D>) -> Self {
        Self {
            renderer: ResultRenderer::new(api.clone(), dom.clone()),
            api,
            dom,
        }
    }

    /// Queries the catalog for `term` and normalizes every usable record.
    pub async fn submit(&self, term: &str) -> ApiResult<Vec<NormalizedPlant>> {
        let records = self.api.search_plants(term).await?;
        Ok(normalize_all(&records))
    }

    /// Replaces whatever the results container holds with `plants`.
    pub async fn show_results(&self, plants: &[NormalizedPlant]) {
        self.dom.clear_results();
        self.dom.clear_search_error();
        self.renderer.render(plants).await;
    }

    /// Handles one form submission.
    ///
    /// The results container is cleared once, when the response arrives, so
    /// overlapping searches settle on whichever response completed last.
    pub async fn on_submit(&self, term: String) -> ApiResult<Vec<NormalizedPlant>> {
        log::debug!("searching catalog for {term:?}");

        match self.submit(&term).await {
            Ok(plants) => {
                log::info!("search {term:?}: {} result(s)", plants.len());
                self.show_results(&plants).await;
                Ok(plants)
            }
            Err(e) => {
                match e.kind {
                    ApiErrorKind::Application => log::warn!("search {term:?} rejected: {e}"),
                    _ => log::error!("search {term:?} failed: {e}"),
                }
                self.dom.clear_results();
                self.dom.show_search_error(&e.to_string());
                Err(e)
            }
        }
    }
}
