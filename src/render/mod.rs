use crate::api::PlantApi;
use crate::dom::DomSurface;
use crate::likes::{LikeController, PlantControls};
use crate::models::NormalizedPlant;
use futures::future::join_all;
use std::rc::Rc;

pub(crate) fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn detail_href(plant: &NormalizedPlant) -> String {
    format!("/plants/{}", plant.id)
}

/// Markup for one search result.
///
/// The like/unlike pair starts hidden; hydration reveals one of them.
pub(crate) struct PlantCard<'a> {
    plant: &'a NormalizedPlant,
}

impl<'a> PlantCard<'a> {
    pub fn new(plant: &'a NormalizedPlant) -> Self {
        Self { plant }
    }

    pub fn to_html(&self) -> String {
        let p = self.plant;
        let controls = PlantControls::per_plant(p.id);
        let common_name = html_escape(&p.common_name);

        format!(
            r#"<div class="col-md-4 mb-4">
  <div class="card h-100 rounded-xl border shadow-sm">
    <img src="{image}" class="card-img-top" alt="{common_name}">
    <div class="card-body flex flex-col gap-1 px-4 py-3">
      <h5 class="card-title text-sm font-semibold">{common_name}</h5>
      <h6 class="card-subtitle text-xs italic text-muted-foreground">{scientific_name}</h6>
      <p class="card-text text-xs">Cycle: {cycle}</p>
      <p class="card-text text-xs">Watering: {watering}</p>
      <p class="card-text text-xs">Sunlight: {sunlight}</p>
      <input type="hidden" class="plant-id" value="{id}">
      <div class="flex items-center gap-2">
        <button id="{like_id}" class="btn btn-outline-success" style="display: none">Like</button>
        <button id="{unlike_id}" class="btn btn-success" style="display: none">Unlike</button>
        <a href="{href}" class="btn btn-link">Details</a>
      </div>
    </div>
  </div>
</div>"#,
            image = html_escape(&p.image_url),
            scientific_name = html_escape(&p.scientific_name),
            cycle = html_escape(&p.cycle),
            watering = html_escape(&p.watering),
            sunlight = html_escape(&p.sunlight),
            id = p.id,
            like_id = controls.like_id(),
            unlike_id = controls.unlike_id(),
            href = detail_href(p),
        )
    }
}

/// Appends result cards to the results container and hydrates their
/// like controls.
pub(crate) struct ResultRenderer<A, D> {
    dom: Rc<D>,
    likes: LikeController<A, D>,
}

impl<A, D> ResultRenderer<A, D>
where
    A: PlantApi + 'static,
    D: DomSurface + 'static,
{
    pub fn new(api: Rc<A>, dom: Rc<D>) -> Self {
        Self {
            likes: LikeController::new(api, dom.clone()),
            dom,
        }
    }

    /// Appends one card per plant in order. Each card's controls are bound
    /// right after it is inserted; the status queries then run together.
    pub async fn render(&self, plants: &[NormalizedPlant]) {
        let mut status_queries = Vec::with_capacity(plants.len());
        for plant in plants {
            self.dom.append_result(&PlantCard::new(plant).to_html());
            status_queries.push(self.likes.hydrate(PlantControls::per_plant(plant.id)));
        }
        join_all(status_queries).await;
    }
}
