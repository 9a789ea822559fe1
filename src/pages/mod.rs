use crate::components::ui::{
    Alert, AlertDescription, Button, Card, CardContent, CardDescription, CardHeader, CardTitle,
    Input, Spinner,
};
use crate::dom::{BrowserDom, RESULTS_CONTAINER_ID, SEARCH_ERROR_ID};
use crate::likes::{LikeController, PlantControls, PAGE_LIKE_ID, PAGE_UNLIKE_ID};
use crate::models::PlantId;
use crate::search::SearchController;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::params::Params;
use std::rc::Rc;

#[component]
pub fn SearchPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let term: RwSignal<String> = RwSignal::new(String::new());
    let loading: RwSignal<bool> = RwSignal::new(false);

    let api = Rc::new(app_state.0.api_client.get_value());
    let search =
        StoredValue::new_local(Rc::new(SearchController::new(api, Rc::new(BrowserDom::new()))));

    // Coming back from a detail page: show the previous results again.
    Effect::new(move |_| {
        let plants = app_state.0.last_results.get_untracked();
        if plants.is_empty() {
            return;
        }
        let controller = search.get_value();
        spawn_local(async move {
            controller.show_results(&plants).await;
        });
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let term_val = term.get_untracked();
        let controller = search.get_value();
        loading.set(true);

        spawn_local(async move {
            if let Ok(plants) = controller.on_submit(term_val).await {
                app_state.0.last_results.set(plants);
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[1080px] px-4 py-8">
                <div class="mb-4 space-y-1">
                    <h1 class="text-xl font-semibold">"Plant Catalog"</h1>
                    <p class="text-xs text-muted-foreground">"Search plants by name."</p>
                </div>

                <Card>
                    <CardContent>
                        <form id="plant-search-form" class="flex items-center gap-2" on:submit=on_submit>
                            <Input
                                id="plant-search"
                                name="term"
                                placeholder="monstera, rose, fern..."
                                bind_value=term
                            />
                            <Button attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Searching..." } else { "Search" }}
                                </span>
                            </Button>
                        </form>
                        <div id=SEARCH_ERROR_ID class="mt-2 text-xs text-destructive" role="alert"></div>
                    </CardContent>
                </Card>

                // Filled by the result renderer, not by the view.
                <div id=RESULTS_CONTAINER_ID class="row mt-6 grid grid-cols-1 gap-4 md:grid-cols-3"></div>
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct PlantRouteParams {
    pub plant_id: Option<String>,
}

#[component]
pub fn PlantDetailPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = leptos_router::hooks::use_params::<PlantRouteParams>();

    let plant_id = move || -> Option<PlantId> {
        params
            .get()
            .ok()
            .and_then(|p| p.plant_id)
            .and_then(|id| id.trim().parse().ok())
    };
    let plant = move || plant_id().and_then(|id| app_state.0.find_plant(id));

    let api = Rc::new(app_state.0.api_client.get_value());
    let likes = StoredValue::new_local(LikeController::new(api, Rc::new(BrowserDom::new())));

    // Runs after the controls are in the page, and again if the route param
    // changes; hydrate replaces the previous bindings.
    Effect::new(move |_| {
        let Some(id) = plant_id() else {
            return;
        };
        let status = likes.with_value(|c| c.hydrate(PlantControls::single_page(id)));
        spawn_local(status);
    });

    let button_class = "inline-flex h-8 items-center rounded-md border px-3 text-sm font-medium";

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-md px-4 py-8">
                <div class="mb-4">
                    <a href="/" class="text-sm text-primary underline underline-offset-4">"Back to search"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-xl">
                            {move || match (plant(), plant_id()) {
                                (Some(p), _) => p.common_name,
                                (None, Some(id)) => format!("Plant #{id}"),
                                (None, None) => "Unknown plant".to_string(),
                            }}
                        </CardTitle>
                        <CardDescription>
                            {move || plant().map(|p| p.scientific_name).unwrap_or_default()}
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        {move || plant().map(|p| view! {
                            <div class="flex flex-col gap-2">
                                <img src=p.image_url.clone() alt=p.common_name.clone() class="rounded-md" />
                                <div class="text-xs">{format!("Cycle: {}", p.cycle)}</div>
                                <div class="text-xs">{format!("Watering: {}", p.watering)}</div>
                                <div class="text-xs">{format!("Sunlight: {}", p.sunlight)}</div>
                            </div>
                        })}

                        <Show when=move || plant_id().is_none() fallback=|| ().into_view()>
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive">"Invalid plant id."</AlertDescription>
                            </Alert>
                        </Show>

                        <input
                            type="hidden"
                            id="plant-id"
                            prop:value=move || plant_id().map(|id| id.to_string()).unwrap_or_default()
                        />
                        <div class="mt-4 flex items-center gap-2">
                            <button id=PAGE_LIKE_ID class=button_class style="display: none">"Like"</button>
                            <button id=PAGE_UNLIKE_ID class=button_class style="display: none">"Unlike"</button>
                        </div>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}
