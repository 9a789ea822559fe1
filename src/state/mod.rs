use crate::api::{ApiClient, EnvConfig};
use crate::models::{NormalizedPlant, PlantId};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: StoredValue<ApiClient>,

    /// Plants from the most recent successful search. The detail page reads
    /// from here and the search page re-renders it when revisited.
    pub last_results: RwSignal<Vec<NormalizedPlant>>,
}

impl AppState {
    pub fn new(config: &EnvConfig) -> Self {
        Self {
            api_client: StoredValue::new(ApiClient::from_env(config)),
            last_results: RwSignal::new(vec![]),
        }
    }

    pub fn find_plant(&self, plant_id: PlantId) -> Option<NormalizedPlant> {
        self.last_results
            .with(|plants| plants.iter().find(|p| p.id == plant_id).cloned())
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
