use serde::{Deserialize, Serialize};

/// Placeholder the catalog returns instead of real field data when the
/// API tier lacks access. Compared as an exact literal.
pub(crate) const UPGRADE_GATE_SENTINEL: &str =
    "Upgrade Plans To Premium/Supreme - https://perenual.com/subscription-api-pricing. I'm sorry";

/// Image the catalog hands out in place of gated pictures.
pub(crate) const UPGRADE_GATE_IMAGE_URL: &str =
    "https://perenual.com/storage/image/upgrade_access.jpg";

pub(crate) const UPGRADE_LABEL: &str = "upgrade API plan";

pub(crate) const PLACEHOLDER_IMAGE: &str = "/static/images/default-plant.jpg";

pub(crate) type PlantId = i64;

/// Image sizes attached to a catalog record.
///
/// Only the two sizes we render from are kept; the rest of the descriptor
/// (license, thumbnails, ...) is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ImageDescriptor {
    pub medium_url: Option<String>,
    pub original_url: Option<String>,
}

/// A record as it arrives from `/api/get-plant-list`.
///
/// The catalog is loose about shapes (nulls, lists where a string is
/// expected), so records are read field by field from JSON instead of
/// through a derived `Deserialize`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RawPlantRecord {
    pub id: Option<PlantId>,
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub cycle: Option<String>,
    pub watering: Option<String>,
    pub sunlight: Option<String>,
    pub default_image: Option<ImageDescriptor>,
}

/// Reads a text field, joining string lists with ", ".
fn text_field(item: &serde_json::Value, key: &str) -> Option<String> {
    match item.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            Some(parts.join(", "))
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(item: &serde_json::Value) -> Option<PlantId> {
    match item.get("id")? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl RawPlantRecord {
    pub(crate) fn from_value(item: &serde_json::Value) -> Self {
        let default_image = item
            .get("default_image")
            .filter(|v| v.is_object())
            .map(|img| ImageDescriptor {
                medium_url: text_field(img, "medium_url").filter(|s| !s.trim().is_empty()),
                original_url: text_field(img, "original_url").filter(|s| !s.trim().is_empty()),
            });

        Self {
            id: id_field(item),
            common_name: text_field(item, "common_name"),
            scientific_name: text_field(item, "scientific_name"),
            cycle: text_field(item, "cycle"),
            watering: text_field(item, "watering"),
            sunlight: text_field(item, "sunlight"),
            default_image,
        }
    }

    /// Parses the `data` list of a search response. Non-object entries are
    /// dropped.
    pub(crate) fn list_from_response(data: &serde_json::Value) -> Vec<Self> {
        data.get("data")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter(|item| item.is_object())
                    .map(Self::from_value)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NormalizedPlant {
    pub id: PlantId,
    pub common_name: String,
    pub scientific_name: String,
    pub cycle: String,
    pub watering: String,
    pub sunlight: String,
    pub image_url: String,
}

pub(crate) fn normalize_image(image: Option<&ImageDescriptor>) -> String {
    let Some(image) = image else {
        return PLACEHOLDER_IMAGE.to_string();
    };

    match image.medium_url.as_deref() {
        Some(UPGRADE_GATE_IMAGE_URL) => PLACEHOLDER_IMAGE.to_string(),
        Some(medium) => medium.to_string(),
        None => match image.original_url.as_deref() {
            Some(original) if original != UPGRADE_GATE_IMAGE_URL => original.to_string(),
            _ => PLACEHOLDER_IMAGE.to_string(),
        },
    }
}

pub(crate) fn normalize_gated_text(value: &str) -> String {
    if value == UPGRADE_GATE_SENTINEL {
        UPGRADE_LABEL.to_string()
    } else {
        value.to_string()
    }
}

/// Converts a raw record into the shape the renderer works with.
///
/// Returns `None` for records without an id: their controls could not be
/// addressed.
pub(crate) fn normalize(raw: &RawPlantRecord) -> Option<NormalizedPlant> {
    let id = raw.id?;
    let gated = |v: &Option<String>| normalize_gated_text(v.as_deref().unwrap_or_default());

    Some(NormalizedPlant {
        id,
        common_name: raw.common_name.clone().unwrap_or_default(),
        scientific_name: raw.scientific_name.clone().unwrap_or_default(),
        cycle: gated(&raw.cycle),
        watering: gated(&raw.watering),
        sunlight: gated(&raw.sunlight),
        image_url: normalize_image(raw.default_image.as_ref()),
    })
}

pub(crate) fn normalize_all(records: &[RawPlantRecord]) -> Vec<NormalizedPlant> {
    records
        .iter()
        .filter_map(|raw| {
            let plant = normalize(raw);
            if plant.is_none() {
                log::debug!("skipping catalog record without id: {:?}", raw.common_name);
            }
            plant
        })
        .collect()
}
