//! Building records and the shapes they arrive in
//!
//! Building data reaches the engine as typed records, loose JSON objects
//! (flat or Overpass `elements` with `center`/`tags`) or GeoJSON features.
//! All of them convert once into [`Building`].

use geo::Centroid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use floodsar_core::{Error, Result};

fn default_building_type() -> String {
    "yes".to_string()
}

/// A point asset exposed to flooding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(alias = "osm_id")]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_building_type")]
    pub building_type: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, alias = "is_flooded")]
    pub flooded: bool,
    /// Always within `[0, 1]`
    #[serde(default)]
    pub flood_probability: f64,
}

impl Building {
    pub fn new(id: i64, building_type: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id,
            name: None,
            building_type: building_type.into(),
            lat,
            lon,
            flooded: false,
            flood_probability: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(&self) -> BuildingKind {
        BuildingKind::parse(&self.building_type)
    }

    /// Set a probability, clamped to `[0, 1]`; NaN becomes 0.
    pub fn set_flood_probability(&mut self, p: f64) {
        self.flood_probability = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    }

    fn sanitized(mut self) -> Self {
        self.set_flood_probability(self.flood_probability);
        self
    }
}

/// Building category as tagged in OpenStreetMap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Hospital,
    Kindergarten,
    NursingHome,
    School,
    Apartments,
    Residential,
    /// OSM `building=yes`: a building of unspecified use
    Generic,
    Commercial,
    Industrial,
    Warehouse,
    Unknown,
}

impl BuildingKind {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "hospital" => BuildingKind::Hospital,
            "kindergarten" => BuildingKind::Kindergarten,
            "nursing_home" => BuildingKind::NursingHome,
            "school" => BuildingKind::School,
            "apartments" => BuildingKind::Apartments,
            "residential" => BuildingKind::Residential,
            "yes" => BuildingKind::Generic,
            "commercial" => BuildingKind::Commercial,
            "industrial" => BuildingKind::Industrial,
            "warehouse" => BuildingKind::Warehouse,
            _ => BuildingKind::Unknown,
        }
    }

    /// Evacuation priority weight in `[0, 1]`
    pub fn evacuation_weight(self) -> f64 {
        match self {
            BuildingKind::Hospital => 1.0,
            BuildingKind::Kindergarten | BuildingKind::NursingHome => 0.95,
            BuildingKind::School => 0.9,
            BuildingKind::Apartments => 0.7,
            BuildingKind::Residential => 0.6,
            BuildingKind::Generic | BuildingKind::Unknown => 0.5,
            BuildingKind::Commercial => 0.4,
            BuildingKind::Industrial => 0.3,
            BuildingKind::Warehouse => 0.2,
        }
    }

    /// Typical occupancy
    pub fn people_estimate(self) -> u32 {
        match self {
            BuildingKind::Hospital => 400,
            BuildingKind::School => 300,
            BuildingKind::Apartments => 200,
            BuildingKind::NursingHome => 150,
            BuildingKind::Kindergarten | BuildingKind::Industrial => 100,
            BuildingKind::Commercial | BuildingKind::Unknown => 50,
            BuildingKind::Generic => 20,
            BuildingKind::Warehouse => 10,
            BuildingKind::Residential => 6,
        }
    }
}

/// The shapes building data arrives in
#[derive(Debug, Clone)]
pub enum BuildingSource {
    /// Already typed
    Record(Building),
    /// Flat JSON object or Overpass element
    Mapping(Map<String, Value>),
    /// GeoJSON feature; non-point geometries use their centroid
    Feature(geojson::Feature),
}

impl TryFrom<BuildingSource> for Building {
    type Error = Error;

    fn try_from(source: BuildingSource) -> Result<Self> {
        match source {
            BuildingSource::Record(b) => Ok(b.sanitized()),
            BuildingSource::Mapping(map) => from_mapping(&map),
            BuildingSource::Feature(feature) => from_feature(feature),
        }
    }
}

fn missing(field: &'static str, map: &Map<String, Value>) -> Error {
    Error::InvalidParameter {
        name: field,
        value: Value::Object(map.clone()).to_string(),
        reason: "building record has no numeric coordinate".to_string(),
    }
}

fn from_mapping(map: &Map<String, Value>) -> Result<Building> {
    let tags = map.get("tags").and_then(Value::as_object);
    let center = map.get("center").and_then(Value::as_object);
    let coord = |key: &str| {
        map.get(key)
            .or_else(|| center.and_then(|c| c.get(key)))
            .and_then(Value::as_f64)
    };
    let lat = coord("lat").ok_or_else(|| missing("lat", map))?;
    let lon = coord("lon").ok_or_else(|| missing("lon", map))?;

    let id = map
        .get("osm_id")
        .or_else(|| map.get("id"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let building_type = map
        .get("building_type")
        .or_else(|| map.get("building"))
        .or_else(|| tags.and_then(|t| t.get("building")))
        .and_then(Value::as_str)
        .map_or_else(default_building_type, str::to_string);
    let name = map
        .get("name")
        .or_else(|| tags.and_then(|t| t.get("name")))
        .and_then(Value::as_str)
        .map(str::to_string);
    let flooded = map
        .get("flooded")
        .or_else(|| map.get("is_flooded"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let flood_probability = map
        .get("flood_probability")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Ok(Building {
        id,
        name,
        building_type,
        lat,
        lon,
        flooded,
        flood_probability,
    }
    .sanitized())
}

fn from_feature(feature: geojson::Feature) -> Result<Building> {
    let geometry = feature.geometry.ok_or_else(|| Error::InvalidParameter {
        name: "geometry",
        value: "null".to_string(),
        reason: "building feature has no geometry".to_string(),
    })?;
    let geometry = geo_types::Geometry::<f64>::try_from(geometry.value).map_err(|e| Error::InvalidParameter {
        name: "geometry",
        value: e.to_string(),
        reason: "unsupported building geometry".to_string(),
    })?;
    let point = geometry.centroid().ok_or_else(|| Error::InvalidParameter {
        name: "geometry",
        value: "empty".to_string(),
        reason: "building geometry has no centroid".to_string(),
    })?;

    let mut map = feature.properties.unwrap_or_default();
    map.insert("lat".to_string(), Value::from(point.y()));
    map.insert("lon".to_string(), Value::from(point.x()));
    if !map.contains_key("id") && !map.contains_key("osm_id") {
        if let Some(geojson::feature::Id::Number(n)) = feature.id {
            map.insert("id".to_string(), Value::Number(n));
        }
    }
    from_mapping(&map)
}

/// Parse buildings from JSON text.
///
/// Accepts a GeoJSON `FeatureCollection`, an Overpass response with an
/// `elements` array, or a plain array of building objects.
pub fn parse_buildings(json: &str) -> Result<Vec<Building>> {
    let value: Value = serde_json::from_str(json)?;
    let is_feature_collection = value.get("type").and_then(Value::as_str) == Some("FeatureCollection");

    let sources: Vec<BuildingSource> = if is_feature_collection {
        match geojson::GeoJson::from_json_value(value) {
            Ok(geojson::GeoJson::FeatureCollection(fc)) => {
                fc.features.into_iter().map(BuildingSource::Feature).collect()
            }
            Ok(_) => Vec::new(),
            Err(e) => return Err(Error::Other(format!("invalid GeoJSON: {}", e))),
        }
    } else {
        match value {
            Value::Object(mut obj) => match obj.remove("elements") {
                Some(Value::Array(items)) => mappings(items),
                _ => {
                    return Err(Error::Other(
                        "expected a FeatureCollection, an `elements` array or a JSON array".to_string(),
                    ))
                }
            },
            Value::Array(items) => mappings(items),
            _ => return Err(Error::Other("building data must be a JSON object or array".to_string())),
        }
    };

    sources.into_iter().map(Building::try_from).collect()
}

fn mappings(items: Vec<Value>) -> Vec<BuildingSource> {
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(BuildingSource::Mapping(map)),
            _ => None,
        })
        .collect()
}
