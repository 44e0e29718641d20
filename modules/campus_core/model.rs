use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Coordinates as returned by the place-search API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Raw search result. Unknown fields are kept and absent ones are not
/// serialized, so rejected places are reported as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    /// Provider place identifier.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Display title, usually the institution name plus a qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Province name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// City name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// District name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    /// Coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Every other field the provider sent.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl RawPlace {
    /// Returns the id when present and non-blank.
    #[must_use]
    pub fn place_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Returns the title when present and non-empty.
    #[must_use]
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }

    /// Administrative areas (province, city, district) that are set.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        [&self.province, &self.city, &self.district]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .filter(|value| !value.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// GeoJSON point used in the campus output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Always `Point`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `[lng, lat]`.
    pub coordinates: [Option<f64>; 2],
}

impl From<Option<Location>> for GeoPoint {
    fn from(location: Option<Location>) -> Self {
        let location = location.unwrap_or_default();
        Self {
            kind: "Point".into(),
            coordinates: [location.lng, location.lat],
        }
    }
}

/// A physical sub-location attributed to one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    /// Source place id; unique across all institutions.
    pub id: String,
    /// Normalized campus name.
    pub name: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Province name.
    pub province: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// District name.
    pub district: Option<String>,
    /// Coordinates.
    pub location: GeoPoint,
}

impl Campus {
    /// Builds a campus record from an accepted place.
    #[must_use]
    pub fn from_place(id: impl Into<String>, name: impl Into<String>, place: &RawPlace) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            address: place.address.clone(),
            province: place.province.clone(),
            city: place.city.clone(),
            district: place.district.clone(),
            location: GeoPoint::from(place.location),
        }
    }
}

/// One roster row plus the campuses reconciled for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    /// Roster identifier.
    pub id: String,
    /// Cleaned institution name; unique within a run.
    pub name: String,
    /// Supervising authority.
    pub affiliation: Option<String>,
    /// Education level.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Merged supplementary metadata (`is985`, `majorCategory`, ...).
    #[serde(flatten)]
    pub supplementary: IndexMap<String, Value>,
    /// Campuses in acceptance order.
    pub campuses: Vec<Campus>,
}

impl Institution {
    /// Creates an institution with no campuses.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            affiliation: None,
            kind: None,
            supplementary: IndexMap::new(),
            campuses: Vec::new(),
        }
    }

    /// Sets affiliation and type.
    #[must_use]
    pub fn with_profile(mut self, affiliation: Option<String>, kind: Option<String>) -> Self {
        self.affiliation = affiliation;
        self.kind = kind;
        self
    }

    /// Returns the campus attached for `place_id`, if any.
    #[must_use]
    pub fn campus(&self, place_id: &str) -> Option<&Campus> {
        self.campuses.iter().find(|campus| campus.id == place_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_place_keeps_unknown_fields_and_numeric_ids() {
        let place: RawPlace = serde_json::from_value(json!({
            "id": 12345,
            "title": "北京大学(昌平校区)",
            "province": "北京市",
            "city": "北京市",
            "district": "昌平区",
            "location": { "lat": 40.2, "lng": 116.2 },
            "category": "教育学校:大学"
        }))
        .unwrap();
        assert_eq!(place.place_id(), Some("12345"));
        assert_eq!(place.extra["category"], "教育学校:大学");
        assert_eq!(place.regions().count(), 3);
    }

    #[test]
    fn blank_id_and_title_are_absent() {
        let place = RawPlace {
            id: Some("  ".into()),
            title: Some(String::new()),
            ..RawPlace::default()
        };
        assert!(place.place_id().is_none());
        assert!(place.title_text().is_none());
    }

    #[test]
    fn institution_serializes_flat_with_geojson_campuses() {
        let place = RawPlace {
            id: Some("p1".into()),
            title: Some("清华大学(深圳校区)".into()),
            location: Some(Location {
                lat: Some(22.6),
                lng: Some(113.9),
            }),
            ..RawPlace::default()
        };
        let mut institution = Institution::new("10003", "清华大学")
            .with_profile(Some("教育部".into()), Some("本科".into()));
        institution
            .supplementary
            .insert("is985".into(), json!(true));
        institution
            .campuses
            .push(Campus::from_place("p1", "深圳校区", &place));
        let value = serde_json::to_value(&institution).unwrap();
        assert_eq!(value["type"], "本科");
        assert_eq!(value["is985"], true);
        assert_eq!(value["campuses"][0]["location"]["type"], "Point");
        assert_eq!(value["campuses"][0]["location"]["coordinates"][0], 113.9);
    }
}
