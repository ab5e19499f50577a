//! Tours and activities model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Geo, Price, UpstreamGeoCode, id_text, non_empty};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    pub pictures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

/// Entry of the activities `data[]`.
///
/// Activities come from more than one backing supplier, so media may be `pictures` (plain
/// URLs) or `media[].uri`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamActivity {
    id: Option<Value>,
    name: Option<String>,
    short_description: Option<String>,
    description: Option<String>,
    geo_code: Option<UpstreamGeoCode>,
    pictures: Option<Vec<Value>>,
    media: Option<Vec<Value>>,
    booking_link: Option<String>,
    price: Option<Value>,
}

impl UpstreamActivity {
    /// Normalize; `None` when the activity has no name
    #[must_use]
    pub fn into_activity(self) -> Option<Activity> {
        let name = non_empty(self.name)?;

        let mut pictures = urls(self.pictures.as_deref(), |v| v.as_str());
        if pictures.is_empty() {
            pictures = urls(self.media.as_deref(), |v| v.get("uri").and_then(Value::as_str));
        }

        Some(Activity {
            id: id_text(self.id.as_ref()).unwrap_or_else(|| name.clone()),
            name,
            description: non_empty(self.short_description).or_else(|| non_empty(self.description)),
            geo: self.geo_code.as_ref().and_then(UpstreamGeoCode::to_geo),
            pictures,
            booking_link: non_empty(self.booking_link),
            price: self.price.as_ref().and_then(Price::from_upstream),
        })
    }
}

fn urls(items: Option<&[Value]>, extract: impl Fn(&Value) -> Option<&str>) -> Vec<String> {
    items
        .unwrap_or_default()
        .iter()
        .filter_map(extract)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(raw: Value) -> Option<Activity> {
        serde_json::from_value::<UpstreamActivity>(raw)
            .unwrap()
            .into_activity()
    }

    #[test]
    fn test_activity_with_pictures() {
        let activity = activity(json!({
            "type": "activity",
            "id": "23642",
            "name": "Skip-the-line tickets to the Prado Museum",
            "shortDescription": "Book your tickets for the Prado Museum in Madrid",
            "geoCode": {"latitude": "40.414000", "longitude": "-3.691000"},
            "rating": "4.500000",
            "pictures": ["https://images.example/prado.jpg"],
            "bookingLink": "https://b2c.example/activities/23642",
            "price": {"currencyCode": "EUR", "amount": "16.00"}
        }))
        .unwrap();

        assert_eq!(activity.id, "23642");
        assert_eq!(activity.pictures, vec!["https://images.example/prado.jpg"]);
        assert_eq!(activity.geo, Some(Geo::new(40.414, -3.691)));
        assert_eq!(
            activity.price,
            Some(Price { amount: 16.0, currency: "EUR".to_string() })
        );
        assert!(activity.description.unwrap().starts_with("Book your tickets"));
    }

    #[test]
    fn test_activity_media_fallback_and_total_price() {
        let activity = activity(json!({
            "id": 991,
            "name": "Harbour cruise",
            "description": "Two hours on the water",
            "media": [{"uri": "https://cdn.example/1.jpg"}, {"type": "video"}, {"uri": " "}],
            "price": {"total": 45, "currency": "AUD"}
        }))
        .unwrap();

        assert_eq!(activity.id, "991");
        assert_eq!(activity.pictures, vec!["https://cdn.example/1.jpg"]);
        assert_eq!(activity.description.as_deref(), Some("Two hours on the water"));
        assert_eq!(activity.price.unwrap().amount, 45.0);
    }

    #[test]
    fn test_empty_pictures_fall_back_to_media() {
        let activity = activity(json!({
            "name": "Walking tour",
            "pictures": [],
            "media": [{"uri": "https://cdn.example/walk.jpg"}],
            "price": {"grandTotal": "30.00", "currency": "EUR"}
        }))
        .unwrap();

        assert_eq!(activity.id, "Walking tour");
        assert_eq!(activity.pictures, vec!["https://cdn.example/walk.jpg"]);
        assert_eq!(activity.price.unwrap().amount, 30.0);
    }

    #[test]
    fn test_activity_without_name_is_dropped() {
        assert!(activity(json!({"id": "1", "pictures": []})).is_none());
    }

    #[test]
    fn test_missing_optionals_serialize_as_absent() {
        let activity = activity(json!({"id": "7", "name": "Free walk"})).unwrap();
        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({"id": "7", "name": "Free walk", "pictures": []})
        );
    }
}
