use std::path::Path;

use geo_types::{LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use redact_common::Rect;
use serde_json::{Map, Number, Value as JsonValue};

use crate::{error::Result, types::DetectedRegions};

fn number(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

/// Closed ring around `rect` in image pixel coordinates (y grows downwards)
pub fn rect_to_geo_polygon(rect: &Rect) -> Polygon<f64> {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    Polygon::new(
        LineString::from(vec![(x1, y1), (x2, y1), (x2, y2), (x1, y2), (x1, y1)]),
        vec![],
    )
}

impl DetectedRegions {
    /// One polygon feature per region, image size in the collection's foreign members
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .regions
            .iter()
            .enumerate()
            .map(|(i, rect)| {
                let mut properties = Map::new();
                properties.insert("id".to_string(), JsonValue::String(format!("region-{i}")));
                properties.insert("area".to_string(), number(rect.area()));
                properties.insert("width".to_string(), number(rect.width));
                properties.insert("height".to_string(), number(rect.height));

                Feature {
                    bbox: Some(vec![rect.x, rect.y, rect.right(), rect.bottom()]),
                    geometry: Some(Geometry::new(Value::from(&rect_to_geo_polygon(rect)))),
                    id: Some(geojson::feature::Id::Number(Number::from(i))),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), JsonValue::Number(self.image_width.into()));
        foreign_members.insert("image_height".to_string(), JsonValue::Number(self.image_height.into()));
        foreign_members.insert("region_count".to_string(), JsonValue::Number(self.regions.len().into()));
        foreign_members.insert("scale".to_string(), number(self.scale));
        if let Some(advisory) = &self.advisory {
            foreign_members.insert("advisory".to_string(), JsonValue::String(advisory.clone()));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    /// Export to GeoJSON and serialize to a JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }

    /// Rebuild regions from a collection written by [`to_geojson`](Self::to_geojson)
    pub fn from_geojson(collection: &FeatureCollection) -> Result<Self> {
        let member = |key: &str| {
            collection
                .foreign_members
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(JsonValue::as_u64)
                .unwrap_or(0) as u32
        };

        let mut regions = Vec::with_capacity(collection.features.len());
        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let polygon = Polygon::<f64>::try_from(geometry.value.clone())?;
            let flat: Vec<f64> = polygon
                .exterior()
                .coords()
                .flat_map(|c| [c.x, c.y])
                .collect();
            regions.push(crate::geometry::poly_to_rect(&flat));
        }

        let scale = collection
            .foreign_members
            .as_ref()
            .and_then(|m| m.get("scale"))
            .and_then(JsonValue::as_f64)
            .unwrap_or(1.0);

        Ok(Self {
            regions,
            image_width: member("image_width"),
            image_height: member("image_height"),
            scale,
            advisory: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DetectedRegions {
        DetectedRegions {
            regions: vec![Rect::new(10.0, 20.0, 100.0, 50.0), Rect::new(5.0, 5.0, 8.0, 4.0)],
            image_width: 640,
            image_height: 480,
            scale: 0.5,
            advisory: None,
        }
    }

    #[test]
    fn test_geojson_export() {
        let collection = sample().to_geojson();
        assert_eq!(collection.features.len(), 2);

        let members = collection.foreign_members.as_ref().unwrap();
        assert_eq!(members["image_width"], 640);
        assert_eq!(members["region_count"], 2);

        let first = &collection.features[0];
        let properties = first.properties.as_ref().unwrap();
        assert_eq!(properties["id"], "region-0");
        assert_eq!(properties["area"], 5000.0);
        match &first.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][2], vec![110.0, 70.0]);
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_geojson_string_reads_back() {
        let regions = sample();
        let text = regions.to_geojson_string().unwrap();
        let parsed: FeatureCollection = text.parse::<geojson::GeoJson>().unwrap().try_into().unwrap();
        assert_eq!(DetectedRegions::from_geojson(&parsed).unwrap(), regions);
    }
}
