//! City badge map: concert statistics per city, projected onto the screen and
//! labelled through the placement engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MapStyle, PlacementConfig};
use crate::placement::{
    Algorithm, Anchor, BoundingRect, LabelPlacer, PlacementMetrics, Point, place_with_fallback_as,
};
use crate::projection::MercatorProjection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f32>,
    #[serde(default)]
    pub longitude: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concert {
    pub id: String,
    #[serde(default)]
    pub venue_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStat {
    pub name: String,
    pub count: usize,
    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    /// Concerts per venue name.
    pub venue_visits: BTreeMap<String, usize>,
}

impl CityStat {
    pub fn coordinates(&self) -> Option<(f32, f32)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Tooltip text: city, concert count, then venues by visits.
    pub fn tooltip_lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.name.clone(),
            format!(
                "{} concert{}",
                self.count,
                if self.count == 1 { "" } else { "s" }
            ),
        ];
        let mut venues: Vec<(&String, &usize)> = self.venue_visits.iter().collect();
        venues.sort_by(|a, b| b.1.cmp(a.1));
        lines.extend(
            venues
                .into_iter()
                .map(|(venue, visits)| format!("{venue} ({visits})")),
        );
        lines
    }
}

/// Count concerts per city. Concerts at unknown venues, or venues without a
/// city, are skipped. The first venue of a city with coordinates places it.
pub fn aggregate_city_stats(venues: &[Venue], concerts: &[Concert]) -> Vec<CityStat> {
    let by_id: BTreeMap<&str, &Venue> = venues.iter().map(|v| (v.id.as_str(), v)).collect();
    let mut cities: BTreeMap<String, CityStat> = BTreeMap::new();

    for concert in concerts {
        let Some(venue) = concert
            .venue_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied())
        else {
            continue;
        };
        let Some(city) = venue.city.as_deref().filter(|c| !c.trim().is_empty()) else {
            continue;
        };
        let stat = cities.entry(city.to_string()).or_insert_with(|| CityStat {
            name: city.to_string(),
            count: 0,
            latitude: None,
            longitude: None,
            venue_visits: BTreeMap::new(),
        });
        if stat.coordinates().is_none() && venue.latitude.is_some() && venue.longitude.is_some() {
            stat.latitude = venue.latitude;
            stat.longitude = venue.longitude;
        }
        stat.count += 1;
        *stat.venue_visits.entry(venue.name.clone()).or_insert(0) += 1;
    }

    cities.into_values().collect()
}

/// Lowercase kebab-case id for a city name, with German letters spelled out.
pub fn city_slug(name: &str) -> String {
    let mut spelled = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            'ä' | 'Ä' => spelled.push_str("ae"),
            'ö' | 'Ö' => spelled.push_str("oe"),
            'ü' | 'Ü' => spelled.push_str("ue"),
            'ß' => spelled.push_str("ss"),
            'à' | 'á' | 'â' | 'å' => spelled.push('a'),
            'ç' | 'č' | 'ć' => spelled.push('c'),
            'è' | 'é' | 'ê' | 'ë' | 'ę' => spelled.push('e'),
            'ñ' | 'ń' => spelled.push('n'),
            'ó' | 'ô' | 'ø' => spelled.push('o'),
            'ł' => spelled.push('l'),
            'š' | 'ś' => spelled.push('s'),
            'ž' | 'ź' | 'ż' => spelled.push('z'),
            other => spelled.extend(other.to_lowercase()),
        }
    }

    let mut slug = String::with_capacity(spelled.len());
    for ch in spelled.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if (ch.is_whitespace() || ch == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMarker {
    pub name: String,
    pub slug: String,
    pub count: usize,
    pub tooltip: Vec<String>,
    pub anchor: Point,
    pub label: Point,
    pub badge_radius: f32,
}

impl CityMarker {
    pub fn route(&self) -> String {
        format!("city/{}", self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub bounds: BoundingRect,
    pub markers: Vec<CityMarker>,
    pub metrics: PlacementMetrics,
    pub fallback_used: bool,
    pub highlighted: Option<String>,
}

impl MapScene {
    pub fn marker(&self, city: &str) -> Option<&CityMarker> {
        self.markers.iter().find(|m| m.name == city)
    }

    pub fn is_highlighted(&self, city: &str) -> bool {
        self.highlighted.as_deref() == Some(city)
    }
}

/// Receives interaction events from a [`MapView`].
pub trait MapObserver {
    fn on_hover(&mut self, _city: Option<&str>) {}
    fn on_select(&mut self, _city: &str) {}
}

pub struct MapView {
    projection: MercatorProjection,
    placer: LabelPlacer,
    style: MapStyle,
    algorithm: Option<Algorithm>,
    scene: Option<MapScene>,
    observers: Vec<Box<dyn MapObserver>>,
}

impl MapView {
    pub fn new(projection: MercatorProjection, placement: PlacementConfig, style: MapStyle) -> Self {
        Self {
            projection,
            placer: LabelPlacer::new(placement),
            style,
            algorithm: None,
            scene: None,
            observers: Vec::new(),
        }
    }

    /// Map of Germany with the tuning used for its city badges.
    pub fn german(screen: BoundingRect) -> Self {
        Self::new(
            MercatorProjection::germany(screen),
            PlacementConfig::german_map(),
            MapStyle::default(),
        )
    }

    /// Force a placement strategy instead of choosing by city count.
    pub fn set_algorithm(&mut self, algorithm: Option<Algorithm>) {
        self.algorithm = algorithm;
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    pub fn scene(&self) -> Option<&MapScene> {
        self.scene.as_ref()
    }

    pub fn subscribe(&mut self, observer: Box<dyn MapObserver>) {
        self.observers.push(observer);
    }

    /// Project the cities, place their badges and keep the resulting scene.
    ///
    /// Placement failures fall back to greedy placement, so this never fails.
    pub fn render(&mut self, stats: &[CityStat]) -> &MapScene {
        let anchors: Vec<Anchor<usize>> = stats
            .iter()
            .enumerate()
            .filter_map(|(idx, stat)| {
                let (lat, lon) = stat.coordinates()?;
                let at = self.projection.project(lat, lon);
                Some(Anchor::new(at.x, at.y, self.style.count_circle_radius, idx))
            })
            .collect();
        if anchors.len() < stats.len() {
            debug!(
                skipped = stats.len() - anchors.len(),
                "cities without coordinates left off the map"
            );
        }

        let bounds = self.projection.screen;
        let placement =
            place_with_fallback_as(&mut self.placer, self.algorithm, &anchors, &bounds, &[]);
        let markers = placement
            .results
            .iter()
            .map(|result| {
                let stat = &stats[result.payload];
                CityMarker {
                    name: stat.name.clone(),
                    slug: city_slug(&stat.name),
                    count: stat.count,
                    tooltip: stat.tooltip_lines(),
                    anchor: result.anchor(),
                    label: result.label(),
                    badge_radius: result.radius,
                }
            })
            .collect();

        self.scene.insert(MapScene {
            bounds,
            markers,
            metrics: self.placer.last_metrics().clone(),
            fallback_used: placement.fallback.is_some(),
            highlighted: None,
        })
    }

    /// Highlight a city's marker, or clear the highlight with `None`.
    /// Unknown cities are ignored.
    pub fn hover(&mut self, city: Option<&str>) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if let Some(name) = city {
            if scene.marker(name).is_none() {
                return;
            }
        }
        scene.highlighted = city.map(str::to_string);
        for observer in &mut self.observers {
            observer.on_hover(city);
        }
    }

    pub fn select(&mut self, city: &str) {
        let known = self
            .scene
            .as_ref()
            .is_some_and(|scene| scene.marker(city).is_some());
        if !known {
            return;
        }
        for observer in &mut self.observers {
            observer.on_select(city);
        }
    }

    /// New screen area. Running work is cancelled and the scene dropped until
    /// the next [`MapView::render`].
    pub fn resize(&mut self, screen: BoundingRect) {
        self.placer.destroy();
        self.projection.screen = screen;
        self.scene = None;
    }

    pub fn destroy(&mut self) {
        self.placer.destroy();
        self.scene = None;
        self.observers.clear();
    }
}
