//! Built-in demo data used when the store is empty.

use crate::config::StatsConfig;
use crate::models::{Difficulty, Group, Hiker, HikerStatus, NewRoute, Point, Route};
use crate::services::route_stats::AltitudeModel;

/// Id of the route the demo group follows.
pub const DEMO_ROUTE_ID: &str = "route-elbrus-south";

/// Id of the demo group.
pub const DEMO_GROUP_ID: &str = "group-demo";

fn path(points: &[(f64, f64)]) -> Vec<Point> {
    points
        .iter()
        .map(|&(lat, lon)| Point::new_unchecked(lat, lon))
        .collect()
}

/// A few well-known Caucasus routes.
pub fn default_routes(stats: &StatsConfig, altitude: &mut dyn AltitudeModel) -> Vec<Route> {
    let routes = [
        (
            DEMO_ROUTE_ID,
            NewRoute {
                name: "Elbrus South Route".to_string(),
                location: "Kabardino-Balkaria".to_string(),
                difficulty: Difficulty::VeryHard,
                route_type: "Ascent".to_string(),
                path: path(&[
                    (43.2650, 42.4680),
                    (43.2850, 42.4590),
                    (43.3000, 42.4500),
                    (43.3270, 42.4460),
                    (43.3499, 42.4453),
                ]),
            },
        ),
        (
            "route-sofia-lakes",
            NewRoute {
                name: "Sofia Lakes".to_string(),
                location: "Arkhyz".to_string(),
                difficulty: Difficulty::Medium,
                route_type: "Trekking".to_string(),
                path: path(&[
                    (43.5080, 41.2200),
                    (43.4990, 41.2020),
                    (43.4870, 41.1880),
                    (43.4790, 41.1750),
                ]),
            },
        ),
        (
            "route-chegem-falls",
            NewRoute {
                name: "Chegem Waterfalls".to_string(),
                location: "Chegem gorge".to_string(),
                difficulty: Difficulty::Easy,
                route_type: "Walk".to_string(),
                path: path(&[(43.3570, 43.1180), (43.3530, 43.1120), (43.3510, 43.1060)]),
            },
        ),
    ];

    routes
        .into_iter()
        .map(|(id, fields)| Route::new(id, fields, stats, &mut *altitude))
        .collect()
}

fn hiker(id: &str, name: &str, status: HikerStatus, battery: f64, coords: &str) -> Hiker {
    Hiker {
        id: id.to_string(),
        name: name.to_string(),
        status,
        battery,
        coords: coords.to_string(),
        last_update: "just now".to_string(),
        last_update_at: None,
    }
}

/// One demo group walking the Elbrus route.
pub fn default_groups() -> Vec<Group> {
    vec![Group {
        id: DEMO_GROUP_ID.to_string(),
        name: "Elbrus team".to_string(),
        route_id: Some(DEMO_ROUTE_ID.to_string()),
        hikers: vec![
            hiker(
                "hiker-1",
                "Anna",
                HikerStatus::OnTrail,
                87.0,
                "43.285000° с.ш., 42.459000° в.д.",
            ),
            hiker(
                "hiker-2",
                "Boris",
                HikerStatus::OnTrail,
                64.5,
                "43.284200° с.ш., 42.459800° в.д.",
            ),
            hiker(
                "hiker-3",
                "Dina",
                HikerStatus::InCamp,
                41.0,
                "43.2650° N, 42.4680° E",
            ),
        ],
    }]
}
