// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::json;

use wirerouter::worker::{
    encode_response, handle_request_json, ConnectionSnapshot, PixelPoint, RouteJobGuard,
    RouteRequest, RouteResponse,
};

fn request_json() -> serde_json::Value {
    json!({
        "jobId": 42,
        "snapshot": {
            "blocks": [
                {"id": "src", "x": 100, "y": 40, "width": 60, "height": 40,
                 "ports": [{"type": "out", "index": 0, "x": 60, "y": 20}]},
                {"id": "dst", "x": 300, "y": 40, "width": 60, "height": 40,
                 "ports": [{"type": "in", "index": 0, "x": 0, "y": 20}]},
                {"id": "low", "x": 300, "y": 200, "width": 60, "height": 40, "rotation": 90,
                 "ports": [{"type": "in", "index": 0, "x": 0, "y": 20}]}
            ],
            "connections": [
                {"from": "src", "to": "dst"},
                {"from": "src", "to": "low"},
                {"from": "src", "to": "missing", "toIndex": 2}
            ]
        },
        "width": 640,
        "height": 480,
        "timeLimitMs": 10000
    })
}

fn connections(value: &serde_json::Value) -> Vec<ConnectionSnapshot> {
    serde_json::from_value(value["snapshot"]["connections"].clone()).expect("connections")
}

#[tokio::test]
async fn worker_routes_positionally_in_pixels() {
    let raw = request_json().to_string();
    let response = handle_request_json(&raw, None).await;
    assert!(response.ok, "{:?}", response.error);
    assert_eq!(response.job_id, 42);

    let routes = response.routes.as_ref().expect("routes");
    assert_eq!(routes.len(), 3);

    let straight = routes[0].as_ref().expect("src -> dst routes");
    assert_eq!(straight, &vec![PixelPoint { x: 160, y: 60 }, PixelPoint { x: 300, y: 60 }]);

    // `low` is turned a quarter, so its input pin faces up at (330, 190).
    let bent = routes[1].as_ref().expect("src -> low routes");
    assert_eq!(bent.first(), Some(&PixelPoint { x: 160, y: 60 }));
    assert_eq!(bent.last(), Some(&PixelPoint { x: 330, y: 190 }));
    let before_last = bent[bent.len() - 2];
    assert_eq!(before_last.x, 330);
    assert!(before_last.y < 190);
    assert!(bent.iter().all(|p| p.x % 10 == 0 && p.y % 10 == 0));
    assert!(bent.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y));

    assert_eq!(routes[2], None);
}

#[tokio::test]
async fn guard_accepts_only_the_state_it_was_captured_for() {
    let value = request_json();
    let current = connections(&value);
    let guard = RouteJobGuard::capture(42, 7, &current);
    let response = handle_request_json(&value.to_string(), None).await;

    assert!(guard.accepts(&response, 7, &current));
    assert!(!guard.accepts(&response, 8, &current), "epoch moved on");

    let mut edited = current.clone();
    edited.pop();
    assert!(!guard.accepts(&response, 7, &edited), "connection removed");

    let mut rewired = current;
    rewired[0].to = "low".to_owned();
    assert!(!guard.accepts(&response, 7, &rewired), "signature changed");
}

#[tokio::test]
async fn responses_round_trip_as_json_lines() {
    let response = handle_request_json(&request_json().to_string(), Some(5_000)).await;
    let line = encode_response(&response).expect("encode");
    assert!(!line.contains('\n'));
    let decoded: RouteResponse = serde_json::from_str(&line).expect("decode");
    assert_eq!(decoded, response);

    let request: RouteRequest = serde_json::from_value(request_json()).expect("request");
    assert_eq!(request.time_limit_ms, Some(10_000));
}
