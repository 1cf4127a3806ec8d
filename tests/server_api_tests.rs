use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use frostforge::data::catalog::Catalog;
use frostforge::server::api::ServerContext;
use frostforge::server::routes::route_request;

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("frostforge-{name}-{stamp}"))
}

fn context(name: &str) -> ServerContext {
    let data_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/progression");
    let scratch = unique_temp_dir(name);
    ServerContext {
        catalog: Catalog::load(&data_dir).expect("bundled tables should load"),
        inventory_path: scratch.join("inventory.json"),
        selections_dir: scratch.join("selections"),
    }
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("response should be valid json")
}

#[test]
fn health_endpoint_reports_loaded_tables() {
    let response = route_request(&context("health"), "GET", "/api/health", "");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "application/json");
    let payload = json(&response.body);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["tables_loaded"], 3);
}

#[test]
fn tables_endpoint_lists_summaries() {
    let response = route_request(&context("tables"), "GET", "/api/tables", "");
    assert_eq!(response.status_code, 200);
    let payload = json(&response.body);
    let tables = payload["tables"].as_array().expect("tables should be an array");
    assert_eq!(tables.len(), 3);

    let gear = tables
        .iter()
        .find(|table| table["id"] == "chief_gear")
        .expect("chief_gear should be listed");
    assert_eq!(gear["key_scheme"], "tier_star");
    assert_eq!(gear["levels"], 30);
    assert_eq!(
        gear["categories"],
        serde_json::json!(["infantry", "lancer", "marksman"])
    );
}

#[test]
fn table_detail_includes_levels_and_formatted_power() {
    let response = route_request(&context("detail"), "GET", "/api/tables/chief_charms", "");
    assert_eq!(response.status_code, 200);
    let payload = json(&response.body);
    assert_eq!(payload["stat"], "percent");
    let levels = payload["level_list"].as_array().unwrap();
    assert_eq!(levels.len(), 17);
    assert_eq!(levels[3]["power_display"], "16.00%");
    assert_eq!(levels[3]["cost"]["guides"], 60);
    assert_eq!(payload["slot_layout"].as_array().map(Vec::len), Some(18));
}

#[test]
fn cost_endpoint_sums_ad_hoc_ranges() {
    let body = r#"{
        "table": "chief_gear",
        "ranges": [
            { "from": { "tier": "Gold", "star": 0 }, "to": { "tier": "Gold T1", "star": 0 } },
            { "from": { "tier": "Red", "star": 2 }, "to": { "tier": "Red", "star": 1 } }
        ]
    }"#;
    let response = route_request(&context("cost"), "POST", "/api/cost", body);
    assert_eq!(response.status_code, 200);

    let payload = json(&response.body);
    assert_eq!(payload["sum"]["hardenedAlloy"], 112_000);
    assert_eq!(payload["sum"]["designPlans"], 85);
    assert_eq!(payload["final_power"].as_f64(), Some(98_000.0));
    assert_eq!(payload["final_power_display"], "98000.00");
    assert_eq!(payload["contributing_ranges"], 1);
    assert_eq!(payload["skipped"][0]["index"], 1);
    assert_eq!(payload["skipped"][0]["reason"]["kind"], "non_increasing");
    assert!(payload.get("breakdown").is_none());
}

#[test]
fn cost_endpoint_applies_bulk_then_slot_overrides() {
    let body = r#"{
        "table": "chief_charms",
        "bulk": [ { "category": "Lancer", "from": 0, "to": 5 } ],
        "slots": { "ring-1": { "from": 2, "to": 4 } },
        "owned": { "guides": 1000, "designs": 5000 }
    }"#;
    let response = route_request(&context("bulk"), "POST", "/api/cost", body);
    assert_eq!(response.status_code, 200);

    let payload = json(&response.body);
    assert_eq!(payload["contributing_ranges"], 7);
    assert_eq!(payload["sum"]["guides"], 1_850);
    assert_eq!(payload["sum"]["designs"], 2_300);
    assert_eq!(payload["final_power"].as_f64(), Some(19.0));
    assert_eq!(payload["final_power_display"], "19.00%");

    let comparison = &payload["comparison"];
    assert_eq!(comparison["guides"]["surplus"], -850);
    assert_eq!(comparison["guides"]["sufficient"], false);
    assert_eq!(comparison["designs"]["surplus"], 2_700);
    assert_eq!(comparison["designs"]["sufficient"], true);
    assert!(comparison.get("secrets").is_none());

    let breakdown = payload["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 18);
    assert_eq!(breakdown[0]["outcome"]["status"], "unset");
}

#[test]
fn cost_endpoint_skips_unfinished_ranges_and_costs_the_rest() {
    let unfinished = [
        r#"{ "from": null, "to": 3 }"#,
        r#"{ "from": -1, "to": 3 }"#,
        r#"{ "from": { "tier": "Gold", "star": 999 }, "to": 3 }"#,
        r#"{ "to": 3 }"#,
    ];
    for bad in unfinished {
        let body = format!(
            r#"{{ "table": "chief_charms", "ranges": [ {{ "from": 0, "to": 3 }}, {bad} ] }}"#
        );
        let response = route_request(&context("unfinished"), "POST", "/api/cost", &body);
        assert_eq!(response.status_code, 200, "{bad}: {}", response.body);

        let payload = json(&response.body);
        assert_eq!(payload["sum"]["guides"], 105, "{bad}");
        assert_eq!(payload["sum"]["designs"], 60, "{bad}");
        assert_eq!(payload["final_power"].as_f64(), Some(16.0), "{bad}");
        assert_eq!(payload["contributing_ranges"], 1, "{bad}");
        let skipped = payload["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 1, "{bad}");
        assert_eq!(skipped[0]["index"], 1);
        assert_eq!(skipped[0]["reason"]["kind"], "malformed_key");
    }
}

#[test]
fn cost_endpoint_marks_unfinished_slot_invalid() {
    let body = r#"{
        "table": "chief_charms",
        "slots": {
            "hat-1": { "from": 0, "to": 2 },
            "hat-2": { "from": null, "to": 2 }
        }
    }"#;
    let response = route_request(&context("unfinished-slot"), "POST", "/api/cost", body);
    assert_eq!(response.status_code, 200);

    let payload = json(&response.body);
    assert_eq!(payload["sum"]["guides"], 45);
    assert_eq!(payload["contributing_ranges"], 1);
    let breakdown = payload["breakdown"].as_array().unwrap();
    let hat_2 = breakdown
        .iter()
        .find(|row| row["slot_id"] == "hat-2")
        .expect("hat-2 should be listed");
    assert_eq!(hat_2["outcome"]["status"], "invalid");
    assert!(hat_2["range"]["from"].is_null());
}

#[test]
fn cost_endpoint_rejects_unknown_slots_and_categories() {
    let body = r#"{
        "table": "chief_charms",
        "bulk": [ { "category": "cavalry", "from": 0, "to": 5 } ],
        "slots": { "boots-1": { "from": 0, "to": 1 } }
    }"#;
    let response = route_request(&context("reject"), "POST", "/api/cost", body);
    assert_eq!(response.status_code, 400);

    let payload = json(&response.body);
    assert_eq!(payload["message"], "Validation failed");
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["bulk", "slots"]);
}

#[test]
fn cost_endpoint_returns_404_for_unloaded_table() {
    let body = r#"{ "table": "hero_gear", "ranges": [ { "from": 0, "to": 1 } ] }"#;
    let response = route_request(&context("missing"), "POST", "/api/cost", body);
    assert_eq!(response.status_code, 404);
    assert!(response.body.contains("hero_gear"));
}

#[test]
fn compare_endpoint_uses_saved_inventory_when_owned_is_omitted() {
    let ctx = context("compare");
    let put = route_request(&ctx, "PUT", "/api/inventory", r#"{ "hardenedAlloy": 10, "polishingSolution": 20 }"#);
    assert_eq!(put.status_code, 200);

    let get = route_request(&ctx, "GET", "/api/inventory", "");
    assert_eq!(json(&get.body)["owned"]["polishingSolution"], 20);

    let body = r#"{ "required": { "hardenedAlloy": 12, "polishingSolution": 7, "designPlans": 7 } }"#;
    let response = route_request(&ctx, "POST", "/api/compare", body);
    assert_eq!(response.status_code, 200);
    let payload = json(&response.body);
    assert_eq!(payload["comparison"]["hardenedAlloy"]["surplus"], -2);
    assert_eq!(payload["comparison"]["polishingSolution"]["surplus"], 13);
    assert_eq!(payload["comparison"]["designPlans"]["surplus"], -7);
    assert_eq!(payload["comparison"]["designPlans"]["sufficient"], false);

    if let Some(dir) = ctx.inventory_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn selections_round_trip_through_put_and_get() {
    let ctx = context("selections");
    let body = r#"{ "slots": { "hat": { "from": { "tier": "Blue", "star": 0 }, "to": { "tier": "Gold", "star": 0 } } } }"#;
    let put = route_request(&ctx, "PUT", "/api/selections/chief_gear", body);
    assert_eq!(put.status_code, 200);
    assert!(json(&put.body)["saved_at"].is_string());

    let get = route_request(&ctx, "GET", "/api/selections/chief_gear", "");
    let payload = json(&get.body);
    assert_eq!(payload["table"], "chief_gear");
    assert_eq!(payload["slots"]["hat"]["to"]["tier"], "Gold");

    let rejected = route_request(
        &ctx,
        "PUT",
        "/api/selections/chief_gear",
        r#"{ "slots": { "boots": { "from": 0, "to": 1 } } }"#,
    );
    assert_eq!(rejected.status_code, 400);

    let unfinished = route_request(
        &ctx,
        "PUT",
        "/api/selections/chief_gear",
        r#"{ "slots": { "hat": { "from": { "tier": "Blue", "star": 0 }, "to": null } } }"#,
    );
    assert_eq!(unfinished.status_code, 200);
    let reloaded = json(&route_request(&ctx, "GET", "/api/selections/chief_gear", "").body);
    assert_eq!(reloaded["slots"]["hat"]["from"]["tier"], "Blue");
    assert!(reloaded["slots"]["hat"]["to"].is_null());

    let missing = route_request(&ctx, "GET", "/api/selections/hero_gear", "");
    assert_eq!(missing.status_code, 404);

    if let Some(dir) = ctx.selections_dir.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn index_page_is_served() {
    let response = route_request(&context("index"), "GET", "/", "");
    assert_eq!(response.status_code, 200);
    assert!(response.content_type.starts_with("text/html"));
    assert!(response.body.contains("/api/cost"));
}
