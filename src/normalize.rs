//! Reshapes vendor response bodies into the dashboard's `TypeValue` contract.
//!
//! The branch is picked from the requested metric's family, never from the
//! body's shape. Bodies without a usable `Data` array pass through untouched.

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::catalog::{self, MetricFamily};
use crate::timestamp::{millis_to_unix_seconds, parse_unix_seconds};

pub fn normalize(metric_id: Option<&str>, response: Value) -> Value {
    let Some(metric_id) = metric_id else {
        return response;
    };

    match catalog::family(metric_id) {
        Some(MetricFamily::TimeSeries) => normalize_time_series(metric_id, response),
        Some(MetricFamily::TopN) => normalize_top_n(response),
        None => response,
    }
}

fn normalize_time_series(metric_id: &str, mut response: Value) -> Value {
    let Some(body) = response.as_object_mut() else {
        return response;
    };

    let has_first_entry = matches!(
        body.get("Data"),
        Some(Value::Array(data)) if data.first().map_or(false, Value::is_object)
    );
    if !has_first_entry {
        return response;
    }

    let sum = body
        .get("SummarizedData")
        .and_then(|summary| summary.get(0))
        .and_then(|first| first.get("Value"))
        .map(or_zero)
        .unwrap_or_else(|| json!(0));

    if let Some(first) = body
        .get_mut("Data")
        .and_then(|data| data.get_mut(0))
        .and_then(Value::as_object_mut)
    {
        let detail: Vec<Value> = match first.remove("DetailData") {
            Some(Value::Array(items)) => items.iter().map(detail_point).collect(),
            _ => Vec::new(),
        };
        debug!("Normalized {} time series points for {}", detail.len(), metric_id);

        first.insert(
            "TypeValue".to_string(),
            json!([{
                "MetricName": metric_id,
                "Sum": sum,
                "Detail": detail,
            }]),
        );
    }
    body.remove("SummarizedData");

    response
}

fn detail_point(item: &Value) -> Value {
    let value = item.get("Value").map(or_zero).unwrap_or_else(|| json!(0));
    let timestamp = item.get("TimeStamp").and_then(unix_seconds).unwrap_or(0);

    json!({
        "Value": value,
        "Timestamp": timestamp,
    })
}

fn unix_seconds(raw: &Value) -> Option<i64> {
    match raw {
        Value::String(text) => parse_unix_seconds(text),
        Value::Number(millis) => match millis.as_i64() {
            Some(millis) => Some(millis_to_unix_seconds(millis)),
            None => millis
                .as_f64()
                .filter(|m| m.is_finite())
                .map(|m| (m / 1000.0).floor() as i64),
        },
        _ => None,
    }
}

fn normalize_top_n(mut response: Value) -> Value {
    let Some(entries) = response.get_mut("Data").and_then(Value::as_array_mut) else {
        return response;
    };

    for entry in entries.iter_mut() {
        if let Some(Value::Array(details)) = entry.get_mut("DetailData") {
            for detail in details.iter_mut() {
                if let Some(fields) = detail.as_object_mut() {
                    rename_dimension_value(fields);
                }
            }
        }
    }

    response
}

fn rename_dimension_value(fields: &mut Map<String, Value>) {
    if let Some(dimension_value) = fields.remove("DimensionValue") {
        fields.insert("Key".to_string(), dimension_value);
    }
}

/// Falsy JSON values (`null`, `false`, `0`, `""`) collapse to `0`.
fn or_zero(value: &Value) -> Value {
    let falsy = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy {
        json!(0)
    } else {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn time_series_body_becomes_type_value() {
        let body = json!({
            "RequestId": "abc",
            "SummarizedData": [{ "Value": 100 }],
            "Data": [{
                "DetailData": [{ "Value": 10, "TimeStamp": "2025-01-01T00:00:00Z" }]
            }]
        });

        let normalized = normalize(Some("l7Flow_flux"), body);
        assert_eq!(
            normalized,
            json!({
                "RequestId": "abc",
                "Data": [{
                    "TypeValue": [{
                        "MetricName": "l7Flow_flux",
                        "Sum": 100,
                        "Detail": [{ "Value": 10, "Timestamp": 1_735_689_600 }]
                    }]
                }]
            })
        );
        assert!(normalized.get("SummarizedData").is_none());
        assert!(normalized["Data"][0].get("DetailData").is_none());
    }

    #[test]
    fn time_series_defaults_missing_values_to_zero() {
        let body = json!({
            "Data": [{
                "DetailData": [
                    { "Value": null, "TimeStamp": "2025-01-01T00:01:00Z" },
                    { "Value": 7 },
                    { "Value": 3, "TimeStamp": "not a time" },
                    { "Value": 1, "TimeStamp": "2025-01-01" },
                    { "Value": 2, "TimeStamp": 1_735_689_600_500_i64 }
                ],
                "Extra": true
            }]
        });

        let normalized = normalize(Some("l7Flow_request"), body);
        assert_eq!(
            normalized,
            json!({
                "Data": [{
                    "Extra": true,
                    "TypeValue": [{
                        "MetricName": "l7Flow_request",
                        "Sum": 0,
                        "Detail": [
                            { "Value": 0, "Timestamp": 1_735_689_660 },
                            { "Value": 7, "Timestamp": 0 },
                            { "Value": 3, "Timestamp": 0 },
                            { "Value": 1, "Timestamp": 1_735_689_600 },
                            { "Value": 2, "Timestamp": 1_735_689_600 }
                        ]
                    }]
                }]
            })
        );
    }

    #[test]
    fn time_series_without_detail_data_gets_empty_detail() {
        let body = json!({ "SummarizedData": [{ "Value": 5.5 }], "Data": [{}] });
        let normalized = normalize(Some("l7Flow_inFlux"), body);
        assert_eq!(
            normalized,
            json!({
                "Data": [{
                    "TypeValue": [{ "MetricName": "l7Flow_inFlux", "Sum": 5.5, "Detail": [] }]
                }]
            })
        );
    }

    #[test]
    fn top_n_renames_dimension_value_to_key() {
        let body = json!({
            "Data": [{ "DetailData": [{ "DimensionValue": "US", "Value": 5 }] }]
        });
        let normalized = normalize(Some("l7Flow_request_country"), body);
        assert_eq!(
            normalized,
            json!({ "Data": [{ "DetailData": [{ "Key": "US", "Value": 5 }] }] })
        );
    }

    #[test]
    fn top_n_preserves_order_and_unknown_fields() {
        let body = json!({
            "TotalCount": 3,
            "Data": [
                {
                    "Fields": "Traffic",
                    "DetailData": [
                        { "DimensionValue": "/a", "Value": 3, "Share": 0.5 },
                        { "Value": 2 },
                        { "DimensionValue": "/c", "Value": 1 }
                    ]
                },
                { "DetailData": "not an array" },
                { "Other": 1 }
            ]
        });
        let normalized = normalize(Some("l7Flow_outFlux_url"), body);
        assert_eq!(
            normalized,
            json!({
                "TotalCount": 3,
                "Data": [
                    {
                        "Fields": "Traffic",
                        "DetailData": [
                            { "Key": "/a", "Value": 3, "Share": 0.5 },
                            { "Value": 2 },
                            { "Key": "/c", "Value": 1 }
                        ]
                    },
                    { "DetailData": "not an array" },
                    { "Other": 1 }
                ]
            })
        );
    }

    #[test]
    fn empty_data_is_unchanged_for_both_families() {
        let body = json!({ "Data": [], "SummarizedData": [{ "Value": 9 }] });
        assert_eq!(normalize(Some("l7Flow_flux"), body.clone()), body);
        assert_eq!(normalize(Some("l7Flow_request_country"), body.clone()), body);
    }

    #[test]
    fn missing_data_never_panics() {
        let body = json!({ "Code": "InvalidParameter" });
        assert_eq!(normalize(Some("l7Flow_flux"), body.clone()), body);
        assert_eq!(normalize(Some("l7Flow_outFlux_sip"), body.clone()), body);
        assert_eq!(normalize(Some("l7Flow_flux"), json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn unknown_or_absent_metric_passes_through() {
        let body = json!({
            "SummarizedData": [{ "Value": 1 }],
            "Data": [{ "DetailData": [{ "DimensionValue": "x" }] }]
        });
        assert_eq!(normalize(Some("custom"), body.clone()), body);
        assert_eq!(normalize(None, body.clone()), body);
    }
}
