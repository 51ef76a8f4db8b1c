//! Assembles and signs one vendor API call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    canonical::{canonical_query_string, string_to_sign, SIGNING_METHOD, SIGNING_PATH},
    catalog::{self, MetricSpec},
    credentials::Credentials,
    signer,
    timestamp::{format_utc_seconds, hours_before},
    Result,
};

pub const API_VERSION: &str = "2024-09-10";
pub const DEFAULT_LIMIT: &str = "5";
pub const DEFAULT_INTERVAL: &str = "60";
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Which vendor query a request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSelection {
    Resolved(MetricSpec),
    RawOverride {
        action: Option<String>,
        name: Option<String>,
        dimension: Option<String>,
    },
}

impl MetricSelection {
    pub fn raw(action: Option<&str>, name: Option<&str>, dimension: Option<&str>) -> Self {
        MetricSelection::RawOverride {
            action: non_empty(action),
            name: non_empty(name),
            dimension: non_empty(dimension),
        }
    }

    fn action(&self) -> Option<String> {
        match self {
            MetricSelection::Resolved(spec) => Some(spec.action.to_string()),
            MetricSelection::RawOverride { action, .. } => action.clone(),
        }
    }

    fn field_name(&self) -> Option<String> {
        match self {
            MetricSelection::Resolved(spec) => Some(spec.field_name.to_string()),
            MetricSelection::RawOverride { name, .. } => name.clone(),
        }
    }

    fn dimension(&self) -> Option<String> {
        match self {
            MetricSelection::Resolved(spec) => Some(spec.dimension.to_string()),
            MetricSelection::RawOverride { dimension, .. } => dimension.clone(),
        }
    }
}

/// How an inbound query picks its vendor query and default site.
///
/// `Mapped` resolves the metric through the catalog and falls back to the raw
/// fields for unknown identifiers. `Passthrough` always trusts the raw fields
/// and leaves `SiteId` empty unless the caller sets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionMode {
    Mapped { default_site_id: String },
    Passthrough,
}

impl ResolutionMode {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionMode::Mapped { .. } => "mapped",
            ResolutionMode::Passthrough => "passthrough",
        }
    }

    pub fn default_site_id(&self) -> &str {
        match self {
            ResolutionMode::Mapped { default_site_id } => default_site_id,
            ResolutionMode::Passthrough => "",
        }
    }

    pub fn select(
        &self,
        metric: Option<&str>,
        action: Option<&str>,
        name: Option<&str>,
        dimension: Option<&str>,
    ) -> MetricSelection {
        let resolved = match self {
            ResolutionMode::Mapped { .. } => metric.and_then(catalog::resolve),
            ResolutionMode::Passthrough => None,
        };
        match resolved {
            Some(spec) => MetricSelection::Resolved(spec),
            None => MetricSelection::raw(action, name, dimension),
        }
    }
}

/// Caller-supplied bounds of the query; unset fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub limit: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub interval: Option<String>,
    pub site_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct FieldSelector<'a> {
    #[serde(rename = "FieldName", skip_serializing_if = "Option::is_none")]
    field_name: Option<&'a str>,
    #[serde(rename = "Dimension")]
    dimension: [Option<&'a str>; 1],
}

/// A fully signed vendor request, ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    params: Vec<(String, String)>,
}

impl SignedRequest {
    /// Parameters in transport order, with `Signature` last.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn signature(&self) -> Option<&str> {
        self.get("Signature")
    }
}

/// Random token followed by the current Unix time in milliseconds.
pub fn new_nonce() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Utc::now().timestamp_millis())
}

pub fn build_fields(name: Option<&str>, dimension: Option<&str>) -> Result<String> {
    let fields = [FieldSelector {
        field_name: name,
        dimension: [dimension],
    }];
    Ok(serde_json::to_string(&fields)?)
}

/// Assemble the unsigned parameter mapping for one call.
///
/// Entries that end up `None` are dropped later by canonicalization.
pub fn build_parameters(
    selection: &MetricSelection,
    credentials: &Credentials,
    window: &QueryWindow,
    default_site_id: &str,
    now: DateTime<Utc>,
    nonce: &str,
) -> Result<BTreeMap<&'static str, Option<String>>> {
    let action = selection.action();
    let field_name = selection.field_name();
    let dimension = selection.dimension();
    let fields = build_fields(field_name.as_deref(), dimension.as_deref())?;

    let timestamp = format_utc_seconds(now);
    let start_time = non_empty(window.start_time.as_deref())
        .unwrap_or_else(|| format_utc_seconds(hours_before(now, DEFAULT_WINDOW_HOURS)));
    let end_time = non_empty(window.end_time.as_deref()).unwrap_or_else(|| timestamp.clone());
    let limit = non_empty(window.limit.as_deref()).unwrap_or_else(|| DEFAULT_LIMIT.to_string());
    let interval =
        non_empty(window.interval.as_deref()).unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    let site_id =
        non_empty(window.site_id.as_deref()).unwrap_or_else(|| default_site_id.to_string());

    let mut params = BTreeMap::new();
    params.insert("AccessKeyId", Some(credentials.access_key_id().to_string()));
    params.insert("Action", action);
    params.insert("EndTime", Some(end_time));
    params.insert("Fields", Some(fields));
    params.insert("Format", Some("json".to_string()));
    params.insert("Interval", Some(interval));
    params.insert("Limit", Some(limit));
    params.insert("Metric", dimension);
    params.insert("SignatureMethod", Some("HMAC-SHA1".to_string()));
    params.insert("SignatureNonce", Some(nonce.to_string()));
    params.insert("SignatureVersion", Some("1.0".to_string()));
    params.insert("SiteId", Some(site_id));
    params.insert("StartTime", Some(start_time));
    params.insert("Timestamp", Some(timestamp));
    params.insert("Version", Some(API_VERSION.to_string()));
    Ok(params)
}

/// Sign an assembled parameter mapping and append `Signature`.
pub fn sign_parameters(
    params: BTreeMap<&'static str, Option<String>>,
    credentials: &Credentials,
) -> Result<SignedRequest> {
    let canonical = canonical_query_string(params.iter().map(|(k, v)| (*k, v.as_deref())));
    let to_sign = string_to_sign(SIGNING_METHOD, SIGNING_PATH, &canonical);
    let signature = signer::sign(credentials.access_key_secret(), &to_sign)?;

    let mut ordered: Vec<(String, String)> = params
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect();
    ordered.push(("Signature".to_string(), signature));

    debug!("Signed vendor request with {} parameters", ordered.len());
    Ok(SignedRequest { params: ordered })
}

pub fn build_signed_request(
    selection: &MetricSelection,
    credentials: &Credentials,
    window: &QueryWindow,
    default_site_id: &str,
    now: DateTime<Utc>,
    nonce: &str,
) -> Result<SignedRequest> {
    let params = build_parameters(selection, credentials, window, default_site_id, now, nonce)?;
    sign_parameters(params, credentials)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
