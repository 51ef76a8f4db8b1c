//! Public metric identifiers and the vendor queries they stand for.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    DescribeSiteTimeSeriesData,
    DescribeSiteTopData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Traffic,
    Requests,
    RequestTraffic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    All,
    ClientCountryCode,
    ClientProvinceCode,
    EdgeResponseStatusCode,
    ClientRequestHost,
    ClientRequestPath,
    EdgeResponseContentType,
    ClientIp,
    ClientRequestReferer,
    ClientOs,
    ClientRequestUserAgent,
    ClientRequestMethod,
    EdgeCacheStatus,
}

/// Shape of the vendor response for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    TimeSeries,
    TopN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub action: Action,
    pub field_name: FieldName,
    pub dimension: Dimension,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::DescribeSiteTimeSeriesData => "DescribeSiteTimeSeriesData",
            Action::DescribeSiteTopData => "DescribeSiteTopData",
        }
    }
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Traffic => "Traffic",
            FieldName::Requests => "Requests",
            FieldName::RequestTraffic => "RequestTraffic",
        }
    }
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::All => "ALL",
            Dimension::ClientCountryCode => "ClientCountryCode",
            Dimension::ClientProvinceCode => "ClientProvinceCode",
            Dimension::EdgeResponseStatusCode => "EdgeResponseStatusCode",
            Dimension::ClientRequestHost => "ClientRequestHost",
            Dimension::ClientRequestPath => "ClientRequestPath",
            Dimension::EdgeResponseContentType => "EdgeResponseContentType",
            Dimension::ClientIp => "ClientIP",
            Dimension::ClientRequestReferer => "ClientRequestReferer",
            Dimension::ClientOs => "ClientOS",
            Dimension::ClientRequestUserAgent => "ClientRequestUserAgent",
            Dimension::ClientRequestMethod => "ClientRequestMethod",
            Dimension::EdgeCacheStatus => "EdgeCacheStatus",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricSpec {
    pub fn family(&self) -> MetricFamily {
        match self.action {
            Action::DescribeSiteTimeSeriesData => MetricFamily::TimeSeries,
            Action::DescribeSiteTopData => MetricFamily::TopN,
        }
    }
}

const fn series(field_name: FieldName) -> MetricSpec {
    MetricSpec {
        action: Action::DescribeSiteTimeSeriesData,
        field_name,
        dimension: Dimension::All,
    }
}

const fn top(field_name: FieldName, dimension: Dimension) -> MetricSpec {
    MetricSpec {
        action: Action::DescribeSiteTopData,
        field_name,
        dimension,
    }
}

use Dimension::*;
use FieldName::{RequestTraffic, Requests, Traffic};

pub const METRIC_TABLE: &[(&str, MetricSpec)] = &[
    ("l7Flow_flux", series(Traffic)),
    ("l7Flow_inFlux", series(RequestTraffic)),
    ("l7Flow_outFlux", series(Traffic)),
    ("l7Flow_request", series(Requests)),
    ("l7Flow_outFlux_country", top(Traffic, ClientCountryCode)),
    ("l7Flow_request_country", top(Requests, ClientCountryCode)),
    ("l7Flow_outFlux_province", top(Traffic, ClientProvinceCode)),
    ("l7Flow_request_province", top(Requests, ClientProvinceCode)),
    ("l7Flow_outFlux_statusCode", top(Traffic, EdgeResponseStatusCode)),
    ("l7Flow_request_statusCode", top(Requests, EdgeResponseStatusCode)),
    ("l7Flow_outFlux_domain", top(Traffic, ClientRequestHost)),
    ("l7Flow_request_domain", top(Requests, ClientRequestHost)),
    ("l7Flow_outFlux_url", top(Traffic, ClientRequestPath)),
    ("l7Flow_request_url", top(Requests, ClientRequestPath)),
    ("l7Flow_outFlux_resourceType", top(Traffic, EdgeResponseContentType)),
    ("l7Flow_request_resourceType", top(Requests, EdgeResponseContentType)),
    ("l7Flow_outFlux_sip", top(Traffic, ClientIp)),
    ("l7Flow_request_sip", top(Requests, ClientIp)),
    ("l7Flow_outFlux_referers", top(Traffic, ClientRequestReferer)),
    ("l7Flow_request_referers", top(Requests, ClientRequestReferer)),
    ("l7Flow_outFlux_ua_os", top(Traffic, ClientOs)),
    ("l7Flow_request_ua_os", top(Requests, ClientOs)),
    ("l7Flow_outFlux_ua", top(Traffic, ClientRequestUserAgent)),
    ("l7Flow_request_ua", top(Requests, ClientRequestUserAgent)),
    ("l7Flow_outFlux_ua_device", top(Traffic, ClientRequestMethod)),
    ("l7Flow_request_ua_device", top(Requests, ClientRequestMethod)),
    ("l7Flow_outFlux_ua_browser", top(Traffic, EdgeCacheStatus)),
    ("l7Flow_request_ua_browser", top(Requests, EdgeCacheStatus)),
];

lazy_static! {
    static ref METRICS_BY_ID: HashMap<&'static str, MetricSpec> =
        METRIC_TABLE.iter().copied().collect();
}

/// Look up the vendor query for a public metric identifier.
pub fn resolve(metric_id: &str) -> Option<MetricSpec> {
    METRICS_BY_ID.get(metric_id).copied()
}

pub fn family(metric_id: &str) -> Option<MetricFamily> {
    resolve(metric_id).map(|spec| spec.family())
}
