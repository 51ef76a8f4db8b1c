use serde::{Deserialize, Serialize};

use crate::request::QueryWindow;

/// Query string accepted by the traffic endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficQuery {
    pub metric: Option<String>,
    pub action: Option<String>,
    pub name: Option<String>,
    pub dimension: Option<String>,
    pub limit: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub interval: Option<String>,
    pub site_id: Option<String>,
}

impl TrafficQuery {
    /// Build from decoded query pairs. The first occurrence of a key wins,
    /// `Limit` wins over `limit`, and unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        let mut lowercase_limit = None;

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "metric" => &mut query.metric,
                "action" => &mut query.action,
                "name" => &mut query.name,
                "dimension" => &mut query.dimension,
                "Limit" => &mut query.limit,
                "limit" => &mut lowercase_limit,
                "startTime" => &mut query.start_time,
                "endTime" => &mut query.end_time,
                "interval" => &mut query.interval,
                "siteId" => &mut query.site_id,
                _ => continue,
            };
            slot.get_or_insert(value);
        }

        if query.limit.is_none() {
            query.limit = lowercase_limit;
        }
        query
    }

    pub fn window(&self) -> QueryWindow {
        QueryWindow {
            limit: self.limit.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            interval: self.interval.clone(),
            site_id: self.site_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
