use crate::alerting::alert_type::{AlertType, Severity};
use crate::alerting::model::Alert;
use crate::error::{AlertingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Criteria for listing alerts. Unset fields do not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    /// Case-insensitive substring of the alert id
    pub id: Option<String>,
    pub severity: Option<Severity>,
    pub backup_id: Option<Uuid>,
    /// First day (inclusive) of the creation date range
    pub from_date: Option<NaiveDate>,
    /// Last day (inclusive) of the creation date range
    pub to_date: Option<NaiveDate>,
    /// Alert type name, e.g. `SIZE_ALERT`
    pub alert_type: Option<String>,
    #[serde(default)]
    pub include_deprecated: bool,
}

impl AlertFilter {
    /// Set the creation date range from raw query parameters
    pub fn with_date_range(
        mut self,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<Self> {
        self.from_date = from_date.map(|s| parse_date("fromDate", s)).transpose()?;
        self.to_date = to_date.map(|s| parse_date("toDate", s)).transpose()?;
        Ok(self)
    }

    fn matches(&self, alert: &Alert, alert_type: Option<&AlertType>) -> bool {
        if !self.include_deprecated && !alert.is_active() {
            return false;
        }
        if let Some(id) = &self.id {
            let needle = id.to_lowercase();
            if !alert.id.to_string().contains(&needle) {
                return false;
            }
        }
        if let Some(backup_id) = self.backup_id {
            if alert.backup().map(|b| b.id) != Some(backup_id) {
                return false;
            }
        }
        let day = alert.creation_date.date_naive();
        if self.from_date.map_or(false, |from| day < from) {
            return false;
        }
        if self.to_date.map_or(false, |to| day > to) {
            return false;
        }
        if let Some(severity) = self.severity {
            if alert_type.map(|t| t.severity) != Some(severity) {
                return false;
            }
        }
        if let Some(name) = &self.alert_type {
            if alert.type_name().as_str() != name {
                return false;
            }
        }
        true
    }
}

/// Parse a query date. Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(parameter: &str, value: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            AlertingError::InvalidInput(format!("parameter {} is not a valid date", parameter))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertOrderBy {
    Severity,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertOrder {
    pub order_by: AlertOrderBy,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination_data: PaginationData,
}

/// An alert together with its catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub alert: Alert,
    pub alert_type: Option<AlertType>,
}

/// Filter, order and page a set of alerts
pub fn query_alerts(
    alerts: Vec<Alert>,
    alert_types: &[AlertType],
    filter: &AlertFilter,
    order: AlertOrder,
    page: PageRequest,
) -> Page<AlertView> {
    let types_by_name: HashMap<&str, &AlertType> =
        alert_types.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut views: Vec<AlertView> = alerts
        .into_iter()
        .filter_map(|alert| {
            let alert_type = types_by_name.get(alert.type_name().as_str()).copied();
            if filter.matches(&alert, alert_type) {
                Some(AlertView {
                    alert,
                    alert_type: alert_type.cloned(),
                })
            } else {
                None
            }
        })
        .collect();

    views.sort_by(|a, b| {
        let ordering = match order.order_by {
            AlertOrderBy::Date => a.alert.creation_date.cmp(&b.alert.creation_date),
            AlertOrderBy::Severity => severity_of(a)
                .cmp(&severity_of(b))
                .then(a.alert.creation_date.cmp(&b.alert.creation_date)),
        };
        match order.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = views.len();
    let offset = page.offset.unwrap_or(0);
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let data = views.into_iter().skip(offset).take(limit).collect();

    Page {
        data,
        pagination_data: PaginationData {
            offset,
            limit,
            total,
        },
    }
}

fn severity_of(view: &AlertView) -> Option<Severity> {
    view.alert_type.as_ref().map(|t| t.severity)
}
