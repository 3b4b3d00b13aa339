//! Search parameters sent with requests for the car list
//!
//! Selected filter values of the same kind are joined by
//! [`CAR_FILTER_SEPARATOR`] (the server matches any of them) and the page
//! number is always included.

use std::collections::{BTreeMap, BTreeSet};

use reqwest::Url;

use crate::const_config::car::{CAR_FILTER_SEPARATOR, CAR_FIRST_PAGE};

const PARAM_BRAND: &str = "brand";
const PARAM_MOTOR: &str = "motor";
const PARAM_PAGE: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CarListQuery {
    brands: BTreeSet<String>,
    motors: BTreeSet<String>,
    page: u32,
    /// Search parameters that are neither filters nor the page, passed through
    /// unchanged
    other_params: BTreeMap<String, String>,
}

/// Which of the two filter groups a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Brand,
    Motor,
}

impl Default for CarListQuery {
    fn default() -> Self {
        Self {
            brands: Default::default(),
            motors: Default::default(),
            page: CAR_FIRST_PAGE,
            other_params: Default::default(),
        }
    }
}

impl CarListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the query from a search string such as
    /// `?brand=Audi-BMW&motor=Diesel&page=2`
    ///
    /// Invalid page numbers fall back to the first page
    pub fn from_search(search: &str) -> Self {
        let mut result = Self::default();
        let mut url = base_url();
        url.set_query(Some(search.trim_start_matches('?')));
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_BRAND => result.brands.extend(split_filter_values(&value)),
                PARAM_MOTOR => result.motors.extend(split_filter_values(&value)),
                PARAM_PAGE => {
                    result.page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|x| *x >= CAR_FIRST_PAGE)
                        .unwrap_or(CAR_FIRST_PAGE)
                }
                _ => {
                    result
                        .other_params
                        .insert(key.into_owned(), value.into_owned());
                }
            }
        }
        result
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(CAR_FIRST_PAGE);
    }

    pub fn is_selected(&self, kind: FilterKind, value: &str) -> bool {
        self.values(kind).contains(value)
    }

    /// Selects or deselects a filter value
    ///
    /// Any change to the filters goes back to the first page because the
    /// current page number may not exist for the new result set
    pub fn set_filter(&mut self, kind: FilterKind, value: &str, selected: bool) {
        let values = self.values_mut(kind);
        let changed = if selected {
            values.insert(value.to_string())
        } else {
            values.remove(value)
        };
        if changed {
            self.page = CAR_FIRST_PAGE;
        }
    }

    pub fn clear_filters(&mut self) {
        if !self.brands.is_empty() || !self.motors.is_empty() {
            self.brands.clear();
            self.motors.clear();
            self.page = CAR_FIRST_PAGE;
        }
    }

    pub fn has_filters(&self) -> bool {
        !self.brands.is_empty() || !self.motors.is_empty()
    }

    /// All parameters to send, filters and page merged with any other
    /// parameters that were already present
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut result: Vec<(String, String)> = self
            .other_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !self.brands.is_empty() {
            result.push((PARAM_BRAND.to_string(), join_filter_values(&self.brands)));
        }
        if !self.motors.is_empty() {
            result.push((PARAM_MOTOR.to_string(), join_filter_values(&self.motors)));
        }
        result.push((PARAM_PAGE.to_string(), self.page.to_string()));
        result
    }

    /// Url encoded form of [`Self::query_pairs`] (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut url = base_url();
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        url.query().unwrap_or_default().to_string()
    }

    fn values(&self, kind: FilterKind) -> &BTreeSet<String> {
        match kind {
            FilterKind::Brand => &self.brands,
            FilterKind::Motor => &self.motors,
        }
    }

    fn values_mut(&mut self, kind: FilterKind) -> &mut BTreeSet<String> {
        match kind {
            FilterKind::Brand => &mut self.brands,
            FilterKind::Motor => &mut self.motors,
        }
    }
}

fn base_url() -> Url {
    Url::parse("http://localhost/").expect("hard coded url should be valid")
}

fn split_filter_values(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(CAR_FILTER_SEPARATOR)
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(str::to_string)
}

fn join_filter_values(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(|x| x.as_str())
        .collect::<Vec<_>>()
        .join(&CAR_FILTER_SEPARATOR.to_string())
}
