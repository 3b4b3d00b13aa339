use std::ops::RangeInclusive;

use crate::const_config::car::CAR_FIRST_PAGE;

/// Envelope the server wraps a page of a list in
///
/// A list sent as a bare array is read as the only page.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(
    from = "PageOrAll<T>",
    bound(deserialize = "T: serde::Deserialize<'de>")
)]
pub struct Paginated<T> {
    /// Total number of matching items across all pages
    pub count: u64,
    /// Total number of pages
    pub pages: u32,
    /// Page number the data is from (starting at 1)
    pub page: u32,
    pub page_size: u32,
    pub data: Vec<T>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PageOrAll<T> {
    Page {
        count: u64,
        pages: u32,
        page: u32,
        #[serde(alias = "pageSize")]
        page_size: u32,
        data: Vec<T>,
    },
    All(Vec<T>),
}

impl<T> From<PageOrAll<T>> for Paginated<T> {
    fn from(value: PageOrAll<T>) -> Self {
        match value {
            PageOrAll::Page {
                count,
                pages,
                page,
                page_size,
                data,
            } => Self {
                count,
                pages,
                page,
                page_size,
                data,
            },
            PageOrAll::All(data) => Self::single_page(data),
        }
    }
}

impl<T> Paginated<T> {
    /// All items on one page
    pub fn single_page(data: Vec<T>) -> Self {
        Self {
            count: data.len() as u64,
            pages: CAR_FIRST_PAGE,
            page: CAR_FIRST_PAGE,
            page_size: data.len() as u32,
            data,
        }
    }

    /// The page numbers to render a control for
    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        CAR_FIRST_PAGE..=self.pages
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
