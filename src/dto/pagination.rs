use serde::{Deserialize, Serialize};

use crate::store::{Page, Paged};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl<T> From<Paged<T>> for Paginated<T> {
    fn from(paged: Paged<T>) -> Self {
        Self {
            total: paged.total,
            page: paged.page.page,
            limit: paged.page.limit,
            pages: paged.pages(),
            items: paged.items,
        }
    }
}
