//! Pagination and sort parameters shared by list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

/// 1-based page number and page size, as sent by clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
  pub page: Option<u32>,
  pub size: Option<u32>,
}

impl PageRequest {
  pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

  pub fn size(&self) -> u32 {
    self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> u64 { u64::from(self.page() - 1) * u64::from(self.size()) }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: u64,
  pub page:  u32,
  pub size:  u32,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
    Self { items, total, page: request.page(), size: request.size() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_and_clamping() {
    let req = PageRequest::default();
    assert_eq!((req.page(), req.size(), req.offset()), (1, 10, 0));

    let req = PageRequest { page: Some(0), size: Some(1_000) };
    assert_eq!((req.page(), req.size()), (1, MAX_PAGE_SIZE));

    let req = PageRequest { page: Some(3), size: Some(25) };
    assert_eq!(req.offset(), 50);
  }
}
