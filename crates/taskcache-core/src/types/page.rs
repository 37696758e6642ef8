//! Paged collection payloads

use serde::{Deserialize, Serialize};

/// A page of entities plus the size of the whole collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64) -> Self {
        Self { items, total_items }
    }

    /// A page that is the whole collection
    pub fn complete(items: Vec<T>) -> Self {
        let total_items = items.len() as u64;
        Self { items, total_items }
    }
}

/// Collection endpoints answer either with a paged object or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PagePayload<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> From<PagePayload<T>> for Page<T> {
    fn from(payload: PagePayload<T>) -> Self {
        match payload {
            PagePayload::Paged(page) => page,
            PagePayload::Plain(items) => Page::complete(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paged_payload() {
        let payload: PagePayload<u32> =
            serde_json::from_value(json!({"items": [1, 2], "totalItems": 45})).unwrap();
        let page: Page<u32> = payload.into();
        assert_eq!(page, Page::new(vec![1, 2], 45));
    }

    #[test]
    fn test_plain_array_payload() {
        let payload: PagePayload<u32> = serde_json::from_value(json!([4, 5, 6])).unwrap();
        let page: Page<u32> = payload.into();
        assert_eq!(page.total_items, 3);
    }
}
