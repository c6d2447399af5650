use serde::{Deserialize, Serialize};

/// Paginated list envelope as the backend sends it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub page_size: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            page_size: 0,
            total: 0,
            total_pages: 0,
        }
    }
}

/// Some list endpoints answer with a `Page` envelope, older ones with a
/// bare array. Every list read decodes through this type so nothing
/// downstream branches on response shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Envelope(Page<T>),
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            ListResponse::Envelope(page) => page,
            ListResponse::Bare(items) => {
                let total = items.len() as u64;
                Page {
                    items,
                    page: 1,
                    page_size: total,
                    total,
                    total_pages: 1,
                }
            }
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.into_page().items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_shape_decodes() {
        let value = json!({
            "items": [{"id": 1}, {"id": 2}],
            "page": 1, "page_size": 20, "total": 2, "total_pages": 1
        });
        let page = serde_json::from_value::<ListResponse<serde_json::Value>>(value)
            .unwrap()
            .into_page();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn bare_array_shape_decodes() {
        let value = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        let page = serde_json::from_value::<ListResponse<serde_json::Value>>(value)
            .unwrap()
            .into_page();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn envelope_with_missing_counters_defaults() {
        let value = json!({"items": []});
        let page = serde_json::from_value::<ListResponse<serde_json::Value>>(value)
            .unwrap()
            .into_page();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }
}
