use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query string for both semantic search endpoints. `filters` is a JSON
/// object passed through as text and only the resume endpoint reads it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
}

/// Body of `GET /api/v2/search/{resumes,jobs}`. `results` is the vector
/// store's raw query output: one inner list per query, and the backend
/// always sends exactly one query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub total_results: usize,
    #[serde(default)]
    pub results: Option<RawSearchResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResults {
    #[serde(default)]
    pub ids: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
}

/// One row of a search result, zipped from the parallel lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: Option<String>,
    pub document: Option<String>,
    pub metadata: Map<String, Value>,
    pub distance: Option<f64>,
}

impl SearchHit {
    /// String value of a metadata key, falling back to the vector id.
    pub fn entity_id(&self, key: &str) -> Option<String> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.id.clone())
    }
}

fn first_row<T: Clone>(lists: &Option<Vec<Vec<T>>>) -> Vec<T> {
    lists
        .as_ref()
        .and_then(|rows| rows.first())
        .cloned()
        .unwrap_or_default()
}

impl SearchResponse {
    pub fn hits(&self) -> Vec<SearchHit> {
        let Some(results) = &self.results else {
            return Vec::new();
        };
        let ids = first_row(&results.ids);
        let documents = first_row(&results.documents);
        let metadatas = first_row(&results.metadatas);
        let distances = first_row(&results.distances);

        let len = ids.len().max(documents.len());
        (0..len)
            .map(|i| SearchHit {
                id: ids.get(i).cloned(),
                document: documents.get(i).cloned().flatten(),
                metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
                distance: distances.get(i).copied().flatten(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hits_zip_parallel_lists() {
        let response: SearchResponse = serde_json::from_value(json!({
            "query": "rust engineer",
            "total_results": 2,
            "results": {
                "ids": [["r1_chunk_0", "r2_chunk_3"]],
                "documents": [["Senior Rust engineer", null]],
                "metadatas": [[{"resume_id": "r1", "chunk_index": 0}, null]],
                "distances": [[0.21, 0.48]]
            }
        }))
        .unwrap();

        let hits = response.hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity_id("resume_id").as_deref(), Some("r1"));
        assert_eq!(hits[0].document.as_deref(), Some("Senior Rust engineer"));
        assert_eq!(hits[1].entity_id("resume_id").as_deref(), Some("r2_chunk_3"));
        assert!(hits[1].document.is_none());
        assert_eq!(hits[1].distance, Some(0.48));
    }

    #[test]
    fn test_empty_and_missing_results() {
        let empty: SearchResponse = serde_json::from_value(json!({
            "query": "kafka",
            "total_results": 0,
            "results": {"documents": [[]], "metadatas": [[]], "distances": [[]]}
        }))
        .unwrap();
        assert!(empty.hits().is_empty());

        let missing: SearchResponse =
            serde_json::from_value(json!({"query": "kafka", "results": null})).unwrap();
        assert!(missing.hits().is_empty());
    }

    #[test]
    fn test_query_omits_absent_filters() {
        let query = SearchQuery {
            query: "rust".to_string(),
            top_k: 20,
            filters: None,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"query": "rust", "top_k": 20})
        );
    }
}
