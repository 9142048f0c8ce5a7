//! Hybrid query construction.
//!
//! A hybrid query combines a mandatory lexical match with optional
//! fuzzy and vector-similarity scoring clauses. The lexical `must`
//! clause requires at least 60% of the query terms; either `should`
//! clause is enough to boost a hit, and cosine similarity is shifted
//! by +1.0 so script scores stay non-negative.

use serde_json::{json, Value};

/// Percentage of query terms the lexical match must cover.
const LEXICAL_MINIMUM_SHOULD_MATCH: &str = "60%";

/// A hybrid lexical+vector search request.
#[derive(Debug, Clone)]
pub struct HybridQuery {
    /// Lower-cased query text
    pub text: String,

    /// Query embedding vector
    pub vector: Vec<f32>,

    /// Maximum number of hits requested
    pub top_k: usize,
}

impl HybridQuery {
    /// Create a hybrid query. The text is lower-cased here so every
    /// downstream clause sees the same form.
    pub fn new(text: impl Into<String>, vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            text: text.into().to_lowercase(),
            vector,
            top_k,
        }
    }

    /// Render the Elasticsearch request body.
    pub fn to_body(&self) -> Value {
        json!({
            "size": self.top_k,
            "query": {
                "bool": {
                    "must": [
                        {
                            "match": {
                                "text": {
                                    "query": self.text,
                                    "operator": "or",
                                    "minimum_should_match": LEXICAL_MINIMUM_SHOULD_MATCH
                                }
                            }
                        }
                    ],
                    "should": [
                        {
                            "match": {
                                "text": {
                                    "query": self.text,
                                    "operator": "or",
                                    "fuzziness": "AUTO"
                                }
                            }
                        },
                        {
                            "script_score": {
                                "query": {"match_all": {}},
                                "script": {
                                    "source": "cosineSimilarity(params.query_vector, 'embedding') + 1.0",
                                    "params": {"query_vector": self.vector}
                                }
                            }
                        }
                    ],
                    "minimum_should_match": 1
                }
            },
            "highlight": {
                "fields": {
                    "text": {
                        "pre_tags": ["<mark>"],
                        "post_tags": ["</mark>"]
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_lowercased() {
        let query = HybridQuery::new("Quy Nhơn CÓ GÌ chơi?", vec![0.0; 4], 2);
        assert_eq!(query.text, "quy nhơn có gì chơi?");
    }

    #[test]
    fn test_body_structure() {
        let query = HybridQuery::new("tháp đôi", vec![0.5, 0.5], 2);
        let body = query.to_body();

        assert_eq!(body["size"], 2);
        assert_eq!(
            body["query"]["bool"]["must"][0]["match"]["text"]["minimum_should_match"],
            "60%"
        );
        assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);

        let script = &body["query"]["bool"]["should"][1]["script_score"]["script"];
        assert!(script["source"]
            .as_str()
            .unwrap()
            .contains("cosineSimilarity"));
        assert_eq!(script["params"]["query_vector"][0], 0.5);

        assert_eq!(
            body["highlight"]["fields"]["text"]["pre_tags"][0],
            "<mark>"
        );
    }
}
