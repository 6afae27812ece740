//! Query routing: one raw query becomes a small set of lexical queries and
//! a small set of dense queries.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use ragdb_core::traits::QueryExpander;

use crate::types::RoutedQueries;

const MAX_QUERIES_PER_FAMILY: usize = 3;

pub struct QueryRouter {
    expander: Arc<dyn QueryExpander>,
    expand_timeout: Duration,
}

impl QueryRouter {
    pub fn new(expander: Arc<dyn QueryExpander>, expand_timeout: Duration) -> Self {
        Self { expander, expand_timeout }
    }

    /// Route a raw query. The raw query always leads both families, so an
    /// expander failure or timeout degrades to raw-query-only routing
    /// rather than failing the request.
    pub async fn route(&self, raw_query: &str) -> RoutedQueries {
        let mut routed = RoutedQueries {
            lexical_queries: vec![normalize(raw_query)],
            dense_queries: vec![raw_query.trim().to_string()],
        };
        match tokio::time::timeout(self.expand_timeout, self.expander.expand(raw_query)).await {
            Ok(Ok(expansion)) => {
                for variant in expansion.lexical_variants {
                    let variant = normalize(&variant);
                    if variant.is_empty() || routed.lexical_queries.contains(&variant) {
                        continue;
                    }
                    if routed.lexical_queries.len() >= MAX_QUERIES_PER_FAMILY {
                        break;
                    }
                    routed.lexical_queries.push(variant);
                }
                if let Some(answer) = expansion.hypothetical_answer {
                    let answer = answer.trim().to_string();
                    if !answer.is_empty() {
                        routed.dense_queries.push(answer);
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "query expansion failed, routing raw query only");
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.expand_timeout.as_millis() as u64,
                    "query expansion timed out, routing raw query only"
                );
            }
        }
        routed
    }
}

/// Light lexical normalization: collapse whitespace and lowercase. The
/// index tokenizer lowercases too, so this only affects what the query
/// parser sees.
fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
