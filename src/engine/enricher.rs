//! Guide price enrichment.
//!
//! Attaches the official guide price to suggestions that already passed
//! filtering. One request per suggestion, in order. A failed lookup only
//! blanks that item's guide price; the run continues.

use tracing::{debug, info, warn};

use crate::market::GuidePriceSource;
use crate::types::Suggestion;

pub struct GuideEnricher<'a> {
    source: &'a dyn GuidePriceSource,
}

impl<'a> GuideEnricher<'a> {
    pub fn new(source: &'a dyn GuidePriceSource) -> Self {
        Self { source }
    }

    /// Fill `guide_price` on each suggestion. Returns how many resolved.
    pub async fn enrich(&self, suggestions: &mut [Suggestion]) -> usize {
        let mut resolved = 0;

        for s in suggestions.iter_mut() {
            s.guide_price = match self.source.fetch_guide_price(s.item_id).await {
                Ok(Some(price)) => {
                    resolved += 1;
                    Some(price)
                }
                Ok(None) => {
                    debug!(item_id = s.item_id, "No guide price available");
                    None
                }
                Err(e) => {
                    warn!(
                        item_id = s.item_id,
                        error = %e,
                        "Guide price lookup failed, showing as unavailable"
                    );
                    None
                }
            };
        }

        info!(
            requested = suggestions.len(),
            resolved,
            "Guide price enrichment complete"
        );
        resolved
    }
}
