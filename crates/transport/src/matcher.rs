//! Line-item matcher.
//!
//! Resolves a transport line item to an order line item through an ordered
//! strategy list, first match wins. No scoring, no backtracking; repeated
//! calls with the same inputs return the same result.

use waybill_orders::{CustomerOrder, OrderLineItem};

use crate::document::TransportLineItem;

/// Keywords that are strong enough on their own to tie two names together.
const DOMAIN_KEYWORDS: &[&str] = &["omega"];

/// Synonym stems folded during normalization: any name opening with one of
/// these collapses to the stem itself ("omega3", "omegacaps" → "omega").
const SYNONYM_STEMS: &[&str] = &["omega"];

/// Which strategy produced a match.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchTier {
    ExplicitLink,
    ExactName,
    ProductId,
    NormalizedName,
    Substring,
    DomainKeyword,
    Positional,
}

/// Result of resolving one transport line item against one order.
#[derive(Debug, PartialEq)]
pub enum MatchOutcome<'a> {
    Matched {
        line: &'a OrderLineItem,
        tier: MatchTier,
        /// An explicit reference was present but pointed at a line that no
        /// longer exists; the match came from a fallback strategy.
        stale_reference: bool,
    },
    NoMatch,
}

/// Resolve `item` (at `position` of `document_item_count` lines) against
/// `order`.
pub fn resolve_line<'a>(
    item: &TransportLineItem,
    position: usize,
    document_item_count: usize,
    order: &'a CustomerOrder,
) -> MatchOutcome<'a> {
    let mut stale_reference = false;

    // 1. Explicit linkage.
    if let Some(link) = &item.order_line_ref {
        let applies = match link.order_id {
            Some(id) => id == order.id,
            // Legacy references carry only the order number.
            None => link.order_number.as_deref() == Some(order.number.as_str()),
        };

        if let Some(id) = link.order_id {
            if id != order.id {
                // The reference names a different order outright: this item
                // does not belong here, do not fall through.
                return MatchOutcome::NoMatch;
            }
        }

        if applies {
            if let Some(line) = order.line_item(link.line_item_id) {
                return MatchOutcome::Matched {
                    line,
                    tier: MatchTier::ExplicitLink,
                    stale_reference: false,
                };
            }
            // Stale reference: recover through the fallback strategies.
            stale_reference = true;
        }
    }

    let matched = |line, tier| MatchOutcome::Matched {
        line,
        tier,
        stale_reference,
    };

    let description = item.description.trim();

    // 2. Exact name match (case-insensitive).
    if let Some(line) = order
        .line_items
        .iter()
        .find(|li| li.product_name.trim().eq_ignore_ascii_case(description))
    {
        return matched(line, MatchTier::ExactName);
    }

    // 3. Exact product-id match.
    if let Some(product_id) = item.product_id {
        if let Some(line) = order
            .line_items
            .iter()
            .find(|li| li.product_id == Some(product_id))
        {
            return matched(line, MatchTier::ProductId);
        }
    }

    // 4. Normalized name match.
    let normalized_item = normalize_name(description);
    if !normalized_item.is_empty() {
        if let Some(line) = order
            .line_items
            .iter()
            .find(|li| normalize_name(&li.product_name) == normalized_item)
        {
            return matched(line, MatchTier::NormalizedName);
        }
    }

    // 5. Substring containment (either direction).
    let lowered_item = description.to_lowercase();
    if !lowered_item.is_empty() {
        if let Some(line) = order.line_items.iter().find(|li| {
            let lowered_line = li.product_name.trim().to_lowercase();
            !lowered_line.is_empty()
                && (lowered_line.contains(&lowered_item) || lowered_item.contains(&lowered_line))
        }) {
            return matched(line, MatchTier::Substring);
        }
    }

    // 6. Domain keyword fallback.
    if let Some(line) = order.line_items.iter().find(|li| {
        let lowered_line = li.product_name.to_lowercase();
        DOMAIN_KEYWORDS
            .iter()
            .any(|kw| lowered_item.contains(kw) && lowered_line.contains(kw))
    }) {
        return matched(line, MatchTier::DomainKeyword);
    }

    // 7. Positional fallback, only when both sides have the same line count.
    if document_item_count == order.line_items.len() {
        if let Some(line) = order.line_items.get(position) {
            return matched(line, MatchTier::Positional);
        }
    }

    MatchOutcome::NoMatch
}

/// Deterministic name normalizer.
///
/// Lowercases, strips everything non-alphanumeric, collapses known synonym
/// families to their stem, and drops a trailing "caps" token.
fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    for stem in SYNONYM_STEMS {
        if stripped.starts_with(stem) {
            return (*stem).to_string();
        }
    }

    match stripped.strip_suffix("caps") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use waybill_core::{OrderId, ProductId};
    use waybill_orders::OrderLineItem;

    use crate::document::OrderLineRef;

    fn order(lines: Vec<OrderLineItem>) -> CustomerOrder {
        CustomerOrder {
            id: OrderId::new(),
            number: "SO-100".to_string(),
            customer_name: "Acme".to_string(),
            line_items: lines,
        }
    }

    fn order_line(name: &str) -> OrderLineItem {
        OrderLineItem::new(name, 10.0, "pcs", 1.0)
    }

    fn item(description: &str) -> TransportLineItem {
        TransportLineItem::new(description, 5.0, "pcs")
    }

    #[test]
    fn explicit_link_wins_over_names() {
        let o = order(vec![order_line("Widget"), order_line("Gadget")]);
        let mut it = item("Widget");
        it.order_line_ref = Some(OrderLineRef {
            order_id: Some(o.id),
            order_number: None,
            line_item_id: o.line_items[1].id,
        });

        match resolve_line(&it, 0, 1, &o) {
            MatchOutcome::Matched { line, tier, stale_reference } => {
                assert_eq!(line.product_name, "Gadget");
                assert_eq!(tier, MatchTier::ExplicitLink);
                assert!(!stale_reference);
            }
            MatchOutcome::NoMatch => panic!("expected explicit-link match"),
        }
    }

    #[test]
    fn reference_to_another_order_rejects_the_item() {
        let o = order(vec![order_line("Widget")]);
        let mut it = item("Widget");
        it.order_line_ref = Some(OrderLineRef {
            order_id: Some(OrderId::new()),
            order_number: None,
            line_item_id: o.line_items[0].id,
        });

        assert_eq!(resolve_line(&it, 0, 1, &o), MatchOutcome::NoMatch);
    }

    #[test]
    fn stale_reference_recovers_through_name_match() {
        let o = order(vec![order_line("Widget")]);
        let mut it = item("widget");
        it.order_line_ref = Some(OrderLineRef {
            order_id: Some(o.id),
            order_number: None,
            line_item_id: waybill_core::OrderLineItemId::new(),
        });

        match resolve_line(&it, 0, 1, &o) {
            MatchOutcome::Matched { tier, stale_reference, .. } => {
                assert_eq!(tier, MatchTier::ExactName);
                assert!(stale_reference);
            }
            MatchOutcome::NoMatch => panic!("expected stale-reference recovery"),
        }
    }

    #[test]
    fn number_only_reference_applies_by_order_number() {
        let o = order(vec![order_line("Widget"), order_line("Gadget")]);
        let mut it = item("nothing alike");
        it.order_line_ref = Some(OrderLineRef {
            order_id: None,
            order_number: Some("SO-100".to_string()),
            line_item_id: o.line_items[1].id,
        });

        match resolve_line(&it, 0, 1, &o) {
            MatchOutcome::Matched { line, tier, .. } => {
                assert_eq!(line.product_name, "Gadget");
                assert_eq!(tier, MatchTier::ExplicitLink);
            }
            MatchOutcome::NoMatch => panic!("expected number-only explicit match"),
        }
    }

    #[test]
    fn exact_name_is_case_insensitive() {
        let o = order(vec![order_line("WIDGET")]);
        match resolve_line(&item("  widget "), 0, 1, &o) {
            MatchOutcome::Matched { tier, .. } => assert_eq!(tier, MatchTier::ExactName),
            MatchOutcome::NoMatch => panic!("expected exact-name match"),
        }
    }

    #[test]
    fn product_id_match_beats_normalized_name() {
        let pid = ProductId::new();
        let mut line = order_line("Completely Different");
        line.product_id = Some(pid);
        let o = order(vec![line]);

        let mut it = item("No Name Overlap");
        it.product_id = Some(pid);

        match resolve_line(&it, 0, 1, &o) {
            MatchOutcome::Matched { tier, .. } => assert_eq!(tier, MatchTier::ProductId),
            MatchOutcome::NoMatch => panic!("expected product-id match"),
        }
    }

    #[test]
    fn omega_variants_fold_to_a_common_stem() {
        // Scenario: "Omega Caps 500mg" vs "OMEGA-3 Caps" with no id overlap.
        let o = order(vec![order_line("OMEGA-3 Caps")]);
        match resolve_line(&item("Omega Caps 500mg"), 0, 1, &o) {
            MatchOutcome::Matched { tier, .. } => assert_eq!(tier, MatchTier::NormalizedName),
            MatchOutcome::NoMatch => panic!("expected normalized-name match"),
        }
    }

    #[test]
    fn trailing_caps_token_is_dropped() {
        let o = order(vec![order_line("Vitamin D3")]);
        match resolve_line(&item("Vitamin-D3 Caps"), 0, 1, &o) {
            MatchOutcome::Matched { tier, .. } => assert_eq!(tier, MatchTier::NormalizedName),
            MatchOutcome::NoMatch => panic!("expected normalized-name match"),
        }
    }

    #[test]
    fn substring_containment_matches_either_direction() {
        let o = order(vec![order_line("Steel Bolt M8 zinc-plated")]);
        match resolve_line(&item("Steel Bolt M8"), 0, 1, &o) {
            MatchOutcome::Matched { tier, .. } => assert_eq!(tier, MatchTier::Substring),
            MatchOutcome::NoMatch => panic!("expected substring match"),
        }
    }

    #[test]
    fn positional_fallback_requires_equal_counts() {
        let o = order(vec![order_line("Alpha"), order_line("Beta")]);

        // Same count: position decides.
        match resolve_line(&item("???"), 1, 2, &o) {
            MatchOutcome::Matched { line, tier, .. } => {
                assert_eq!(tier, MatchTier::Positional);
                assert_eq!(line.product_name, "Beta");
            }
            MatchOutcome::NoMatch => panic!("expected positional match"),
        }

        // Different count: unmatched.
        assert_eq!(resolve_line(&item("???"), 0, 3, &o), MatchOutcome::NoMatch);
    }

    #[test]
    fn resolution_is_deterministic() {
        let o = order(vec![order_line("Omega Forte"), order_line("OMEGA-3 Caps")]);
        let it = item("omega");

        let first = match resolve_line(&it, 0, 1, &o) {
            MatchOutcome::Matched { line, .. } => line.id,
            MatchOutcome::NoMatch => panic!("expected a match"),
        };
        for _ in 0..10 {
            match resolve_line(&it, 0, 1, &o) {
                MatchOutcome::Matched { line, .. } => assert_eq!(line.id, first),
                MatchOutcome::NoMatch => panic!("expected a match"),
            }
        }
    }

    proptest! {
        #[test]
        fn normalization_ignores_case_and_punctuation(name in "[a-zA-Z0-9 ]{0,30}") {
            // Interleave separators and flip case; the normalized form must
            // not change.
            let noisy: String = name.chars().flat_map(|c| [c, '-']).collect();
            prop_assert_eq!(normalize_name(&name), normalize_name(&noisy.to_uppercase()));
        }

        #[test]
        fn resolution_is_stable_for_arbitrary_names(
            description in ".{0,40}",
            names in proptest::collection::vec("[a-zA-Z0-9 -]{1,20}", 1..5),
        ) {
            let o = order(names.iter().map(|n| order_line(n)).collect());
            prop_assert_eq!(
                resolve_line(&item(&description), 0, 1, &o),
                resolve_line(&item(&description), 0, 1, &o)
            );
        }
    }
}
