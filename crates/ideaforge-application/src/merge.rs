//! Merges an extraction response into a workspace draft.

use ideaforge_core::broadcast::AutoPopulateData;
use ideaforge_core::evolution::EvolutionTracker;
use ideaforge_core::extraction::ExtractionResponse;
use ideaforge_core::workspace::{NodeType, WorkspaceState};

/// Applies the present fields of `response` to `state` and returns the fields
/// that actually changed.
///
/// Absent and blank fields leave the state untouched. A changed business
/// concept is recorded through `tracker`, with `trigger` as the utterance
/// that caused it and every node label added by this merge as its changes.
pub fn merge_extraction(
    state: &mut WorkspaceState,
    response: &ExtractionResponse,
    tracker: &EvolutionTracker,
    trigger: &str,
) -> AutoPopulateData {
    let mut changes = AutoPopulateData::default();
    let mut introduced = Vec::new();
    let previous_concept = state.dream_statement().map(str::to_string);

    if let Some(concept) = non_blank(response.business_concept.as_deref()) {
        if state.dream_statement() != Some(concept) {
            state.set_dream_statement(concept);
            changes.business_concept = Some(concept.to_string());
        }
        introduced.extend(state.add_node(NodeType::Vision, concept));
    }

    if let Some(market) = non_blank(response.target_market.as_deref()) {
        if state.target_market() != Some(market) {
            state.set_target_market(market);
            changes.target_market = Some(market.to_string());
        }
        introduced.extend(state.add_node(NodeType::Market, market));
    }

    if let Some(features) = &response.key_features {
        let mut added = Vec::new();
        for name in features.iter().filter_map(|f| non_blank(Some(f))) {
            if state.add_feature(name).is_some() {
                added.push(name.to_string());
                introduced.extend(state.add_node(NodeType::Product, name));
            }
        }
        if !added.is_empty() {
            changes.key_features = Some(added);
        }
    }

    if let Some(steps) = &response.next_steps {
        let steps: Vec<String> = steps
            .iter()
            .filter_map(|s| non_blank(Some(s)))
            .map(str::to_string)
            .collect();
        if !steps.is_empty() && steps.as_slice() != state.next_steps() {
            for step in &steps {
                introduced.extend(state.add_node(NodeType::Idea, step));
            }
            state.set_next_steps(steps.clone());
            changes.next_steps = Some(steps);
        }
    }

    if let Some(concept) = &changes.business_concept {
        tracker.record_if_changed(
            state.idea_evolution_mut(),
            previous_concept.as_deref(),
            concept,
            trigger,
            introduced,
        );
    }

    tracing::debug!(
        "[merge] concept={} market={} features={} steps={}",
        changes.business_concept.is_some(),
        changes.target_market.is_some(),
        changes.key_features.as_ref().map_or(0, Vec::len),
        changes.next_steps.as_ref().map_or(0, Vec::len),
    );

    changes
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
