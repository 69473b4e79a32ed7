//! Alert decision logic

use crate::models::{AlertState, Category};

/// Decide whether a newly classified reading warrants a new alert.
///
/// True iff no alert has been sent yet for this location, or the category
/// differs from the last alerted one. A sustained condition therefore
/// alerts once, not every cycle, while every transition is reported,
/// de-escalations included, since recipients benefit from knowing
/// conditions improved. Moving back to [`Category::Good`] still sends one
/// closure notice.
///
/// Pure: the decision step never mutates state. Only a successful dispatch
/// does, in the pipeline's recording step.
pub fn should_alert(new_category: Category, state: &AlertState) -> bool {
    match state.last_alerted_category {
        None => true,
        Some(last) => last != new_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state_with(category: Option<Category>) -> AlertState {
        let mut state = AlertState::new("testville");
        if let Some(c) = category {
            state.record_alert(c, Utc::now());
        }
        state
    }

    #[test]
    fn first_reading_always_alerts() {
        let state = state_with(None);
        assert!(should_alert(Category::Good, &state));
        assert!(should_alert(Category::Hazardous, &state));
    }

    #[test]
    fn sustained_category_is_debounced() {
        let state = state_with(Some(Category::Unhealthy));
        assert!(!should_alert(Category::Unhealthy, &state));
    }

    #[test]
    fn escalation_alerts() {
        let state = state_with(Some(Category::Unhealthy));
        assert!(should_alert(Category::VeryUnhealthy, &state));
    }

    #[test]
    fn de_escalation_alerts() {
        let state = state_with(Some(Category::Unhealthy));
        assert!(should_alert(Category::Moderate, &state));
    }

    #[test]
    fn transition_to_good_sends_closure_notice() {
        let state = state_with(Some(Category::Hazardous));
        assert!(should_alert(Category::Good, &state));
    }

    #[test]
    fn decision_is_idempotent_without_a_dispatch() {
        // deciding twice against the same state gives the same answer;
        // nothing hidden mutates between calls
        let state = state_with(Some(Category::Unhealthy));
        assert!(should_alert(Category::VeryUnhealthy, &state));
        assert!(should_alert(Category::VeryUnhealthy, &state));
    }
}
