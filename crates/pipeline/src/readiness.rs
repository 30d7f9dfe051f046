use crate::run::DeploymentVerdict;

pub const ACTION_IMPROVE_PRECISION: &str =
    "Improve entity matching precision before deployment";
pub const ACTION_GENERATE_STRATEGIES: &str = "Generate counter-narrative strategies";
pub const ACTION_CREATE_TEMPLATES: &str = "Create article content templates";
pub const ACTION_READY: &str = "System ready for deployment";
pub const ACTION_MONITOR: &str = "Monitor performance metrics";
pub const ACTION_REVIEW_CONTENT: &str = "Review generated content before publishing";

/// Stage 6: never fails, always returns a verdict and a non-empty action
/// list. Ready if and only if the precision score clears 0.7 and at least
/// one strategy exists; a missing template set is advice, not a blocker.
pub fn assess(
    precision_score: f64,
    strategy_count: usize,
    template_count: usize,
) -> DeploymentVerdict {
    let mut suggested_actions = Vec::new();
    let mut ready_for_deployment = true;

    if precision_score < 0.7 {
        suggested_actions.push(ACTION_IMPROVE_PRECISION.to_string());
        ready_for_deployment = false;
    }

    if strategy_count == 0 {
        suggested_actions.push(ACTION_GENERATE_STRATEGIES.to_string());
        ready_for_deployment = false;
    }

    if template_count == 0 {
        suggested_actions.push(ACTION_CREATE_TEMPLATES.to_string());
    }

    if ready_for_deployment {
        suggested_actions.push(ACTION_READY.to_string());
        suggested_actions.push(ACTION_MONITOR.to_string());
        suggested_actions.push(ACTION_REVIEW_CONTENT.to_string());
    }

    DeploymentVerdict {
        ready_for_deployment,
        suggested_actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_iff_precision_and_strategies() {
        let verdict = assess(0.71, 1, 2);
        assert!(verdict.ready_for_deployment);
        assert_eq!(verdict.suggested_actions[0], ACTION_READY);

        let not_ready = assess(0.3, 0, 0);
        assert!(!not_ready.ready_for_deployment);
        assert!(not_ready
            .suggested_actions
            .contains(&ACTION_IMPROVE_PRECISION.to_string()));
        assert!(not_ready
            .suggested_actions
            .contains(&ACTION_GENERATE_STRATEGIES.to_string()));
    }

    #[test]
    fn threshold_is_exact() {
        assert!(assess(0.7, 1, 2).ready_for_deployment);
        assert!(!assess(0.699, 1, 2).ready_for_deployment);
    }

    #[test]
    fn strategies_without_precision_are_not_enough() {
        let verdict = assess(0.5, 3, 6);
        assert!(!verdict.ready_for_deployment);
        assert_eq!(
            verdict.suggested_actions,
            vec![ACTION_IMPROVE_PRECISION.to_string()]
        );
    }

    #[test]
    fn verdict_always_has_actions() {
        for (score, strategies, templates) in
            [(0.0, 0, 0), (0.9, 0, 0), (0.9, 2, 0), (0.9, 2, 4)]
        {
            assert!(!assess(score, strategies, templates).suggested_actions.is_empty());
        }
    }
}
