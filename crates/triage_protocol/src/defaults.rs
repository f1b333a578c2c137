//! Canonical default values shared across the matcher components.

/// Base URL of the pattern store when no config overrides it.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/known-issues";

/// Selector locating candidate failure rows in the report document.
pub const DEFAULT_ROW_SELECTOR: &str = "[data-controller='components--rich-text'] h3 strong";

/// Selector locating the error text container inside a record.
pub const DEFAULT_ERROR_SELECTOR: &str = "code strong";

/// Substring a row's text must contain to be treated as a failure entry.
pub const FAILURE_MARKER: &str = "FAIL";

/// Tag of the nearest ancestor treated as the entry's record.
pub const RECORD_ANCESTOR_TAG: &str = "tr";

/// Attribute whose mutation signals an in-document navigation.
pub const NAV_CONTROLLER_ATTR: &str = "data-controller";

/// Debounce window for coalescing mutation bursts into one scan.
pub const DEBOUNCE_DELAY_MS: u64 = 1000;

/// Fallback poll interval for location changes that produce no mutation.
pub const LOCATION_POLL_INTERVAL_MS: u64 = 500;

/// Reserved marker attribute carried by every element the matcher creates.
/// The change observer uses it to recognize self-inflicted mutations.
pub const MARKER_ATTR: &str = "data-triage";

/// Attribute naming the workflow a control routes to ("report"/"delete").
pub const ACTION_ATTR: &str = "data-triage-action";

/// Attribute carrying the id of the row a control belongs to, so action
/// dispatch can resolve the entry without captured state.
pub const ROW_REF_ATTR: &str = "data-triage-row";

/// Class of the per-entry container holding the action control.
pub const ACTIONS_CONTAINER_CLASS: &str = "triage-actions";

/// Class of the report control.
pub const REPORT_CONTROL_CLASS: &str = "triage-report-btn";

/// Class of the delete control.
pub const DELETE_CONTROL_CLASS: &str = "triage-delete-btn";

/// Class of the badge attached to matched error containers.
pub const BADGE_CLASS: &str = "triage-known-issue-badge";

/// Visible badge text.
pub const BADGE_TEXT: &str = "KNOWN ISSUE";
