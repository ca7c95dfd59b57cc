use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::commands::detect::{detect_browser, detect_device, ScreenSize};
use crate::error::{FormField, Result, ValidationError};
use crate::util::random_base36;

pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_STEPS_CHARS: usize = 500;
const ID_PREFIX: &str = "BUG";
const ID_SUFFIX_LEN: usize = 6;
const ANONYMOUS: &str = "anonymous";

/// Raw values as typed into the report form. Any of them may be empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BugReportForm {
    pub title: String,
    pub category: String,
    pub severity: String,
    pub description: String,
    pub steps: String,
    pub contact: String,
}

/// Who is submitting and from where. Passed in explicitly by the caller.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionContext {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub page_url: String,
    pub user_agent: String,
    pub screen: Option<ScreenSize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    New,
}

/// A validated report, ready to be written to the `bugs` collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugReport {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    pub browser: String,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub timestamp: String,
    pub url: String,
    pub user_id: String,
    pub user_email: String,
    pub status: ReportStatus,
}

/// Validate the form and build a report stamped with the current time and a fresh id.
///
/// Validation failures come back as `ReportError::Validation`; the only other
/// failure is the OS random source being unavailable.
pub fn compose(form: &BugReportForm, context: &SubmissionContext) -> Result<BugReport> {
    // Validate before touching the clock or the random source.
    validate(form)?;
    let now = Utc::now();
    let id = generate_report_id(now)?;
    Ok(build_report(form, context, now, id))
}

/// Same as [`compose`] with the clock and id supplied by the caller.
pub fn compose_at(
    form: &BugReportForm,
    context: &SubmissionContext,
    now: DateTime<Utc>,
    id: String,
) -> std::result::Result<BugReport, ValidationError> {
    validate(form)?;
    Ok(build_report(form, context, now, id))
}

/// Assembles the report from a form that already passed [`validate`].
fn build_report(
    form: &BugReportForm,
    context: &SubmissionContext,
    now: DateTime<Utc>,
    id: String,
) -> BugReport {
    BugReport {
        id,
        title: form.title.trim().to_string(),
        category: form.category.trim().to_string(),
        severity: non_empty(&form.severity),
        description: form.description.trim().to_string(),
        steps: non_empty(&form.steps),
        browser: detect_browser(&context.user_agent),
        device: detect_device(&context.user_agent, context.screen),
        contact: non_empty(&form.contact),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        url: context.page_url.clone(),
        user_id: identity_or_anonymous(context.user_id.as_deref()),
        user_email: identity_or_anonymous(context.user_email.as_deref()),
        status: ReportStatus::New,
    }
}

/// Checks fields in a fixed order and stops at the first failure.
pub fn validate(form: &BugReportForm) -> std::result::Result<(), ValidationError> {
    if form.title.trim().is_empty() {
        return Err(ValidationError::new(
            FormField::Title,
            "Please enter a title for the bug",
        ));
    }
    if form.category.trim().is_empty() {
        return Err(ValidationError::new(
            FormField::Category,
            "Please select a category",
        ));
    }

    let description = form.description.trim();
    if description.is_empty() {
        return Err(ValidationError::new(
            FormField::Description,
            "Please describe the bug",
        ));
    }
    let description_len = description.chars().count();
    if description_len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::new(
            FormField::Description,
            format!(
                "Description is too long ({description_len}/{MAX_DESCRIPTION_CHARS} characters)"
            ),
        ));
    }

    let steps_len = form.steps.trim().chars().count();
    if steps_len > MAX_STEPS_CHARS {
        return Err(ValidationError::new(
            FormField::Steps,
            format!("Steps to reproduce are too long ({steps_len}/{MAX_STEPS_CHARS} characters)"),
        ));
    }

    Ok(())
}

/// `BUG-<epoch-ms>-<6 base-36 chars>`. Unique in practice, not guaranteed.
pub fn generate_report_id(now: DateTime<Utc>) -> std::io::Result<String> {
    let suffix = random_base36(ID_SUFFIX_LEN)?;
    Ok(format!("{ID_PREFIX}-{}-{suffix}", now.timestamp_millis()))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn identity_or_anonymous(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => ANONYMOUS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn valid_form() -> BugReportForm {
        BugReportForm {
            title: "Crash on load".into(),
            category: "bug".into(),
            description: "Page is blank".into(),
            ..Default::default()
        }
    }

    fn context() -> SubmissionContext {
        SubmissionContext {
            page_url: "https://showcase.example/games/42".into(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0"
                .into(),
            ..Default::default()
        }
    }

    fn rejection(form: &BugReportForm) -> ValidationError {
        match compose(form, &context()) {
            Err(ReportError::Validation(e)) => e,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    fn field_of(form: &BugReportForm) -> FormField {
        rejection(form).field
    }

    #[test]
    fn test_required_fields_reject() {
        let mut form = valid_form();
        form.title = "   ".into();
        assert_eq!(field_of(&form), FormField::Title);

        let mut form = valid_form();
        form.category.clear();
        assert_eq!(field_of(&form), FormField::Category);

        let mut form = valid_form();
        form.description.clear();
        assert_eq!(field_of(&form), FormField::Description);
    }

    #[test]
    fn test_validation_order_short_circuits() {
        let form = BugReportForm {
            steps: "x".repeat(MAX_STEPS_CHARS + 1),
            ..Default::default()
        };
        assert_eq!(field_of(&form), FormField::Title);

        let mut form = valid_form();
        form.description = "d".repeat(MAX_DESCRIPTION_CHARS + 1);
        form.steps = "s".repeat(MAX_STEPS_CHARS + 1);
        assert_eq!(field_of(&form), FormField::Description);
    }

    #[test]
    fn test_description_limit_is_inclusive() {
        let mut form = valid_form();
        form.description = "d".repeat(MAX_DESCRIPTION_CHARS);
        assert!(compose(&form, &context()).is_ok());

        form.description.push('d');
        let err = rejection(&form);
        assert_eq!(err.field, FormField::Description);
        assert!(err.reason.contains("too long"));
        assert!(err.reason.contains("1001/1000"));
    }

    #[test]
    fn test_limits_count_characters_not_bytes() {
        let mut form = valid_form();
        form.description = "é".repeat(MAX_DESCRIPTION_CHARS);
        assert!(compose(&form, &context()).is_ok());
    }

    #[test]
    fn test_steps_limit() {
        let mut form = valid_form();
        form.steps = "s".repeat(MAX_STEPS_CHARS);
        assert!(compose(&form, &context()).is_ok());

        form.steps.push('s');
        assert_eq!(field_of(&form), FormField::Steps);
    }

    #[test]
    fn test_compose_fills_derived_fields() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let mut form = valid_form();
        form.title = "  Crash on load  ".into();
        form.severity = "high".into();
        let report = compose_at(&form, &context(), now, "BUG-1-ABCDEF".into()).unwrap();

        assert_eq!(report.id, "BUG-1-ABCDEF");
        assert_eq!(report.title, "Crash on load");
        assert_eq!(report.severity.as_deref(), Some("high"));
        assert_eq!(report.steps, None);
        assert_eq!(report.contact, None);
        assert_eq!(report.browser, "Firefox 121");
        assert_eq!(report.device, "Linux");
        assert_eq!(report.timestamp, "2025-01-01T12:00:00.000Z");
        assert_eq!(report.url, "https://showcase.example/games/42");
        assert_eq!(report.user_id, "anonymous");
        assert_eq!(report.user_email, "anonymous");
        assert_eq!(report.status, ReportStatus::New);
    }

    #[test]
    fn test_compose_at_still_validates() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let mut form = valid_form();
        form.description = "d".repeat(MAX_DESCRIPTION_CHARS + 1);
        let err = compose_at(&form, &context(), now, "BUG-1-ABCDEF".into()).unwrap_err();
        assert_eq!(err.field, FormField::Description);
    }

    #[test]
    fn test_compose_uses_context_identity() {
        let ctx = SubmissionContext {
            user_id: Some("u-17".into()),
            user_email: Some("player@example.com".into()),
            ..context()
        };
        let report = compose(&valid_form(), &ctx).unwrap();
        assert_eq!(report.user_id, "u-17");
        assert_eq!(report.user_email, "player@example.com");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = compose(&valid_form(), &context()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "new");
        assert_eq!(json["userId"], "anonymous");
        assert!(json.get("severity").is_none());
    }

    #[test]
    fn test_report_id_shape() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap();
        let id = generate_report_id(now).unwrap();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BUG");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_report_ids_distinct() {
        // 36^6 suffixes per millisecond: a same-millisecond birthday clash is
        // possible, so allow a few rather than none.
        let ids: HashSet<String> = (0..10_000)
            .map(|_| generate_report_id(Utc::now()).unwrap())
            .collect();
        assert!(ids.len() >= 9_995, "only {} distinct ids", ids.len());
    }
}
