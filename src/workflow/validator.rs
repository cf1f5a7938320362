use chrono::NaiveDate;

use crate::error::{FieldError, WorkflowError};
use crate::model::leave_application::SalaryPaymentPreference;
use crate::model::leave_type::LeaveType;
use crate::workflow::workdays;

/// Draft application as received from the caller, nothing resolved yet.
#[derive(Debug, Default)]
pub struct LeaveDraft {
    pub leave_type_id: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub subject: Option<String>,
    pub contact_info: Option<String>,
    pub salary_payment_preference: Option<SalaryPaymentPreference>,
    pub salary_payment_address: Option<String>,
    pub permission_note_country: Option<String>,
    pub person_handling_duties_id: Option<u64>,
    pub last_leave_from: Option<NaiveDate>,
    pub last_leave_to: Option<NaiveDate>,
}

/// Everything the checks need, gathered by the caller beforehand so the
/// validation itself stays side-effect-free.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    pub today: NaiveDate,
    /// None when the draft's leave type id is unset or unknown.
    pub leave_type: Option<&'a LeaveType>,
    /// Remaining days for (applicant, leave type, year of the request).
    pub balance_days: i64,
    /// Date windows of the applicant's own pending/approved applications.
    pub own_windows: &'a [(NaiveDate, NaiveDate)],
    /// Whether the selected duty handler exists.
    pub delegate_known: bool,
    /// Date windows of the duty handler's pending/approved applications.
    pub delegate_windows: &'a [(NaiveDate, NaiveDate)],
    /// Empty unless public-holiday exclusion is configured on.
    pub holidays: &'a [NaiveDate],
}

/// Normalized draft, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_requested: u32,
    pub subject: Option<String>,
    pub contact_info: String,
    pub salary_payment_preference: SalaryPaymentPreference,
    pub salary_payment_address: Option<String>,
    pub permission_note_country: Option<String>,
    pub person_handling_duties_id: Option<u64>,
    pub last_leave_from: Option<NaiveDate>,
    pub last_leave_to: Option<NaiveDate>,
}

fn overlaps(windows: &[(NaiveDate, NaiveDate)], start: NaiveDate, end: NaiveDate) -> bool {
    windows.iter().any(|(s, e)| *s <= end && start <= *e)
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Checks a draft against every submission rule and collects one message per
/// violated field. Side-effect-free; on success returns the normalized draft
/// with the working-day count resolved.
pub fn validate(
    draft: &LeaveDraft,
    applicant_id: u64,
    ctx: &ValidationContext<'_>,
) -> Result<ValidatedDraft, WorkflowError> {
    let mut errors = Vec::new();

    match (draft.leave_type_id, ctx.leave_type) {
        (None, _) => errors.push(FieldError::new("leave_type_id", "leave type is required")),
        (Some(_), None) => errors.push(FieldError::new("leave_type_id", "unknown leave type")),
        (Some(_), Some(lt)) if !lt.is_active => {
            errors.push(FieldError::new("leave_type_id", "leave type is not active"));
        }
        _ => {}
    }

    if draft.start_date.is_none() {
        errors.push(FieldError::new("start_date", "start date is required"));
    }
    if draft.end_date.is_none() {
        errors.push(FieldError::new("end_date", "end date is required"));
    }

    let mut days_requested = None;
    if let (Some(start), Some(end)) = (draft.start_date, draft.end_date) {
        if end < start {
            errors.push(FieldError::new(
                "end_date",
                "end date cannot be before start date",
            ));
        } else if start < ctx.today {
            errors.push(FieldError::new(
                "start_date",
                "start date cannot be in the past",
            ));
        } else {
            let days = workdays::working_days_between(start, end, ctx.holidays)
                .expect("range already checked");
            if days == 0 {
                errors.push(FieldError::new(
                    "start_date",
                    "the requested range contains no working days",
                ));
            }
            if let Some(lt) = ctx.leave_type {
                if days > lt.max_days {
                    errors.push(FieldError::new(
                        "end_date",
                        format!(
                            "{} working days requested but {} allows at most {}",
                            days, lt.name, lt.max_days
                        ),
                    ));
                } else if i64::from(days) > ctx.balance_days {
                    errors.push(FieldError::new(
                        "leave_type_id",
                        format!(
                            "insufficient leave balance: {} days requested, {} remaining",
                            days, ctx.balance_days
                        ),
                    ));
                }
            }
            if overlaps(ctx.own_windows, start, end) {
                errors.push(FieldError::new(
                    "start_date",
                    "overlaps one of your existing leave applications",
                ));
            }
            if let Some(delegate_id) = draft.person_handling_duties_id {
                if delegate_id == applicant_id {
                    errors.push(FieldError::new(
                        "person_handling_duties_id",
                        "you cannot hand over duties to yourself",
                    ));
                } else if !ctx.delegate_known {
                    errors.push(FieldError::new(
                        "person_handling_duties_id",
                        "unknown person selected to handle duties",
                    ));
                } else if overlaps(ctx.delegate_windows, start, end) {
                    errors.push(FieldError::new(
                        "person_handling_duties_id",
                        "selected person is not available during the requested window",
                    ));
                }
            }
            days_requested = Some(days);
        }
    }

    if let (Some(from), Some(to)) = (draft.last_leave_from, draft.last_leave_to) {
        if to < from {
            errors.push(FieldError::new(
                "last_leave_to",
                "last leave end cannot be before its start",
            ));
        }
    }

    let contact_info = trimmed(&draft.contact_info);
    if contact_info.is_none() {
        errors.push(FieldError::new(
            "contact_info",
            "contact information is required",
        ));
    }

    let preference = draft
        .salary_payment_preference
        .unwrap_or(SalaryPaymentPreference::BankAccount);
    let salary_payment_address = trimmed(&draft.salary_payment_address);
    if preference == SalaryPaymentPreference::Address && salary_payment_address.is_none() {
        errors.push(FieldError::new(
            "salary_payment_address",
            "salary payment address is required when paying to an address",
        ));
    }

    if !errors.is_empty() {
        return Err(WorkflowError::Validation(errors));
    }

    Ok(ValidatedDraft {
        leave_type_id: draft.leave_type_id.expect("checked above"),
        start_date: draft.start_date.expect("checked above"),
        end_date: draft.end_date.expect("checked above"),
        days_requested: days_requested.expect("checked above"),
        subject: trimmed(&draft.subject),
        contact_info: contact_info.expect("checked above"),
        salary_payment_preference: preference,
        salary_payment_address,
        permission_note_country: trimmed(&draft.permission_note_country),
        person_handling_duties_id: draft.person_handling_duties_id,
        last_leave_from: draft.last_leave_from,
        last_leave_to: draft.last_leave_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn annual_leave() -> LeaveType {
        LeaveType {
            id: 1,
            name: "Annual Leave".into(),
            description: None,
            max_days: 30,
            is_active: true,
        }
    }

    fn draft() -> LeaveDraft {
        LeaveDraft {
            leave_type_id: Some(1),
            // Mon 2026-03-02 .. Fri 2026-03-06, 5 working days.
            start_date: Some(ymd(2026, 3, 2)),
            end_date: Some(ymd(2026, 3, 6)),
            contact_info: Some("  0712 345 678 ".into()),
            ..LeaveDraft::default()
        }
    }

    fn ctx<'a>(leave_type: &'a LeaveType) -> ValidationContext<'a> {
        ValidationContext {
            today: ymd(2026, 2, 1),
            leave_type: Some(leave_type),
            balance_days: 30,
            own_windows: &[],
            delegate_known: false,
            delegate_windows: &[],
            holidays: &[],
        }
    }

    fn field_messages(result: Result<ValidatedDraft, WorkflowError>) -> Vec<&'static str> {
        match result {
            Err(WorkflowError::Validation(errors)) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn accepts_and_normalizes_a_clean_draft() {
        let lt = annual_leave();
        let validated = validate(&draft(), 10, &ctx(&lt)).unwrap();
        assert_eq!(validated.days_requested, 5);
        assert_eq!(validated.contact_info, "0712 345 678");
        assert_eq!(
            validated.salary_payment_preference,
            SalaryPaymentPreference::BankAccount
        );
    }

    #[test]
    fn missing_fields_are_each_reported() {
        let result = validate(&LeaveDraft::default(), 10, &ValidationContext {
            today: ymd(2026, 2, 1),
            leave_type: None,
            balance_days: 0,
            own_windows: &[],
            delegate_known: false,
            delegate_windows: &[],
            holidays: &[],
        });
        let fields = field_messages(result);
        assert!(fields.contains(&"leave_type_id"));
        assert!(fields.contains(&"start_date"));
        assert!(fields.contains(&"end_date"));
        assert!(fields.contains(&"contact_info"));
    }

    #[test]
    fn rejects_request_over_type_maximum() {
        let lt = LeaveType { max_days: 30, ..annual_leave() };
        let mut d = draft();
        // Mon 2026-03-02 .. Fri 2026-04-10 is 30 weekdays + 9000 balance, so
        // stretch one more week to 35 working days.
        d.end_date = Some(ymd(2026, 4, 17));
        let mut context = ctx(&lt);
        context.balance_days = 9000;
        assert_eq!(field_messages(validate(&d, 10, &context)), vec!["end_date"]);
    }

    #[test]
    fn rejects_insufficient_balance() {
        let lt = annual_leave();
        let mut context = ctx(&lt);
        context.balance_days = 4; // draft needs 5
        assert_eq!(
            field_messages(validate(&draft(), 10, &context)),
            vec!["leave_type_id"]
        );
    }

    #[test]
    fn rejects_past_start_and_inverted_range() {
        let lt = annual_leave();
        let mut past = draft();
        past.start_date = Some(ymd(2026, 1, 5));
        past.end_date = Some(ymd(2026, 1, 9));
        assert_eq!(
            field_messages(validate(&past, 10, &ctx(&lt))),
            vec!["start_date"]
        );

        let mut inverted = draft();
        inverted.start_date = Some(ymd(2026, 3, 6));
        inverted.end_date = Some(ymd(2026, 3, 2));
        assert_eq!(
            field_messages(validate(&inverted, 10, &ctx(&lt))),
            vec!["end_date"]
        );
    }

    #[test]
    fn address_preference_requires_address() {
        let lt = annual_leave();
        let mut d = draft();
        d.salary_payment_preference = Some(SalaryPaymentPreference::Address);
        d.salary_payment_address = Some("   ".into());
        assert_eq!(
            field_messages(validate(&d, 10, &ctx(&lt))),
            vec!["salary_payment_address"]
        );
    }

    #[test]
    fn rejects_overlap_with_own_applications() {
        let lt = annual_leave();
        let mut context = ctx(&lt);
        let own_windows = [(ymd(2026, 3, 5), ymd(2026, 3, 10))];
        context.own_windows = &own_windows;
        assert_eq!(
            field_messages(validate(&draft(), 10, &context)),
            vec!["start_date"]
        );
    }

    #[test]
    fn delegate_checks() {
        let lt = annual_leave();

        let mut d = draft();
        d.person_handling_duties_id = Some(10); // the applicant
        assert_eq!(
            field_messages(validate(&d, 10, &ctx(&lt))),
            vec!["person_handling_duties_id"]
        );

        d.person_handling_duties_id = Some(99);
        let mut context = ctx(&lt);
        context.delegate_known = true;
        let delegate_windows_overlap = [(ymd(2026, 3, 1), ymd(2026, 3, 3))];
        context.delegate_windows = &delegate_windows_overlap;
        assert_eq!(
            field_messages(validate(&d, 10, &context)),
            vec!["person_handling_duties_id"]
        );

        let delegate_windows_ok = [(ymd(2026, 4, 1), ymd(2026, 4, 3))];
        context.delegate_windows = &delegate_windows_ok;
        assert!(validate(&d, 10, &context).is_ok());
    }
}
