//! Domain models for the property tree and the flat rows that mirror the
//! SQLite schema. The tree types (`Building` owning `Apartment`s) are what
//! the UI edits; the row types are what the store reads and writes. The
//! conversion between the two lives in `sync`.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::error::LeaseError;

/// Display format shared by the form, the table and the database column.
pub const LEASE_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A property grouping zero or more apartments.
pub struct Building {
    /// Store id. Ids are reassigned on every save, so the UI only uses them
    /// to address rows between two saves.
    pub id: i64,
    pub name: String,
    /// Apartments in display order.
    pub apartments: Vec<Apartment>,
}

impl Building {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            apartments: Vec::new(),
        }
    }

    /// Reorder apartments so "2B" sorts before "10A".
    pub fn sort_apartments(&mut self) {
        self.apartments
            .sort_by(|a, b| natural_cmp(&a.number, &b.number));
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A leased unit with its tenant contact details.
pub struct Apartment {
    pub id: i64,
    /// Apartment number as the landlord writes it ("1A", "12-3").
    pub number: String,
    /// Occupant display name, substituted for `{Name}` in reminders.
    pub tenant: String,
    pub email: String,
    /// `MM/DD/YYYY`.
    pub lease_start: String,
    /// `MM/DD/YYYY`.
    pub lease_end: String,
}

impl Apartment {
    pub fn from_draft(id: i64, draft: ApartmentDraft) -> Self {
        Self {
            id,
            number: draft.number,
            tenant: draft.tenant,
            email: draft.email,
            lease_start: draft.lease_start,
            lease_end: draft.lease_end,
        }
    }

    /// Copy the editable fields back into a draft for the edit form.
    pub fn to_draft(&self) -> ApartmentDraft {
        ApartmentDraft {
            number: self.number.clone(),
            tenant: self.tenant.clone(),
            email: self.email.clone(),
            lease_start: self.lease_start.clone(),
            lease_end: self.lease_end.clone(),
        }
    }

    /// Replace every editable field, keeping the id.
    pub fn apply(&mut self, draft: ApartmentDraft) {
        self.number = draft.number;
        self.tenant = draft.tenant;
        self.email = draft.email;
        self.lease_start = draft.lease_start;
        self.lease_end = draft.lease_end;
    }

    /// Short label used in confirmations and status messages.
    pub fn label(&self) -> String {
        format!("Apartment {} ({})", self.number, self.tenant)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Unvalidated apartment fields as typed by the user.
pub struct ApartmentDraft {
    pub number: String,
    pub tenant: String,
    pub email: String,
    pub lease_start: String,
    pub lease_end: String,
}

impl ApartmentDraft {
    /// Trim every field, reject blanks, and normalise both dates to
    /// `MM/DD/YYYY`.
    pub fn validate(self) -> Result<ApartmentDraft, LeaseError> {
        let number = required(&self.number, "Apartment number")?;
        let tenant = required(&self.tenant, "Name")?;
        let email = required(&self.email, "Tenant email")?;
        let start_raw = required(&self.lease_start, "Lease start")?;
        let end_raw = required(&self.lease_end, "Lease end")?;

        let start = parse_lease_date(&start_raw, "Lease start")?;
        let end = parse_lease_date(&end_raw, "Lease end")?;
        let lease_start = start.format(LEASE_DATE_FORMAT).to_string();
        let lease_end = end.format(LEASE_DATE_FORMAT).to_string();
        if end < start {
            return Err(LeaseError::LeaseEndsBeforeStart {
                start: lease_start,
                end: lease_end,
            });
        }

        Ok(ApartmentDraft {
            number,
            tenant,
            email,
            lease_start,
            lease_end,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, LeaseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LeaseError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim a building name and reject it when nothing is left.
pub fn validate_building_name(name: &str) -> Result<String, LeaseError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(LeaseError::EmptyBuildingName)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse `MM/DD/YYYY`. Month and day may drop the leading zero; the year
/// must have exactly four digits.
pub fn parse_lease_date(value: &str, field: &'static str) -> Result<NaiveDate, LeaseError> {
    let trimmed = value.trim();
    let invalid = || LeaseError::InvalidDate {
        field,
        value: trimmed.to_string(),
    };

    let year = trimmed.rsplit('/').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, LEASE_DATE_FORMAT).map_err(|_| invalid())
}

/// Where a lease stands relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseStatus {
    Active,
    /// Ends within the warning window (inclusive).
    EndingSoon,
    Expired,
    /// The stored end date could not be parsed.
    Unknown,
}

pub fn lease_status(lease_end: &str, today: NaiveDate, warning_days: i64) -> LeaseStatus {
    let Ok(end) = parse_lease_date(lease_end, "Lease end") else {
        return LeaseStatus::Unknown;
    };
    let remaining = (end - today).num_days();
    if remaining < 0 {
        LeaseStatus::Expired
    } else if remaining <= warning_days {
        LeaseStatus::EndingSoon
    } else {
        LeaseStatus::Active
    }
}

/// Compare strings so embedded digit runs order numerically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let l_trim = l_num.trim_start_matches('0');
                let r_trim = r_num.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_ascii_lowercase().cmp(&r.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        digits.push(ch);
        chars.next();
    }
    digits
}

/// One row of the `buildings` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingRow {
    pub id: i64,
    pub name: String,
}

/// One row of the `apartments` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApartmentRow {
    pub id: i64,
    pub building_id: i64,
    pub number: String,
    pub tenant: String,
    pub email: String,
    pub lease_start: String,
    pub lease_end: String,
}

impl From<ApartmentRow> for Apartment {
    fn from(row: ApartmentRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            tenant: row.tenant,
            email: row.email,
            lease_start: row.lease_start,
            lease_end: row.lease_end,
        }
    }
}

/// Full contents of both tables, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub buildings: Vec<BuildingRow>,
    pub apartments: Vec<ApartmentRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ApartmentDraft {
        ApartmentDraft {
            number: " 1A ".into(),
            tenant: "J. Doe".into(),
            email: "j@x.com".into(),
            lease_start: "1/1/2024".into(),
            lease_end: "12/31/2024".into(),
        }
    }

    #[test]
    fn validate_trims_and_normalises_dates() {
        let valid = draft().validate().unwrap();
        assert_eq!(valid.number, "1A");
        assert_eq!(valid.lease_start, "01/01/2024");
        assert_eq!(valid.lease_end, "12/31/2024");
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let mut missing = draft();
        missing.email = "   ".into();
        assert_eq!(
            missing.validate(),
            Err(LeaseError::MissingField("Tenant email"))
        );
    }

    #[test]
    fn validate_rejects_bad_dates_and_reversed_leases() {
        let mut bad = draft();
        bad.lease_start = "2024-01-01".into();
        assert!(matches!(
            bad.validate(),
            Err(LeaseError::InvalidDate { field: "Lease start", .. })
        ));

        let mut short_year = draft();
        short_year.lease_start = "1/1/24".into();
        short_year.lease_end = "12/31/24".into();
        assert_eq!(
            short_year.validate(),
            Err(LeaseError::InvalidDate {
                field: "Lease start",
                value: "1/1/24".into(),
            })
        );
        assert!(parse_lease_date("12/31/02024", "Lease end").is_err());
        assert_eq!(
            lease_status("12/31/24", NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(), 60),
            LeaseStatus::Unknown
        );

        let mut reversed = draft();
        reversed.lease_end = "06/30/2023".into();
        assert!(matches!(
            reversed.validate(),
            Err(LeaseError::LeaseEndsBeforeStart { .. })
        ));
    }

    #[test]
    fn building_names_must_not_be_blank() {
        assert_eq!(validate_building_name("  Oak Hall "), Ok("Oak Hall".into()));
        assert_eq!(validate_building_name(" "), Err(LeaseError::EmptyBuildingName));
    }

    #[test]
    fn lease_status_tracks_the_warning_window() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        assert_eq!(lease_status("12/31/2024", today, 60), LeaseStatus::EndingSoon);
        assert_eq!(lease_status("12/31/2024", today, 30), LeaseStatus::Active);
        assert_eq!(lease_status("10/31/2024", today, 60), LeaseStatus::Expired);
        assert_eq!(lease_status("soon", today, 60), LeaseStatus::Unknown);
    }

    #[test]
    fn natural_order_compares_digit_runs_numerically() {
        let mut numbers = vec!["10A", "2B", "2a", "1", "B1"];
        numbers.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(numbers, vec!["1", "2a", "2B", "10A", "B1"]);
    }
}
