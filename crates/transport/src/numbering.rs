//! Transport document numbering.

use chrono::NaiveDate;

/// Generates human-readable transport document numbers.
pub trait TransportNumbering: Send + Sync {
    fn next_transport_number(&self, issue_date: NaiveDate, customer_affix: Option<&str>) -> String;
}

/// Default scheme: `"CMR {DD-MM-YYYY} {affix?}"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateAffixNumbering;

impl TransportNumbering for DateAffixNumbering {
    fn next_transport_number(&self, issue_date: NaiveDate, customer_affix: Option<&str>) -> String {
        let date = issue_date.format("%d-%m-%Y");
        match customer_affix {
            Some(affix) if !affix.trim().is_empty() => format!("CMR {date} {}", affix.trim()),
            _ => format!("CMR {date}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_date_and_affix() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let numbering = DateAffixNumbering;

        assert_eq!(
            numbering.next_transport_number(date, Some("ACME")),
            "CMR 05-03-2026 ACME"
        );
        assert_eq!(numbering.next_transport_number(date, None), "CMR 05-03-2026");
        assert_eq!(
            numbering.next_transport_number(date, Some("  ")),
            "CMR 05-03-2026"
        );
    }
}
