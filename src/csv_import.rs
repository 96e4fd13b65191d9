//! Parser for the roster CSV format.
//!
//! The first line is a header and always skipped. Every other non-blank line
//! is split on `,` or `;`; surrounding whitespace and double quotes are trimmed
//! from each field. Columns are `name`, `group`, `birth date`. Quoted
//! delimiters are not supported. Birth dates may be written `YYYY-MM-DD` or
//! `DD.MM.YYYY`.

use chrono::NaiveDate;
use log::warn;

use crate::error::CsvError;

const BIRTH_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// One importable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvChild {
    pub name: String,
    pub group: String,
    pub birth_date: Option<NaiveDate>,
}

/// Parse `content` into rows. Lines without a name are skipped. A birth date
/// in neither accepted format fails the whole file so nothing is imported
/// with data missing.
pub fn parse_children_csv(content: &str) -> Result<Vec<CsvChild>, CsvError> {
    let mut rows = Vec::new();
    for (index, line) in content.lines().enumerate().skip(1) {
        if let Some(row) = parse_line(index + 1, line)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn parse_line(line_number: usize, line: &str) -> Result<Option<CsvChild>, CsvError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut fields = line.split([',', ';']).map(clean_field);
    let name = fields.next().unwrap_or_default();
    if name.is_empty() {
        return Ok(None);
    }
    let group = fields.next().unwrap_or_default();
    let birth_date = match fields.next().filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(parse_birth_date(&raw).ok_or_else(|| {
            warn!("event=csv_import module=csv status=bad_birth_date line={line_number}");
            CsvError::BirthDate {
                line: line_number,
                value: raw.clone(),
            }
        })?),
        None => None,
    };

    Ok(Some(CsvChild {
        name,
        group,
        birth_date,
    }))
}

fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    BIRTH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_skipped_and_missing_fields_default() {
        let rows = parse_children_csv("Name,Group,Birth\nAnna,GroupA,2020-01-01\nBen,,\n").unwrap();

        assert_eq!(
            rows,
            vec![
                CsvChild {
                    name: "Anna".into(),
                    group: "GroupA".into(),
                    birth_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                },
                CsvChild {
                    name: "Ben".into(),
                    group: String::new(),
                    birth_date: None,
                },
            ]
        );
    }

    #[test]
    fn semicolons_quotes_and_crlf_are_accepted() {
        let rows =
            parse_children_csv("\"Name\";\"Group\"\r\n\"Clara\";\"Owls\"\r\n\r\n  Dana  \r\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Clara");
        assert_eq!(rows[0].group, "Owls");
        assert_eq!(rows[1].name, "Dana");
        assert_eq!(rows[1].group, "");
    }

    #[test]
    fn rows_without_name_are_skipped() {
        let rows = parse_children_csv("Name,Group\n,Bears\n\"\",Foxes\nEmil,Foxes").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Emil");
    }

    #[test]
    fn german_birth_dates_are_accepted() {
        let rows = parse_children_csv("h\nFinn;Bears;01.02.2020\nGreta;Bears;2019-11-30").unwrap();
        assert_eq!(rows[0].birth_date, NaiveDate::from_ymd_opt(2020, 2, 1));
        assert_eq!(rows[1].birth_date, NaiveDate::from_ymd_opt(2019, 11, 30));
    }

    #[test]
    fn unreadable_birth_date_fails_the_file() {
        let err = parse_children_csv("h\nAnna,Bears,2020-01-01\nFinn,Bears,Feb 2020").unwrap_err();
        assert_eq!(
            err,
            CsvError::BirthDate {
                line: 3,
                value: "Feb 2020".into(),
            }
        );
    }

    #[test]
    fn header_only_yields_nothing() {
        assert!(parse_children_csv("Name,Group,Birth").unwrap().is_empty());
        assert!(parse_children_csv("").unwrap().is_empty());
    }
}
