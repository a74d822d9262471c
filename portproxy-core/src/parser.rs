//! Parsing of `netsh interface portproxy show all` output
//!
//! The listing is human-readable text made of sections. Each section starts with a
//! line naming the listen and connect address families (localized, but always
//! containing two `ipv<digit>` tokens), followed by a column header, a dashed rule
//! and four-column rows:
//!
//! ```text
//! ipv4 をリッスンする:         ipv4 に接続する:
//!
//! Address         Port        Address         Port
//! --------------- ----------  --------------- ----------
//! *               50022       172.23.67.210   50022
//! ```
//!
//! Classification happens line by line: a header updates the active group, any other
//! line is a row tagged with that group.

use crate::error::{MalformedReason, PortProxyError, Result};
use crate::rule::{Rule, RuleGroup};

/// Label that starts the column header line
pub const ADDRESS_COLUMN_LABEL: &str = "Address";

const FAMILY_TOKEN: &str = "ipv";

/// What a single non-blank listing line is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLine<'a> {
    /// Column labels or the dashed rule under them
    ColumnHeader,

    /// Section announcement carrying the group for the following rows
    Section(RuleGroup),

    /// Anything else, expected to be a four-column rule row
    Row(&'a str),
}

/// Parse the whole listing payload into rules, in listing order
///
/// Blank or whitespace-only output means no rules are configured. Any malformed
/// line fails the whole parse; partial results are never returned.
pub fn parse_listing(output: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    if output.trim().is_empty() {
        return Ok(rules);
    }

    let mut group: Option<RuleGroup> = None;

    for (index, raw) in output.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let malformed = |reason: MalformedReason| PortProxyError::MalformedOutput {
            line_number: index + 1,
            line: line.to_string(),
            reason,
        };

        match classify_line(line).map_err(malformed)? {
            ListingLine::ColumnHeader => {}
            ListingLine::Section(next) => {
                tracing::trace!("Section {} at line {}", next, index + 1);
                group = Some(next);
            }
            ListingLine::Row(row) => {
                let active = group.ok_or_else(|| malformed(MalformedReason::RowBeforeHeader))?;
                rules.push(parse_row(active, row).map_err(malformed)?);
            }
        }
    }

    Ok(rules)
}

/// Classify one trimmed, non-empty line
pub fn classify_line(line: &str) -> std::result::Result<ListingLine<'_>, MalformedReason> {
    if line.starts_with(ADDRESS_COLUMN_LABEL) || is_dashed_rule(line) {
        return Ok(ListingLine::ColumnHeader);
    }

    let families = family_digits(line);
    if families.len() >= 2 {
        return RuleGroup::from_families(families[0], families[1])
            .map(ListingLine::Section)
            .ok_or(MalformedReason::UnknownGroup);
    }

    Ok(ListingLine::Row(line))
}

/// Split a row into a rule tagged with `group`
pub fn parse_row(group: RuleGroup, row: &str) -> std::result::Result<Rule, MalformedReason> {
    let fields: Vec<&str> = row.split_whitespace().collect();
    let &[listen_address, listen_port, connect_address, connect_port] = fields.as_slice() else {
        return Err(MalformedReason::FieldCount(fields.len()));
    };

    Ok(Rule {
        group,
        listen_address: listen_address.to_string(),
        listen_port: parse_port(listen_port)?,
        connect_address: connect_address.to_string(),
        connect_port: parse_port(connect_port)?,
    })
}

fn parse_port(field: &str) -> std::result::Result<u16, MalformedReason> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedReason::InvalidPort(field.to_string()));
    }
    field
        .parse()
        .map_err(|_| MalformedReason::InvalidPort(field.to_string()))
}

fn is_dashed_rule(line: &str) -> bool {
    line.starts_with('-') && line.chars().all(|c| c == '-' || c.is_whitespace())
}

/// Digits following each `ipv` token, in order of appearance
///
/// The first is the listen family, the second the connect family.
fn family_digits(line: &str) -> Vec<char> {
    line.match_indices(FAMILY_TOKEN)
        .filter_map(|(pos, token)| line[pos + token.len()..].chars().next())
        .filter(|c| c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SECTIONS: &str = "\r\n\
ipv4 をリッスンする:         ipv4 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
*               50022       172.23.67.210   50022\r\n\
*               8001        172.23.67.210   8001\r\n\
\r\n\
ipv6 をリッスンする:         ipv6 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
::              8001        fe80::1         8002\r\n\
\r\n\
\r\n";

    fn rule(group: RuleGroup, la: &str, lp: u16, ca: &str, cp: u16) -> Rule {
        Rule {
            group,
            listen_address: la.to_string(),
            listen_port: lp,
            connect_address: ca.to_string(),
            connect_port: cp,
        }
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_listing("").unwrap().is_empty());
        assert!(parse_listing("\r\n").unwrap().is_empty());
        assert!(parse_listing("  \n\t\n").unwrap().is_empty());
    }

    #[test]
    fn test_single_rule() {
        let output = "ipv4 をリッスンする:  ipv4 に接続する:\n\nAddress Port Address Port\n--- --- --- ---\n*  8080  10.0.0.5  8080\n";

        let rules = parse_listing(output).unwrap();
        assert_eq!(rules, vec![rule(RuleGroup::V4ToV4, "*", 8080, "10.0.0.5", 8080)]);
    }

    #[test]
    fn test_sections_tag_their_own_rows() {
        let rules = parse_listing(TWO_SECTIONS).unwrap();

        assert_eq!(
            rules,
            vec![
                rule(RuleGroup::V4ToV4, "*", 50022, "172.23.67.210", 50022),
                rule(RuleGroup::V4ToV4, "*", 8001, "172.23.67.210", 8001),
                rule(RuleGroup::V6ToV6, "::", 8001, "fe80::1", 8002),
            ]
        );
    }

    #[test]
    fn test_english_headers_and_mixed_families() {
        let output = "\n\
Listen on ipv4:             Connect to ipv6:\n\
\n\
Address         Port        Address         Port\n\
--------------- ----------  --------------- ----------\n\
127.0.0.1       3389        ::1             3389\n\
\n\
Listen on ipv6:             Connect to ipv4:\n\
\n\
Address         Port        Address         Port\n\
--------------- ----------  --------------- ----------\n\
*               80          192.168.10.100  8080\n";

        let rules = parse_listing(output).unwrap();
        assert_eq!(
            rules,
            vec![
                rule(RuleGroup::V4ToV6, "127.0.0.1", 3389, "::1", 3389),
                rule(RuleGroup::V6ToV4, "*", 80, "192.168.10.100", 8080),
            ]
        );
    }

    #[test]
    fn test_empty_section_then_rows() {
        let output = "\r\n\
ipv4 をリッスンする:         ipv4 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
\r\n\
ipv6 をリッスンする:         ipv4 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
*               8001        192.168.10.100  8001\r\n\
::1             8002        192.168.10.101  8003\r\n";

        let rules = parse_listing(output).unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.group == RuleGroup::V6ToV4));
        assert_eq!(rules[1], rule(RuleGroup::V6ToV4, "::1", 8002, "192.168.10.101", 8003));
    }

    #[test]
    fn test_duplicate_rows_are_preserved() {
        let output = "ipv4: ipv4:\n*  1  10.0.0.1  1\n*  1  10.0.0.1  1\n";
        assert_eq!(parse_listing(output).unwrap().len(), 2);
    }

    #[test]
    fn test_row_before_header() {
        let err = parse_listing("Address Port Address Port\n*  8080  10.0.0.5  8080\n")
            .unwrap_err();

        match err {
            PortProxyError::MalformedOutput {
                line_number,
                reason,
                ..
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(reason, MalformedReason::RowBeforeHeader);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_count_discards_everything() {
        let output = "ipv4 ipv4\n*  80  10.0.0.1  80\n*  81  10.0.0.1\n";
        let err = parse_listing(output).unwrap_err();

        assert!(matches!(
            err,
            PortProxyError::MalformedOutput {
                line_number: 3,
                reason: MalformedReason::FieldCount(3),
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_ports() {
        assert_eq!(
            parse_row(RuleGroup::V4ToV4, "*  http  10.0.0.1  80"),
            Err(MalformedReason::InvalidPort("http".to_string()))
        );
        assert_eq!(
            parse_row(RuleGroup::V4ToV4, "*  70000  10.0.0.1  80"),
            Err(MalformedReason::InvalidPort("70000".to_string()))
        );
        assert_eq!(
            parse_row(RuleGroup::V4ToV4, "*  +80  10.0.0.1  80"),
            Err(MalformedReason::InvalidPort("+80".to_string()))
        );
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("Address  Port"), Ok(ListingLine::ColumnHeader));
        assert_eq!(classify_line("------- ----"), Ok(ListingLine::ColumnHeader));
        assert_eq!(
            classify_line("ipv6 をリッスンする:  ipv4 に接続する:"),
            Ok(ListingLine::Section(RuleGroup::V6ToV4))
        );
        assert_eq!(classify_line("ipv4: ipv5:"), Err(MalformedReason::UnknownGroup));

        // A single family token is not a header
        assert_eq!(classify_line("ipv4 only"), Ok(ListingLine::Row("ipv4 only")));
        // "ip" without the family token is ordinary row content
        assert_eq!(
            classify_line("*  80  ip.example  80"),
            Ok(ListingLine::Row("*  80  ip.example  80"))
        );
    }
}
