//! Plain-text rendering of the rule table

use portproxy_core::Rule;

const HEADERS: [&str; 6] = [
    "#",
    "Group",
    "Listen address",
    "Listen port",
    "Connect address",
    "Connect port",
];

/// Render rules as an aligned table, numbered from 1
pub fn render(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return "No port proxy rules configured\n".to_string();
    }

    let rows: Vec<[String; 6]> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            [
                (i + 1).to_string(),
                rule.group.to_string(),
                rule.listen_address.clone(),
                rule.listen_port.to_string(),
                rule.connect_address.clone(),
                rule.connect_port.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

/// One-line description used in prompts and messages
pub fn describe(rule: &Rule) -> String {
    format!(
        "{} {}:{} -> {}:{}",
        rule.group, rule.listen_address, rule.listen_port, rule.connect_address, rule.connect_port
    )
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
