use unicode_width::UnicodeWidthStr;

use crate::db::models::*;

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Format report search results as a table.
pub fn print_report_results(results: &[LocationStatusReport]) {
    if results.is_empty() {
        println!("No reports match.");
        return;
    }

    println!("{} report{}:\n", results.len(), plural(results.len()));

    println!(
        "  {:<8} {:<8} {:<10} {:<7} {:<21} {}",
        "ID", "AGENT", "LOCATION", "STATUS", "TIME", "BODY"
    );
    println!("  {}", "-".repeat(76));

    for r in results {
        println!(
            "  {:<8} {:<8} {:<10} {:<7} {:<21} {}",
            r.report_id,
            r.agent_id,
            r.location_id,
            r.status,
            r.report_time,
            truncate(&r.report_body.replace('\n', " "), 30),
        );
    }
}

pub fn print_report_detail(r: &LocationStatusReport) {
    println!("Report {}", r.report_id);
    println!("  Agent:    {}", r.agent_id);
    println!("  Location: {}", r.location_id);
    println!("  Status:   {}", r.status);
    println!("  Time:     {}", r.report_time);
    if !r.report_body.is_empty() {
        println!("\n  {}", r.report_body);
    }
}

pub fn print_agent_list(agents: &[Agent]) {
    if agents.is_empty() {
        println!("No agents found.");
        return;
    }

    println!("{} agent{}:\n", agents.len(), plural(agents.len()));
    println!(
        "  {:<16} {:<30} {:<6} {:<8}",
        "CALL SIGN", "NAME", "RANK", "USER"
    );
    println!("  {}", "-".repeat(64));

    for a in agents {
        println!(
            "  {:<16} {:<30} {:<6} {:<8}",
            a.call_sign,
            truncate(&format!("{} {}", a.first_name, a.last_name), 28),
            a.rank,
            a.user_id,
        );
    }
}

pub fn print_agent_detail(a: &Agent) {
    println!("Agent: {}", a.call_sign);
    println!("  ID:            {}", a.agent_id);
    println!("  Name:          {} {}", a.first_name, a.last_name);
    println!("  Date of birth: {}", a.date_of_birth);
    println!("  Rank:          {}", a.rank);
    println!("  User:          {}", a.user_id);
}

pub fn print_user_detail(u: &User) {
    println!("User: {}", u.username);
    println!("  ID:   {}", u.user_id);
    if !u.full_name.is_empty() {
        println!("  Name: {}", u.full_name);
    }
}

pub fn print_location_detail(l: &Location) {
    println!("Location: {}", l.site_name);
    println!("  ID:        {}", l.location_id);
    println!("  Location:  {}", l.location);
    println!("  Time zone: {}", l.time_zone);
    match l.region_id {
        Some(region) => println!("  Region:    {region}"),
        None => println!("  Region:    -"),
    }
}

pub fn print_region_detail(r: &Region) {
    println!("Region: {}", r.name);
    println!("  ID: {}", r.region_id);
    if !r.summary.is_empty() {
        println!("\n  {}", r.summary);
    }
}
