//! Field extraction from the OCR line dump of a payment receipt.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::ReceiptFields;

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"₹\s*([\d,]+(?:\.\d{2})?)").unwrap());

// "6 Jan 2026, 11:24 pm"
static DATE_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,2})\s+(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{4}),?\s*(\d{1,2}):(\d{2})\s*(am|pm)",
    )
    .unwrap()
});

// "11:24 pm on 6 Jan 2026"
static TIME_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,2}):(\d{2})\s*(am|pm)\s+on\s+(\d{1,2})\s+(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+(\d{4})",
    )
    .unwrap()
});

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Best-effort parse of payee, amount and transaction time from receipt
/// text. Missing fields are left unset; the caller decides whether the
/// result is complete enough to promote.
pub fn parse_receipt_text(text: &str) -> ReceiptFields {
    ReceiptFields {
        to: parse_payee(text),
        amount: parse_amount(text),
        time_of_transaction: parse_time(text),
    }
}

/// Largest rupee figure on the receipt; totals dominate line items.
fn parse_amount(text: &str) -> Option<f64> {
    let mut largest = 0.0f64;
    for capture in AMOUNT_RE.captures_iter(text) {
        if let Ok(value) = capture[1].replace(',', "").parse::<f64>() {
            if value > largest {
                largest = value;
            }
        }
    }
    (largest > 0.0).then_some(largest)
}

fn parse_payee(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        let lower = line.to_lowercase();

        if lower == "paid to" && i + 1 < lines.len() {
            if let Some(payee) = clean_payee(lines[i + 1].trim()) {
                return Some(payee);
            }
        }
        if lower.starts_with("to ") && !lower.contains("to:") {
            if let Some(payee) = clean_payee(&line[3..]) {
                return Some(payee);
            }
        }
    }
    None
}

fn clean_payee(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.contains('@') || candidate.len() <= 2 {
        return None;
    }
    let cleaned = NON_WORD_RE.replace_all(candidate, " ");
    let cleaned = SPACE_RE.replace_all(cleaned.trim(), " ");
    Some(cleaned.into_owned())
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    if let Some(c) = DATE_FIRST_RE.captures(text) {
        return build_time(&c[3], &c[2], &c[1], &c[4], &c[5], &c[6]);
    }
    if let Some(c) = TIME_FIRST_RE.captures(text) {
        return build_time(&c[6], &c[5], &c[4], &c[1], &c[2], &c[3]);
    }
    None
}

fn build_time(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
    am_pm: &str,
) -> Option<DateTime<Utc>> {
    let month = parse_month(month)?;
    let year: i32 = year.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    match am_pm.to_lowercase().as_str() {
        "pm" if hour != 12 => hour += 12,
        "am" if hour == 12 => hour = 0,
        _ => {}
    }

    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single()
}

fn parse_month(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
