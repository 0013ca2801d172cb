//! Content-risk scanner for the quote library
//!
//! Flags quotes containing terms that Facebook's community standards are
//! likely to act on. Patterns are checked in table order and the first hit
//! wins, so a quote is reported under one category only.

use regex::Regex;
use serde::Serialize;

use crate::models::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    SexualExplicit,
    SelfHarm,
    Hate,
    Drugs,
}

const PATTERNS: &[(&str, RiskCategory)] = &[
    // Thai
    ("เย็ด", RiskCategory::SexualExplicit),
    ("หี", RiskCategory::SexualExplicit),
    ("ควย", RiskCategory::SexualExplicit),
    ("เงี่ยน", RiskCategory::SexualExplicit),
    ("ร่วมเพศ", RiskCategory::SexualExplicit),
    ("โป๊", RiskCategory::SexualExplicit),
    ("xxx", RiskCategory::SexualExplicit),
    ("กะหรี่", RiskCategory::SexualExplicit),
    ("โสเภณี", RiskCategory::SexualExplicit),
    ("ขายตัว", RiskCategory::SexualExplicit),
    ("อมนก", RiskCategory::SexualExplicit),
    ("โม๊ก", RiskCategory::SexualExplicit),
    ("จู๋", RiskCategory::SexualExplicit),
    ("จิ๋ม", RiskCategory::SexualExplicit),
    ("ข่มขืน", RiskCategory::SexualExplicit),
    ("ปล้ำ", RiskCategory::SexualExplicit),
    ("อวัยวะเพศ", RiskCategory::SexualExplicit),
    ("เปลือย", RiskCategory::SexualExplicit),
    ("แก้ผ้า", RiskCategory::SexualExplicit),
    // English
    (r"\bporn", RiskCategory::SexualExplicit),
    (r"\bnude", RiskCategory::SexualExplicit),
    (r"\bnaked", RiskCategory::SexualExplicit),
    ("fuck", RiskCategory::SexualExplicit),
    (r"\bdick\b", RiskCategory::SexualExplicit),
    (r"\bcock\b", RiskCategory::SexualExplicit),
    (r"\bpussy\b", RiskCategory::SexualExplicit),
    (r"\borgasm", RiskCategory::SexualExplicit),
    (r"\bhentai", RiskCategory::SexualExplicit),
    ("ฆ่าตัวตาย", RiskCategory::SelfHarm),
    ("กรีดข้อมือ", RiskCategory::SelfHarm),
    ("แขวนคอ", RiskCategory::SelfHarm),
    ("ไอ้เหี้ย", RiskCategory::Hate),
    ("ไอ้หน้าหี", RiskCategory::Hate),
    ("ไอ้หน้าควย", RiskCategory::Hate),
    ("ยาบ้า", RiskCategory::Drugs),
    ("เฮโรอีน", RiskCategory::Drugs),
    ("โคเคน", RiskCategory::Drugs),
    ("ยาไอซ์", RiskCategory::Drugs),
];

lazy_static::lazy_static! {
    static ref RISK_TABLE: Vec<(Regex, RiskCategory)> = PATTERNS
        .iter()
        .map(|(pattern, category)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), *category))
        .collect();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskMatch {
    pub category: RiskCategory,
    pub matched: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskyQuote {
    pub id: String,
    pub text: String,
    pub category: RiskCategory,
    pub matched: String,
}

/// First risky term found in `text`, if any
pub fn scan_text(text: &str) -> Option<RiskMatch> {
    RISK_TABLE.iter().find_map(|(regex, category)| {
        regex.find(text).map(|m| RiskMatch {
            category: *category,
            matched: m.as_str().to_string(),
        })
    })
}

pub fn scan_quotes(quotes: &[Quote]) -> Vec<RiskyQuote> {
    quotes
        .iter()
        .filter_map(|quote| {
            scan_text(&quote.quote_text).map(|hit| RiskyQuote {
                id: quote.id.clone(),
                text: quote.quote_text.clone(),
                category: hit.category,
                matched: hit.matched,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quote(id: &str, text: &str) -> Quote {
        Quote {
            id: id.to_string(),
            quote_text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(RISK_TABLE.len(), PATTERNS.len());
    }

    #[test]
    fn test_flags_explicit_terms() {
        let hit = scan_text("Some NUDE photos").unwrap();
        assert_eq!(hit.category, RiskCategory::SexualExplicit);
        assert_eq!(hit.matched, "NUDE");

        let hit = scan_text("อย่าคิดฆ่าตัวตายเลย").unwrap();
        assert_eq!(hit.category, RiskCategory::SelfHarm);

        let hit = scan_text("เลิกยาบ้าซะ").unwrap();
        assert_eq!(hit.category, RiskCategory::Drugs);
    }

    #[test]
    fn test_clean_text_passes() {
        assert!(scan_text("ความสุขอยู่ที่ใจ").is_none());
        assert!(scan_text("Stay hungry, stay foolish").is_none());
        // Word boundaries keep common words clean
        assert!(scan_text("a cocktail with dickens").is_none());
    }

    #[test]
    fn test_first_pattern_in_table_order_wins() {
        // Contains both a hate slur and its sexual-explicit substring
        let hit = scan_text("ไอ้หน้าควย").unwrap();
        assert_eq!(hit.category, RiskCategory::SexualExplicit);
        assert_eq!(hit.matched, "ควย");
    }

    #[test]
    fn test_scan_quotes_keeps_only_risky() {
        let quotes = vec![quote("a", "be kind"), quote("b", "porn star"), quote("c", "ok")];
        let risky = scan_quotes(&quotes);
        assert_eq!(risky.len(), 1);
        assert_eq!(risky[0].id, "b");
        assert_eq!(serde_json::to_value(&risky[0]).unwrap()["category"], "sexual-explicit");
    }
}
