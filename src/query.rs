use mongodb::bson::{doc, Document, Regex};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Highest page served; keeps `skip` within the signed 64-bit range the
/// server accepts.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// Query string of the product listing. Values are kept as raw strings so a
/// non-numeric page or limit falls back to the default instead of failing;
/// numeric values, however large or negative, are clamped.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl ProductQuery {
    pub fn page(&self) -> u64 {
        parse_number(self.page.as_deref())
            .map(|page| page.clamp(1, MAX_PAGE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        parse_number(self.limit.as_deref())
            .map(|limit| limit.clamp(1, MAX_LIMIT as i64) as u64)
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Case-insensitive match of the search term on name, description or SKU,
    /// combined with an exact category match. Blank parameters are ignored.
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();

        if let Some(search) = non_blank(self.search.as_deref()) {
            let pattern = regex::escape(search);
            let clauses: Vec<Document> = ["name", "description", "sku"]
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(
                        *field,
                        Regex {
                            pattern: pattern.clone(),
                            options: "i".to_string(),
                        },
                    );
                    clause
                })
                .collect();
            filter.insert("$or", clauses);
        }

        if let Some(category) = non_blank(self.category.as_deref()) {
            filter.insert("category", category);
        }

        filter
    }

    pub fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(self.skip())
            .limit(self.limit() as i64)
            .build()
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        let limit = self.limit();
        Pagination {
            page: self.page(),
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Parses an integer, saturating values outside the `i64` range. Anything
/// that is not an integer yields `None`.
fn parse_number(raw: Option<&str>) -> Option<i64> {
    let v = raw?.trim();
    if let Ok(n) = v.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match v.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, v.strip_prefix('+').unwrap_or(v)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    fn query(page: &str, limit: &str) -> ProductQuery {
        ProductQuery {
            page: Some(page.into()),
            limit: Some(limit.into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_missing_or_garbage() {
        let q = ProductQuery::default();
        assert_eq!((q.page(), q.limit(), q.skip()), (1, 10, 0));

        let q = query("abc", "1.5");
        assert_eq!((q.page(), q.limit()), (1, 10));
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let q = query("0", "0");
        assert_eq!((q.page(), q.limit()), (1, 1));

        let q = query("3", "1000");
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.skip(), 200);
    }

    #[test]
    fn negative_values_are_clamped() {
        let q = query("-3", "-5");
        assert_eq!((q.page(), q.limit(), q.skip()), (1, 1, 0));
    }

    #[test]
    fn huge_page_is_capped_without_overflow() {
        let q = query("1000000000000000000", "100");
        assert_eq!(q.page(), MAX_PAGE);
        assert_eq!(q.skip(), (MAX_PAGE - 1) * 100);
        assert!(q.skip() <= i64::MAX as u64);

        let q = query("99999999999999999999999", "99999999999999999999999");
        assert_eq!((q.page(), q.limit()), (MAX_PAGE, MAX_LIMIT));
        assert!(q.skip() <= i64::MAX as u64);
        assert_eq!(q.pagination(250).page, MAX_PAGE);
    }

    #[test]
    fn skip_follows_page() {
        assert_eq!(query("4", "25").skip(), 75);
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = ProductQuery {
            search: Some("   ".into()),
            category: Some(String::new()),
            ..Default::default()
        };
        assert!(q.filter().is_empty());
    }

    #[test]
    fn search_spans_three_fields_case_insensitively() {
        let q = ProductQuery {
            search: Some("shirt".into()),
            ..Default::default()
        };
        let filter = q.filter();
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);

        let fields: Vec<&str> = clauses
            .iter()
            .map(|c| c.as_document().unwrap().keys().next().unwrap().as_str())
            .collect();
        assert_eq!(fields, vec!["name", "description", "sku"]);

        match clauses[0].as_document().unwrap().get("name") {
            Some(Bson::RegularExpression(regex)) => {
                assert_eq!(regex.pattern, "shirt");
                assert_eq!(regex.options, "i");
            }
            other => panic!("expected a regex, got {:?}", other),
        }
    }

    #[test]
    fn search_input_is_matched_literally() {
        let q = ProductQuery {
            search: Some("a.b(c".into()),
            ..Default::default()
        };
        let filter = q.filter();
        let clause = filter.get_array("$or").unwrap()[2].as_document().unwrap().clone();
        match clause.get("sku") {
            Some(Bson::RegularExpression(regex)) => assert_eq!(regex.pattern, r"a\.b\(c"),
            other => panic!("expected a regex, got {:?}", other),
        }
    }

    #[test]
    fn category_is_exact_and_combines_with_search() {
        let q = ProductQuery {
            search: Some("tee".into()),
            category: Some(" Apparel ".into()),
            ..Default::default()
        };
        let filter = q.filter();
        assert_eq!(filter.get_str("category").unwrap(), "Apparel");
        assert!(filter.contains_key("$or"));
    }

    #[test]
    fn pages_round_up() {
        let q = query("1", "10");
        assert_eq!(q.pagination(0).pages, 0);
        assert_eq!(q.pagination(10).pages, 1);
        assert_eq!(q.pagination(11).pages, 2);
        assert_eq!(
            q.pagination(25),
            Pagination { page: 1, limit: 10, total: 25, pages: 3 }
        );
    }
}
