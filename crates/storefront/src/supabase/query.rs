//! PostgREST query construction.
//!
//! Builds the filter/order/select parameters the REST layer understands,
//! e.g. `select=*,products(*)&user_id=eq.<uuid>&order=created_at.desc`.

use std::fmt::Display;

/// Sort direction for an `order` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A PostgREST query under construction.
///
/// Renders to `(key, value)` pairs appended to the request URL; values go
/// through the HTTP client's percent-encoding, so nothing here needs manual
/// escaping.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column projection, including embedded resources
    /// (`*,products(*)`).
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_owned(), columns.to_owned()));
        self
    }

    /// Add an equality filter on a column.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_owned(), format!("eq.{value}")));
        self
    }

    /// Add a disjunction of filter clauses, each already in PostgREST
    /// `column.op.value` form.
    #[must_use]
    pub fn or<I>(mut self, clauses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let joined = clauses
            .into_iter()
            .map(|clause| clause.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push(("or".to_owned(), format!("({joined})")));
        self
    }

    /// Order results by a column.
    #[must_use]
    pub fn order(mut self, column: &str, direction: SortOrder) -> Self {
        self.params.push((
            "order".to_owned(),
            format!("{column}.{}", direction.suffix()),
        ));
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub fn limit(mut self, count: u32) -> Self {
        self.params.push(("limit".to_owned(), count.to_string()));
        self
    }

    /// The rendered query pairs.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(query: &Query) -> Vec<(&str, &str)> {
        query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_eq_filter() {
        let query = Query::new().select("*").eq("user_id", "abc");
        assert_eq!(rendered(&query), vec![("select", "*"), ("user_id", "eq.abc")]);
    }

    #[test]
    fn test_or_clause_wraps_in_parens() {
        let query = Query::new().or(["sender_id.eq.u1", "receiver_id.eq.u1"]);
        assert_eq!(
            rendered(&query),
            vec![("or", "(sender_id.eq.u1,receiver_id.eq.u1)")]
        );
    }

    #[test]
    fn test_order_and_limit() {
        let query = Query::new()
            .order("created_at", SortOrder::Descending)
            .limit(8);
        assert_eq!(
            rendered(&query),
            vec![("order", "created_at.desc"), ("limit", "8")]
        );
    }

    #[test]
    fn test_embedded_select_passes_through() {
        let query = Query::new().select("id,product_id,products(*)");
        assert_eq!(rendered(&query), vec![("select", "id,product_id,products(*)")]);
    }
}
