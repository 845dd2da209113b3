//! Legacy search surfaces.
//!
//! These predate the filter language and are kept for callers that build
//! queries structurally. Each one desugars to a filter AST and runs through
//! the same compiler, so the type-aware comparison rules apply uniformly.
//! Structural input violations yield an empty list, never an error.

use docket_core::{PRIMARY_KEY, Value};
use docket_filter::{CmpOp, Expr, list_elements};

use crate::database::{Database, filter_schema};
use crate::error::Result;

impl Database {
    /// Case-sensitive substring search over the named columns, OR-combined.
    ///
    /// Returns the ids of matching documents. The primary key participates
    /// when listed. An empty column list or any unknown column name yields
    /// an empty result.
    pub fn get_documents_matching_search(
        &self,
        text: &str,
        columns: &[&str],
    ) -> Result<Vec<String>> {
        let types = filter_schema(&self.get_columns()?);
        if columns.is_empty() || columns.iter().any(|c| !types.contains_key(*c)) {
            return Ok(Vec::new());
        }

        let mut clauses = columns.iter().map(|c| {
            Expr::cmp(
                CmpOp::Contains,
                Expr::Column((*c).to_owned()),
                Expr::Literal(Value::from(text)),
            )
        });
        let Some(mut expr) = clauses.next() else {
            return Ok(Vec::new());
        };
        for clause in clauses {
            expr = Expr::or(expr, clause);
        }
        self.collect_ids(&expr)
    }

    /// N-ary boolean search with per-clause negation, restricted to `scope`.
    ///
    /// Clause `i` is an OR over `fields[i]` of `field <conditions[i]>
    /// values[i]`, negated when `nots[i]` is `"NOT"`; clauses are combined
    /// left to right by `links` (`"AND"` / `"OR"`). Conditions are `=`,
    /// `!=`, `<`, `>`, `<=`, `>=`, `CONTAINS`, `BETWEEN` (list of two
    /// bounds) and `IN` (list of candidates). Any structural violation
    /// yields an empty result.
    pub fn get_documents_matching_advanced_search(
        &self,
        links: &[&str],
        fields: &[Vec<String>],
        conditions: &[&str],
        values: &[Value],
        nots: &[&str],
        scope: &[&str],
    ) -> Result<Vec<String>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let shape_ok = links.len() + 1 == fields.len()
            && conditions.len() == fields.len()
            && values.len() == fields.len()
            && nots.len() == fields.len()
            && links.iter().all(|l| matches!(*l, "AND" | "OR"))
            && nots.iter().all(|n| matches!(*n, "" | "NOT"));
        if !shape_ok {
            return Ok(Vec::new());
        }

        let mut clauses = Vec::with_capacity(fields.len());
        for i in 0..fields.len() {
            let Some(clause) = search_clause(&fields[i], conditions[i], &values[i]) else {
                return Ok(Vec::new());
            };
            clauses.push(if nots[i] == "NOT" {
                Expr::not(clause)
            } else {
                clause
            });
        }

        let mut clauses = clauses.into_iter();
        let Some(mut expr) = clauses.next() else {
            return Ok(Vec::new());
        };
        for (link, clause) in links.iter().zip(clauses) {
            expr = match *link {
                "AND" => Expr::and(expr, clause),
                _ => Expr::or(expr, clause),
            };
        }

        // The search runs within the caller-provided document scope.
        let scope_ids = Expr::List(
            scope
                .iter()
                .map(|id| Expr::Literal(Value::from(*id)))
                .collect(),
        );
        expr = Expr::and(
            expr,
            Expr::cmp(CmpOp::In, Expr::Column(PRIMARY_KEY.to_owned()), scope_ids),
        );
        self.collect_ids(&expr)
    }

    /// Ids of documents whose current cells equal every given
    /// (column, value) couple.
    pub fn get_documents_matching_column_value_couples(
        &self,
        couples: &[(&str, Value)],
    ) -> Result<Vec<String>> {
        let mut clauses = couples.iter().map(|(name, value)| {
            Expr::cmp(
                CmpOp::Eq,
                Expr::Column((*name).to_owned()),
                Expr::Literal(value.clone()),
            )
        });
        let Some(mut expr) = clauses.next() else {
            return Ok(Vec::new());
        };
        for clause in clauses {
            expr = Expr::and(expr, clause);
        }
        self.collect_ids(&expr)
    }

    fn collect_ids(&self, expr: &Expr) -> Result<Vec<String>> {
        Ok(self
            .execute_filter(expr)?
            .into_iter()
            .map(|doc| doc.id().to_owned())
            .collect())
    }
}

/// Builds one advanced-search clause: an OR over the clause's fields.
fn search_clause(fields: &[String], condition: &str, value: &Value) -> Option<Expr> {
    let mut exprs = fields
        .iter()
        .map(|f| field_condition(f, condition, value))
        .collect::<Option<Vec<_>>>()?
        .into_iter();
    let first = exprs.next()?;
    Some(exprs.fold(first, Expr::or))
}

fn field_condition(field: &str, condition: &str, value: &Value) -> Option<Expr> {
    let column = Expr::Column(field.to_owned());
    let op = match condition {
        "=" => CmpOp::Eq,
        "!=" => CmpOp::Ne,
        "<" => CmpOp::Lt,
        ">" => CmpOp::Gt,
        "<=" => CmpOp::Le,
        ">=" => CmpOp::Ge,
        "CONTAINS" => CmpOp::Contains,
        "BETWEEN" => {
            let bounds = list_elements(value)?;
            let [low, high] = bounds.as_slice() else {
                return None;
            };
            return Some(Expr::and(
                Expr::cmp(CmpOp::Ge, column.clone(), Expr::Literal(low.clone())),
                Expr::cmp(CmpOp::Le, column, Expr::Literal(high.clone())),
            ));
        }
        "IN" => {
            let members = list_elements(value)?;
            return Some(Expr::cmp(
                CmpOp::In,
                column,
                Expr::List(members.into_iter().map(Expr::Literal).collect()),
            ));
        }
        _ => return None,
    };
    Some(Expr::cmp(op, column, Expr::Literal(value.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::SemanticType;
    use pretty_assertions::assert_eq;

    fn seeded_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db"), false).unwrap();
        db.add_column("PatientName", SemanticType::String, None)
            .unwrap();
        db.add_column("SequenceName", SemanticType::String, None)
            .unwrap();
        db.add_column("BandWidth", SemanticType::Integer, None)
            .unwrap();
        for id in ["document1", "document2", "document3"] {
            db.add_document(id).unwrap();
        }
        db.new_value("document1", "PatientName", Value::from("Guerbet"), None)
            .unwrap();
        db.new_value("document2", "SequenceName", Value::from("RARE"), None)
            .unwrap();
        db.new_value("document3", "BandWidth", Value::Integer(50_000), None)
            .unwrap();
        (dir, db)
    }

    const ALL: [&str; 3] = ["document1", "document2", "document3"];

    #[test]
    fn substring_search() {
        let (_dir, db) = seeded_db();
        assert_eq!(
            db.get_documents_matching_search("search", &["PatientName"])
                .unwrap(),
            Vec::<String>::new()
        );
        assert_eq!(
            db.get_documents_matching_search("document", &["PatientName", PRIMARY_KEY])
                .unwrap(),
            ALL.to_vec()
        );
        assert_eq!(
            db.get_documents_matching_search("Guerbet", &["PatientName"])
                .unwrap(),
            vec!["document1"]
        );
        // Unknown column names and empty column lists yield nothing.
        assert!(
            db.get_documents_matching_search("search", &["column_not_existing"])
                .unwrap()
                .is_empty()
        );
        assert!(
            db.get_documents_matching_search("search", &[])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn advanced_search_single_clause() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["PatientName".into()]],
                &["="],
                &[Value::from("Guerbet")],
                &[""],
                &ALL,
            )
            .unwrap();
        assert_eq!(hits, vec!["document1"]);
    }

    #[test]
    fn advanced_search_negation_matches_null_cells() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["PatientName".into()]],
                &["="],
                &[Value::from("Guerbet")],
                &["NOT"],
                &ALL,
            )
            .unwrap();
        assert_eq!(hits, vec!["document2", "document3"]);
    }

    #[test]
    fn advanced_search_links_clauses() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &["OR"],
                &[vec!["PatientName".into()], vec!["SequenceName".into()]],
                &["=", "CONTAINS"],
                &[Value::from("Guerbet"), Value::from("RARE")],
                &["", ""],
                &ALL,
            )
            .unwrap();
        assert_eq!(hits, vec!["document1", "document2"]);

        let hits = db
            .get_documents_matching_advanced_search(
                &["AND"],
                &[vec!["PatientName".into()], vec!["SequenceName".into()]],
                &["=", "CONTAINS"],
                &[Value::from("Guerbet"), Value::from("RARE")],
                &["", ""],
                &ALL,
            )
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn advanced_search_structural_violations_are_empty() {
        let (_dir, db) = seeded_db();
        // No clauses at all.
        assert!(
            db.get_documents_matching_advanced_search(&[], &[], &[], &[], &[], &[])
                .unwrap()
                .is_empty()
        );
        // Link count does not fit the clause count.
        assert!(
            db.get_documents_matching_advanced_search(
                &["AND"],
                &[vec!["PatientName".into()]],
                &["="],
                &[Value::from("Guerbet")],
                &[""],
                &ALL,
            )
            .unwrap()
            .is_empty()
        );
        // Unknown condition keyword.
        assert!(
            db.get_documents_matching_advanced_search(
                &[],
                &[vec!["PatientName".into()]],
                &["wrong_condition"],
                &[Value::from("Guerbet")],
                &[""],
                &ALL,
            )
            .unwrap()
            .is_empty()
        );
        // BETWEEN needs a list of exactly two bounds.
        assert!(
            db.get_documents_matching_advanced_search(
                &[],
                &[vec!["PatientName".into()]],
                &["BETWEEN"],
                &[Value::from("Guerbet")],
                &["NOT"],
                &ALL,
            )
            .unwrap()
            .is_empty()
        );
        // Unknown not-token.
        assert!(
            db.get_documents_matching_advanced_search(
                &[],
                &[vec!["PatientName".into()]],
                &["="],
                &[Value::from("Guerbet")],
                &["wrong_not"],
                &ALL,
            )
            .unwrap()
            .is_empty()
        );
    }

    #[test]
    fn advanced_search_unknown_field_matches_nothing() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["TagNotExisting".into()]],
                &["="],
                &[Value::from("Guerbet")],
                &[""],
                &ALL,
            )
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn advanced_search_type_strict_equality() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["BandWidth".into()]],
                &["="],
                &[Value::Integer(50_000)],
                &[""],
                &ALL,
            )
            .unwrap();
        assert_eq!(hits, vec!["document3"]);

        // A string never silently equals an integer.
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["BandWidth".into()]],
                &["="],
                &[Value::from("50000")],
                &[""],
                &ALL,
            )
            .unwrap();
        assert!(hits.is_empty());

        // The scope restricts the search.
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec!["BandWidth".into()]],
                &["="],
                &[Value::Integer(50_000)],
                &[""],
                &["document1", "document2"],
            )
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn advanced_search_contains_on_the_primary_key() {
        let (_dir, db) = seeded_db();
        let hits = db
            .get_documents_matching_advanced_search(
                &[],
                &[vec![PRIMARY_KEY.into()]],
                &["CONTAINS"],
                &[Value::from("document")],
                &[""],
                &ALL,
            )
            .unwrap();
        assert_eq!(hits, ALL.to_vec());
    }

    #[test]
    fn column_value_couples() {
        let (_dir, db) = seeded_db();
        assert!(
            db.get_documents_matching_column_value_couples(&[])
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            db.get_documents_matching_column_value_couples(&[(
                "PatientName",
                Value::from("Guerbet")
            )])
            .unwrap(),
            vec!["document1"]
        );
        assert!(
            db.get_documents_matching_column_value_couples(&[
                ("PatientName", Value::from("Guerbet")),
                ("SequenceName", Value::from("RARE")),
            ])
            .unwrap()
            .is_empty()
        );

        db.new_value("document2", "PatientName", Value::from("Guerbet"), None)
            .unwrap();
        db.new_value("document2", "BandWidth", Value::Integer(50_000), None)
            .unwrap();
        assert_eq!(
            db.get_documents_matching_column_value_couples(&[
                ("PatientName", Value::from("Guerbet")),
                ("SequenceName", Value::from("RARE")),
                ("BandWidth", Value::Integer(50_000)),
            ])
            .unwrap(),
            vec!["document2"]
        );
        assert!(
            db.get_documents_matching_column_value_couples(&[
                ("PatientName", Value::from("Guerbet")),
                ("BandWidth", Value::from("50000")),
            ])
            .unwrap()
            .is_empty()
        );
        assert!(
            db.get_documents_matching_column_value_couples(&[(
                "column_not_existing",
                Value::from("Guerbet")
            )])
            .unwrap()
            .is_empty()
        );
    }
}
