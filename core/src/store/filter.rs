// roster/src/store/filter.rs

//! Ordered predicate list shared by the student search and count queries.
//!
//! Each predicate is a SQL template with a `{p}` placeholder plus the value
//! bound to it. Rendering folds the list left to right and numbers the
//! placeholders as it goes, so the page query and the count query always see
//! the same predicates bound at the same positions.

use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::model::StudentQuery;

const STUDENT_FROM: &str = "FROM users t1 LEFT JOIN user_profiles t3 ON t1.id = t3.user_id";

const SUMMARY_COLUMNS: &str = "t1.id, t1.name, t1.email, t1.last_login::timestamptz AS last_login, \
   COALESCE(t1.is_active, false) AS system_access, t3.class_name AS class, t3.section_name AS section, \
   t3.roll::int4 AS roll";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Int(i32),
  Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
  template: &'static str,
  value: FilterValue,
}

impl Predicate {
  pub fn role(role_id: i32) -> Self {
    Self {
      template: "t1.role_id = {p}",
      value: FilterValue::Int(role_id),
    }
  }

  /// Case-insensitive substring match on name or email, one bound value.
  pub fn name_or_email_contains(term: &str) -> Self {
    Self {
      template: "(t1.name ILIKE {p} OR t1.email ILIKE {p})",
      value: FilterValue::Text(format!("%{}%", escape_like(term))),
    }
  }

  pub fn class_equals(class: &str) -> Self {
    Self {
      template: "t3.class_name = {p}",
      value: FilterValue::Text(class.to_string()),
    }
  }

  pub fn section_equals(section: &str) -> Self {
    Self {
      template: "t3.section_name = {p}",
      value: FilterValue::Text(section.to_string()),
    }
  }

  pub fn value(&self) -> &FilterValue {
    &self.value
  }

  fn render(&self, position: usize) -> String {
    self.template.replace("{p}", &format!("${position}"))
  }
}

/// Predicates for one student search, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
  predicates: Vec<Predicate>,
}

impl FilterSet {
  /// Role restriction first, then search, class and section when present.
  pub fn for_query(student_role_id: i32, query: &StudentQuery) -> Self {
    let mut predicates = vec![Predicate::role(student_role_id)];
    if !query.search.is_empty() {
      predicates.push(Predicate::name_or_email_contains(&query.search));
    }
    if let Some(class) = query.class.as_deref() {
      predicates.push(Predicate::class_equals(class));
    }
    if let Some(section) = query.section.as_deref() {
      predicates.push(Predicate::section_equals(section));
    }
    Self { predicates }
  }

  pub fn predicates(&self) -> &[Predicate] {
    &self.predicates
  }

  /// Renders ` WHERE a AND b ...` and returns the next free parameter position.
  fn render_where(&self) -> (String, usize) {
    self
      .predicates
      .iter()
      .fold((String::new(), 1), |(mut sql, position), predicate| {
        sql.push_str(if position == 1 { " WHERE " } else { " AND " });
        sql.push_str(&predicate.render(position));
        (sql, position + 1)
      })
  }

  /// Page query: filters, stable id ordering, then `LIMIT`/`OFFSET`.
  pub fn page_sql(&self) -> String {
    let (where_clause, next) = self.render_where();
    format!(
      "SELECT {SUMMARY_COLUMNS} {STUDENT_FROM}{where_clause} ORDER BY t1.id LIMIT ${} OFFSET ${}",
      next,
      next + 1
    )
  }

  /// Count query over the same filters, no pagination.
  pub fn count_sql(&self) -> String {
    let (where_clause, _) = self.render_where();
    format!("SELECT COUNT(*) AS total {STUDENT_FROM}{where_clause}")
  }

  /// Bound values for [`count_sql`](Self::count_sql).
  pub fn count_arguments(&self) -> Result<PgArguments, sqlx::Error> {
    let mut args = PgArguments::default();
    for predicate in &self.predicates {
      match &predicate.value {
        FilterValue::Int(v) => args.add(*v),
        FilterValue::Text(v) => args.add(v.clone()),
      }
      .map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
  }

  /// Bound values for [`page_sql`](Self::page_sql): filters, then limit and offset.
  pub fn page_arguments(&self, limit: i64, offset: i64) -> Result<PgArguments, sqlx::Error> {
    let mut args = self.count_arguments()?;
    args.add(limit).map_err(sqlx::Error::Encode)?;
    args.add(offset).map_err(sqlx::Error::Encode)?;
    Ok(args)
  }
}

/// Escapes `%`, `_` and `\` so search text matches literally inside ILIKE.
fn escape_like(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}
