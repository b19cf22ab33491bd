use indexmap::IndexMap;
use sea_orm::{
    Condition, DatabaseBackend, EntityTrait, Statement,
    sea_query::{
        Alias, Asterisk, BinOper, ConditionExpression, Expr, Func,
        MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter, SelectStatement,
        SimpleExpr, SqliteQueryBuilder, SubQueryStatement,
    },
};
use serde_json::Value;
use uuid::Uuid;

use super::{QueryBuilder, Relation, SortDirection};
use crate::{
    config::SearchMode,
    errors::ModifierError,
    filtering::{
        expression::Operator,
        search::{LIKE_ESCAPE, escape_like_wildcards},
    },
    schema::entity_table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connector {
    And,
    Or,
}

/// [`QueryBuilder`] that assembles a sea-query `SELECT` for one table.
///
/// Where clauses are kept as a flat list joined by AND/OR, and rendered with SQL
/// precedence: `a OR b AND c` is `a OR (b AND c)`.
///
/// ```rust,ignore
/// let builder = SeaQueryBuilder::new("posts")
///     .with_relation(Relation::has_many("comments", "comments", "post_id"))
///     .with_searchable(["title", "body"]);
///
/// let builder = apply(&params, builder, &config)?;
/// let rows = db.query_all(builder.build(db.get_database_backend())).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SeaQueryBuilder {
    model: String,
    table: String,
    columns: Vec<String>,
    clauses: Vec<(Connector, ConditionExpression)>,
    orders: Vec<(String, SortDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
    relations: IndexMap<String, Relation>,
    searchable: Vec<String>,
}

/// Bind a JSON value the way the database expects it. UUID-shaped strings are bound
/// as UUIDs.
fn to_sea_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::String(s) => Uuid::parse_str(s.trim())
            .map_or_else(|_| sea_orm::Value::from(s.clone()), sea_orm::Value::from),
        Value::Number(n) => n.as_i64().map_or_else(
            || sea_orm::Value::from(n.as_f64().unwrap_or_default()),
            sea_orm::Value::from,
        ),
        Value::Bool(b) => sea_orm::Value::from(*b),
        Value::Null => sea_orm::Value::String(None),
        other => sea_orm::Value::from(other.to_string()),
    }
}

fn like_pattern(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bin_oper(operator: Operator) -> BinOper {
    match operator {
        Operator::Eq => BinOper::Equal,
        Operator::NotEq => BinOper::NotEqual,
        Operator::Gt => BinOper::GreaterThan,
        Operator::Gte => BinOper::GreaterThanOrEqual,
        Operator::Lt => BinOper::SmallerThan,
        Operator::Lte => BinOper::SmallerThanOrEqual,
        Operator::Like => BinOper::Like,
        Operator::NotLike => BinOper::NotLike,
    }
}

fn comparison(field: &str, operator: Operator, value: &Value) -> SimpleExpr {
    let column = Expr::col(Alias::new(field));
    match operator {
        Operator::Like => column.like(like_pattern(value)),
        Operator::NotLike => column.not_like(like_pattern(value)),
        _ => column.binary(bin_oper(operator), to_sea_value(value)),
    }
}

impl SeaQueryBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            model: table.clone(),
            table,
            columns: Vec::new(),
            clauses: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            relations: IndexMap::new(),
            searchable: Vec::new(),
        }
    }

    /// Builder over the table of a sea-orm entity
    #[must_use]
    pub fn for_entity<E: EntityTrait>() -> Self {
        Self::new(entity_table::<E>())
    }

    /// Name reported in diagnostics; defaults to the table name
    #[must_use]
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Columns free-text search may look at. Without any, search is unsupported.
    #[must_use]
    pub fn with_searchable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The accumulated where clauses as a single condition
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut groups = Condition::any();
        let mut group = Condition::all();
        let mut split = false;

        for (index, (connector, expr)) in self.clauses.iter().enumerate() {
            if *connector == Connector::Or && index > 0 {
                groups = groups.add(group);
                group = Condition::all();
                split = true;
            }
            group = group.add(expr.clone());
        }

        if split { groups.add(group) } else { group }
    }

    #[must_use]
    pub fn statement(&self) -> SelectStatement {
        let mut select = Query::select();

        if self.columns.is_empty() {
            select.column(Asterisk);
        } else {
            select.columns(self.columns.iter().map(Alias::new));
        }
        select.from(Alias::new(&self.table));

        if !self.clauses.is_empty() {
            select.cond_where(self.condition());
        }
        for (field, direction) in &self.orders {
            select.order_by(Alias::new(field), (*direction).into());
        }
        if let Some(limit) = self.limit {
            select.limit(limit);
        }
        if let Some(offset) = self.offset {
            select.offset(offset);
        }

        select
    }

    /// Render with values inlined, for logging and tests
    #[must_use]
    pub fn to_sql(&self, backend: DatabaseBackend) -> String {
        let statement = self.statement();
        match backend {
            DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
            DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
            _ => statement.to_string(SqliteQueryBuilder),
        }
    }

    /// Parameterised statement ready for a sea-orm connection
    #[must_use]
    pub fn build(&self, backend: DatabaseBackend) -> Statement {
        backend.build(&self.statement())
    }

    fn push(mut self, connector: Connector, expr: impl Into<ConditionExpression>) -> Self {
        self.clauses.push((connector, expr.into()));
        self
    }

    /// `(SELECT COUNT(*) FROM related WHERE related.fk = parent.pk AND ...) op count`
    fn relation_count(
        &self,
        relation: &Relation,
        constraint: Option<Condition>,
        operator: Operator,
        count: u64,
    ) -> SimpleExpr {
        let mut condition = Condition::all().add(
            Expr::col((Alias::new(&relation.table), Alias::new(&relation.foreign_key)))
                .equals((Alias::new(&self.table), Alias::new(&relation.local_key))),
        );
        if let Some(constraint) = constraint {
            condition = condition.add(constraint);
        }

        let mut counted = Query::select();
        counted
            .expr(Func::count(Expr::col(Asterisk)))
            .from(Alias::new(&relation.table))
            .cond_where(condition);

        let subquery = SimpleExpr::SubQuery(
            None,
            Box::new(SubQueryStatement::SelectStatement(counted)),
        );
        Expr::expr(subquery).binary(bin_oper(operator), count)
    }
}

impl QueryBuilder for SeaQueryBuilder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn filter(self, field: &str, operator: Operator, value: &Value) -> Self {
        let expr = comparison(field, operator, value);
        self.push(Connector::And, expr)
    }

    fn or_filter(self, field: &str, operator: Operator, value: &Value) -> Self {
        let expr = comparison(field, operator, value);
        self.push(Connector::Or, expr)
    }

    fn filter_in(self, field: &str, values: &[Value]) -> Self {
        let expr = Expr::col(Alias::new(field)).is_in(values.iter().map(to_sea_value));
        self.push(Connector::And, expr)
    }

    fn filter_not_in(self, field: &str, values: &[Value]) -> Self {
        let expr = Expr::col(Alias::new(field)).is_not_in(values.iter().map(to_sea_value));
        self.push(Connector::And, expr)
    }

    fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.orders.push((field.to_string(), direction));
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn select(mut self, fields: &[String]) -> Self {
        self.columns = fields.to_vec();
        self
    }

    fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    fn has(self, relation: &str, operator: Operator, count: u64) -> Self {
        let Some(related) = self.relations.get(relation) else {
            tracing::warn!(relation, model = %self.model, "Ignoring has filter on unknown relation");
            return self;
        };
        let expr = self.relation_count(related, None, operator, count);
        self.push(Connector::And, expr)
    }

    fn where_has<F>(
        self,
        relation: &str,
        operator: Operator,
        count: u64,
        constrain: F,
    ) -> Result<Self, ModifierError>
    where
        F: FnOnce(Self) -> Result<Self, ModifierError>,
    {
        let related = self
            .relations
            .get(relation)
            .ok_or_else(|| ModifierError::invalid_relation(relation))?;

        let constrained = constrain(Self::new(related.table.clone()))?;
        let constraint = (!constrained.clauses.is_empty()).then(|| constrained.condition());

        let expr = self.relation_count(related, constraint, operator, count);
        Ok(self.push(Connector::And, expr))
    }

    fn supports_search(&self) -> bool {
        !self.searchable.is_empty()
    }

    fn search(self, term: &str, mode: SearchMode, scope: &[String]) -> Self {
        let (columns, pattern): (Vec<&String>, String) = match mode {
            SearchMode::ColumnLimited => (
                self.searchable
                    .iter()
                    .filter(|column| scope.contains(*column))
                    .collect(),
                escape_like_wildcards(term),
            ),
            SearchMode::Wildcard => (
                self.searchable
                    .iter()
                    .filter(|column| scope.is_empty() || scope.contains(*column))
                    .collect(),
                escape_like_wildcards(term).replace('*', "%"),
            ),
        };

        let condition = if columns.is_empty() {
            tracing::debug!(model = %self.model, "No searchable columns in scope");
            Condition::all().add(Expr::cust("1 = 0"))
        } else {
            // Fold both sides with the same SQL UPPER
            let template = format!("$1 LIKE UPPER($2) ESCAPE '{LIKE_ESCAPE}'");
            let pattern = format!("%{pattern}%");
            let mut any = Condition::any();
            for column in columns {
                any = any.add(Expr::cust_with_exprs(
                    template.as_str(),
                    [
                        Func::upper(Expr::col(Alias::new(column))).into(),
                        Expr::val(pattern.as_str()).into(),
                    ],
                ));
            }
            any
        };

        self.push(Connector::And, condition)
    }
}
