use crate::planner::{
    descriptor::{ColumnSelection, EqualityPredicate, QueryDescriptor, QueryMode},
    error::PlannerError,
};
use sqlparser::{
    ast::{
        BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Select,
        SelectItem, SetExpr, Statement, TableFactor, Value,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

/// Turns the SQL subset the reader answers into a `QueryDescriptor`:
/// `SELECT COUNT(*) FROM t` and `SELECT a, b | * FROM t [WHERE c = 'lit']`.
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_sql(&self, sql: &str) -> Result<QueryDescriptor, PlannerError> {
        let dialect = SQLiteDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one statement".to_string(),
            ));
        }

        self.to_descriptor(&statements[0])
    }

    fn to_descriptor(&self, statement: &Statement) -> Result<QueryDescriptor, PlannerError> {
        let Statement::Query(query) = statement else {
            return Err(PlannerError::UnsupportedStatement(statement.to_string()));
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Err(PlannerError::UnsupportedStatement(query.to_string()));
        };

        let table = self.table_name(select)?;
        let mode = self.query_mode(select)?;
        let columns = match mode {
            QueryMode::Count => ColumnSelection::all(),
            QueryMode::Select => self.column_selection(select)?,
        };
        let predicate = select
            .selection
            .as_ref()
            .map(|expr| self.equality_predicate(expr))
            .transpose()?;

        Ok(QueryDescriptor {
            table,
            columns,
            predicate,
            mode,
        })
    }

    fn table_name(&self, select: &Select) -> Result<String, PlannerError> {
        let [from] = select.from.as_slice() else {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one table in FROM".to_string(),
            ));
        };
        if !from.joins.is_empty() {
            return Err(PlannerError::InvalidQuery("Joins are not supported".to_string()));
        }
        match &from.relation {
            TableFactor::Table { name, .. } => name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| PlannerError::InvalidQuery("Empty table name".to_string())),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }

    fn query_mode(&self, select: &Select) -> Result<QueryMode, PlannerError> {
        let counts: Vec<&Function> = select
            .projection
            .iter()
            .filter_map(|item| match item {
                SelectItem::UnnamedExpr(Expr::Function(f)) if is_count(&f.name.to_string()) => {
                    Some(f)
                }
                _ => None,
            })
            .collect();
        match counts.as_slice() {
            [] => Ok(QueryMode::Select),
            [count] if select.projection.len() == 1 => {
                if is_count_star(count) {
                    Ok(QueryMode::Count)
                } else {
                    Err(PlannerError::UnsupportedExpression(format!(
                        "only COUNT(*) is supported, got {count}"
                    )))
                }
            }
            _ => Err(PlannerError::UnsupportedExpression(
                "COUNT cannot be mixed with other projections".to_string(),
            )),
        }
    }

    fn column_selection(&self, select: &Select) -> Result<ColumnSelection, PlannerError> {
        if let [SelectItem::Wildcard(_)] = select.projection.as_slice() {
            return Ok(ColumnSelection::all());
        }
        let mut names = Vec::with_capacity(select.projection.len());
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => names.push(column_name(expr)?),
                other => return Err(PlannerError::UnsupportedExpression(other.to_string())),
            }
        }
        Ok(ColumnSelection::Named(names))
    }

    fn equality_predicate(&self, expr: &Expr) -> Result<EqualityPredicate, PlannerError> {
        match expr {
            Expr::Nested(inner) => self.equality_predicate(inner),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => Ok(EqualityPredicate {
                column: column_name(left)?,
                literal: literal_text(right)?,
            }),
            other => Err(PlannerError::UnsupportedExpression(format!(
                "only `column = literal` filters are supported, got {other}"
            ))),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_count(function_name: &str) -> bool {
    function_name.eq_ignore_ascii_case("count")
}

/// `COUNT(*)` with no DISTINCT, FILTER, OVER or extra clauses.
fn is_count_star(function: &Function) -> bool {
    let FunctionArguments::List(list) = &function.args else {
        return false;
    };
    list.duplicate_treatment.is_none()
        && list.clauses.is_empty()
        && matches!(list.args.as_slice(), [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)])
        && function.filter.is_none()
        && function.over.is_none()
        && function.within_group.is_empty()
}

fn column_name(expr: &Expr) -> Result<String, PlannerError> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|ident| ident.value.to_lowercase())
            .ok_or_else(|| PlannerError::InvalidQuery("Empty column name".to_string())),
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}

fn literal_text(expr: &Expr) -> Result<String, PlannerError> {
    match expr {
        Expr::Value(Value::SingleQuotedString(s) | Value::DoubleQuotedString(s)) => Ok(s.clone()),
        Expr::Value(Value::Number(n, _)) => Ok(n.to_string()),
        // SQLite reads a double-quoted word as a string when no column matches it
        Expr::Identifier(ident) if ident.quote_style == Some('"') => Ok(ident.value.clone()),
        Expr::UnaryOp { op, expr } if op.to_string() == "-" => {
            literal_text(expr).map(|n| format!("-{n}"))
        }
        other => Err(PlannerError::UnsupportedExpression(format!(
            "expected a literal, got {other}"
        ))),
    }
}
