// Statement execution.
// `Backend` is the contract the shell drives; `MemoryBackend` keeps tables in
// a map owned by whoever created it. Semantic checks (tables, columns,
// types) happen here, never in the parser.

use crate::ast::{CreateTableStatement, InsertStatement, SelectStatement, Statement};
use crate::expr::Expression;
use crate::token::{Token, TokenKind};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("table does not exist: {0}")]
    TableNotFound(String),

    #[error("column does not exist: {0}")]
    ColumnNotFound(String),

    #[error("invalid datatype: {0}")]
    InvalidDataType(String),

    #[error("missing values: table has {expected} columns, got {found} values")]
    MissingValues { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
}

impl ColumnType {
    fn from_datatype(datatype: &Token) -> Result<Self, BackendError> {
        match datatype.value.as_str() {
            "int" => Ok(ColumnType::Int),
            "text" => Ok(ColumnType::Text),
            other => Err(BackendError::InvalidDataType(format!(
                "unknown column type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "int"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// A stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Int(i32),
    Text(String),
}

impl Cell {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Cell::Int(_) => ColumnType::Int,
            Cell::Text(_) => ColumnType::Text,
        }
    }

    /// Value of a number or string literal on its own
    fn from_constant(token: &Token) -> Result<Self, BackendError> {
        match token.kind {
            TokenKind::Numeric => parse_int(token),
            TokenKind::String => Ok(Cell::Text(token.value.clone())),
            _ => Err(BackendError::InvalidDataType(format!(
                "'{}' is not a value",
                token.value
            ))),
        }
    }

    /// Value of a literal stored into a column of `column_type`
    fn for_column(token: &Token, column_type: ColumnType) -> Result<Self, BackendError> {
        match (column_type, token.kind) {
            (ColumnType::Int, TokenKind::Numeric) => parse_int(token),
            (ColumnType::Text, TokenKind::String) => Ok(Cell::Text(token.value.clone())),
            _ => Err(BackendError::InvalidDataType(format!(
                "'{}' is not a valid {} value",
                token.value, column_type
            ))),
        }
    }
}

fn parse_int(token: &Token) -> Result<Cell, BackendError> {
    token
        .value
        .parse::<i32>()
        .map(Cell::Int)
        .map_err(|_| BackendError::InvalidDataType(format!("'{}' is not an int", token.value)))
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub column_type: ColumnType,
}

/// Rows produced by a SELECT, with one column per select item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResults {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Cell>>,
}

pub trait Backend {
    fn create_table(&mut self, statement: &CreateTableStatement) -> Result<(), BackendError>;

    fn insert(&mut self, statement: &InsertStatement) -> Result<(), BackendError>;

    fn select(&self, statement: &SelectStatement) -> Result<QueryResults, BackendError>;

    /// Dispatch on the statement kind. Only SELECT produces results.
    fn execute(&mut self, statement: &Statement) -> Result<Option<QueryResults>, BackendError> {
        match statement {
            Statement::CreateTable(create) => self.create_table(create).map(|_| None),
            Statement::Insert(insert) => self.insert(insert).map(|_| None),
            Statement::Select(select) => self.select(select).map(Some),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// Tables keyed by name, kept in memory only
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<String, Table>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    fn table_for(&self, name: &Token) -> Result<&Table, BackendError> {
        self.tables
            .get(&name.value)
            .ok_or_else(|| BackendError::TableNotFound(name.value.clone()))
    }

    fn select_constants(&self, statement: &SelectStatement) -> Result<QueryResults, BackendError> {
        let mut results = QueryResults::default();
        let mut row = Vec::with_capacity(statement.items.len());

        for Expression::Literal(token) in &statement.items {
            if token.kind == TokenKind::Identifier {
                return Err(BackendError::ColumnNotFound(token.value.clone()));
            }

            let cell = Cell::from_constant(token)?;
            results.columns.push(ResultColumn {
                name: token.value.clone(),
                column_type: cell.column_type(),
            });
            row.push(cell);
        }

        results.rows.push(row);
        Ok(results)
    }
}

/// Where a result column gets its value from
enum Projection {
    Column(usize),
    Constant(Cell),
}

impl Backend for MemoryBackend {
    /// Re-creating an existing table replaces it
    fn create_table(&mut self, statement: &CreateTableStatement) -> Result<(), BackendError> {
        let mut table = Table::default();

        for column in &statement.columns {
            table.columns.push(column.name.value.clone());
            table
                .column_types
                .push(ColumnType::from_datatype(&column.datatype)?);
        }

        debug!(table = %statement.name.value, columns = table.columns.len(), "created table");
        self.tables.insert(statement.name.value.clone(), table);
        Ok(())
    }

    fn insert(&mut self, statement: &InsertStatement) -> Result<(), BackendError> {
        let table = self
            .tables
            .get_mut(&statement.table.value)
            .ok_or_else(|| BackendError::TableNotFound(statement.table.value.clone()))?;

        if statement.values.len() != table.columns.len() {
            return Err(BackendError::MissingValues {
                expected: table.columns.len(),
                found: statement.values.len(),
            });
        }

        let row = statement
            .values
            .iter()
            .zip(&table.column_types)
            .map(|(Expression::Literal(token), column_type)| Cell::for_column(token, *column_type))
            .collect::<Result<Vec<_>, _>>()?;

        table.rows.push(row);
        debug!(table = %statement.table.value, rows = table.rows.len(), "inserted row");
        Ok(())
    }

    fn select(&self, statement: &SelectStatement) -> Result<QueryResults, BackendError> {
        let Some(from) = &statement.from else {
            return self.select_constants(statement);
        };
        let table = self.table_for(from)?;

        let mut columns = Vec::with_capacity(statement.items.len());
        let mut projections = Vec::with_capacity(statement.items.len());

        for Expression::Literal(token) in &statement.items {
            if token.kind == TokenKind::Identifier {
                let index = table
                    .column_index(&token.value)
                    .ok_or_else(|| BackendError::ColumnNotFound(token.value.clone()))?;
                columns.push(ResultColumn {
                    name: token.value.clone(),
                    column_type: table.column_types[index],
                });
                projections.push(Projection::Column(index));
            } else {
                let cell = Cell::from_constant(token)?;
                columns.push(ResultColumn {
                    name: token.value.clone(),
                    column_type: cell.column_type(),
                });
                projections.push(Projection::Constant(cell));
            }
        }

        let rows = table
            .rows
            .iter()
            .map(|row| {
                projections
                    .iter()
                    .map(|projection| match projection {
                        Projection::Column(index) => row[*index].clone(),
                        Projection::Constant(cell) => cell.clone(),
                    })
                    .collect()
            })
            .collect();

        Ok(QueryResults { columns, rows })
    }
}
