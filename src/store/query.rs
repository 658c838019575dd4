use serde::Serialize;
use uuid::Uuid;

/// Tables the client reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Doctors,
    Profiles,
    Surgeries,
    Appointments,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Profiles => "profiles",
            Self::Surgeries => "surgeries",
            Self::Appointments => "appointments",
        }
    }

    /// Foreign-key column on a child row pointing at this table, for the
    /// relations the client expands.
    pub fn foreign_key(self) -> Option<&'static str> {
        match self {
            Self::Doctors => Some("doctor_id"),
            Self::Profiles => Some("patient_id"),
            Self::Surgeries | Self::Appointments => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Text(String),
    Id(Uuid),
}

impl FilterValue {
    /// Canonical text form, as sent after `eq.`.
    pub fn to_param(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s.clone(),
            Self::Id(id) => id.to_string(),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::Id(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A related table pulled in through its foreign key, e.g. `doctors(name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub relation: Table,
    pub columns: Vec<String>,
}

/// Filtered, ordered select over one table with optional relation expansion.
///
/// ```ignore
/// Query::select(Table::Surgeries)
///     .embed(Table::Doctors, &["name"])
///     .order_asc("surgery_date");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    /// `select=*` over a table.
    pub fn select(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Restrict the base columns. Without this every column is selected.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, relation: Table, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            relation,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    /// Render the select list: `*,doctors(name,specialization)`.
    pub fn select_clause(&self) -> String {
        let mut parts: Vec<String> = if self.columns.is_empty() {
            vec!["*".to_string()]
        } else {
            self.columns.clone()
        };
        for embed in &self.embeds {
            parts.push(format!("{}({})", embed.relation, embed.columns.join(",")));
        }
        parts.join(",")
    }

    /// Render as PostgREST query-string pairs.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        for filter in &self.filters {
            params.push((filter.column.clone(), format!("eq.{}", filter.value.to_param())));
        }
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        params
    }
}
