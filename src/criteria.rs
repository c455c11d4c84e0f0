// Search criteria assembly: user options filtered to non-empty service
// parameters, with human names translated to service ids.
use tracing::debug;

use crate::cli::RiaOpts;
use crate::model::{CriteriaError, ReferenceTable};
use crate::reference::ReferenceTables;

/// Ordered `(name, value)` query parameters. Never contains an empty value;
/// meta options (verbosity, the aux-command selector) are never added.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    params: Vec<(String, String)>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter unless its rendered value is empty.
    pub fn push(&mut self, name: &str, value: impl ToString) {
        let value = value.to_string();
        if !value.is_empty() {
            self.params.push((name.to_string(), value));
        }
    }

    pub fn push_opt<T: ToString>(&mut self, name: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

pub const DEFAULT_SORT: &str = "price-up";
pub const DEFAULT_STATUS: &str = "sale";
pub const DEFAULT_DAMAGE: &str = "no";

/// Listing period selector -> service code.
pub fn period_code(name: &str) -> Option<u32> {
    Some(match name {
        "1" => 1,
        "3" => 8,
        "6" => 9,
        "12" => 14,
        "today" => 2,
        "24" => 11,
        "48" => 10,
        "72" => 3,
        "week" => 4,
        "month" => 5,
        "quarter" => 6,
        _ => return None,
    })
}

/// Sort order selector -> service code.
pub fn sort_code(name: &str) -> Option<u32> {
    Some(match name {
        "price-up" => 2,
        "price-down" => 3,
        "date" => 7,
        "prod-year-up" => 6,
        "prod-year-down" => 5,
        "mileage-up" => 13,
        "mileage-down" => 12,
        _ => return None,
    })
}

/// Sale status selector -> service code.
pub fn status_code(name: &str) -> Option<u32> {
    Some(match name {
        "all" => 0,
        "sold" => 1,
        "sale" => 2,
        _ => return None,
    })
}

/// Damage selector -> service code.
pub fn damage_code(name: &str) -> Option<u32> {
    Some(match name {
        "no" => 1,
        "yes" => 2,
        "all" => 0,
        _ => return None,
    })
}

pub fn resolve_make(name: &str, makes: &ReferenceTable) -> Result<i64, CriteriaError> {
    let id = makes
        .id_of(name)
        .ok_or_else(|| unknown_name("make", name, makes))?;
    debug!("'{}' id: {}", name, id);
    Ok(id)
}

pub fn resolve_model(name: &str, models: &ReferenceTable) -> Result<i64, CriteriaError> {
    let id = models
        .id_of(name)
        .ok_or_else(|| unknown_name("model", name, models))?;
    debug!("'{}' id: {}", name, id);
    Ok(id)
}

/// Build the search criteria from resolved options. Parameter names follow
/// the service's query surface; insertion order matches the option order of
/// the CLI.
pub fn build(
    opts: &RiaOpts,
    tables: &ReferenceTables,
    make_id: i64,
    model_id: Option<i64>,
) -> Result<SearchCriteria, CriteriaError> {
    let mut criteria = SearchCriteria::new();

    criteria.push("marka_id", make_id);
    criteria.push_opt("model_id", model_id);
    if let Some(body) = &opts.body {
        criteria.push("bodystyle", lookup("body style", body, &tables.bodies)?);
    }
    criteria.push_opt("s_yers", opts.year_start);
    criteria.push_opt("po_yers", opts.year_end);
    criteria.push_opt("engineVolumeFrom", opts.capacity_from);
    criteria.push_opt("engineVolumeTo", opts.capacity_to);
    if let Some(gearbox) = &opts.gearbox {
        criteria.push("gearbox", lookup("gearbox", gearbox, &tables.gearboxes)?);
    }
    if let Some(fuel) = &opts.fuel {
        criteria.push("type", lookup("fuel type", fuel, &tables.fuel_types)?);
    }
    if let Some(color) = &opts.color {
        criteria.push("color", lookup("color", color, &tables.colors)?);
    }
    if let Some(country) = &opts.country {
        criteria.push("brandOrigin", lookup("country", country, &tables.countries)?);
    }
    if let Some(options) = &opts.options {
        criteria.push("auto_options", lookup("option", options, &tables.options)?);
    }
    if let Some(period) = &opts.period {
        let code = period_code(period).ok_or_else(|| code_unknown("period", period))?;
        criteria.push("top", code);
    }

    let sort = opts.sort.as_deref().unwrap_or(DEFAULT_SORT);
    let sort = sort_code(sort).ok_or_else(|| code_unknown("sort", sort))?;
    criteria.push("order_by", sort);

    let status = opts.status.as_deref().unwrap_or(DEFAULT_STATUS);
    let status = status_code(status).ok_or_else(|| code_unknown("status", status))?;
    criteria.push("saledParam", status);

    let damage = opts.damage.as_deref().unwrap_or(DEFAULT_DAMAGE);
    let damage = damage_code(damage).ok_or_else(|| code_unknown("damage", damage))?;
    criteria.push("damage", damage);

    Ok(criteria)
}

/// Criteria subset accepted by the average-price endpoint.
pub fn build_average_price(
    opts: &RiaOpts,
    tables: &ReferenceTables,
    make_id: Option<i64>,
    model_id: Option<i64>,
) -> Result<SearchCriteria, CriteriaError> {
    let mut criteria = SearchCriteria::new();

    criteria.push_opt("marka_id", make_id);
    criteria.push_opt("model_id", model_id);
    if let Some(gearbox) = &opts.gearbox {
        criteria.push("gear_id", lookup("gearbox", gearbox, &tables.gearboxes)?);
    }
    criteria.push_opt("yers", opts.year_start);
    if let Some(fuel) = &opts.fuel {
        criteria.push("fuel_id", lookup("fuel type", fuel, &tables.fuel_types)?);
    }

    Ok(criteria)
}

fn lookup(kind: &'static str, name: &str, table: &ReferenceTable) -> Result<i64, CriteriaError> {
    table
        .id_of(name)
        .ok_or_else(|| unknown_name(kind, name, table))
}

fn unknown_name(kind: &'static str, name: &str, table: &ReferenceTable) -> CriteriaError {
    CriteriaError::UnknownName {
        kind,
        name: name.to_string(),
        known: table.names().iter().map(|n| n.to_string()).collect(),
    }
}

fn code_unknown(kind: &'static str, name: &str) -> CriteriaError {
    CriteriaError::UnknownName {
        kind,
        name: name.to_string(),
        known: Vec::new(),
    }
}
