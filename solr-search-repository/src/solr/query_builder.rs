//! Translation of search queries into Solr request parameters.
//!
//! The builders only produce the [`SolrRequest`]; alter hooks are applied by
//! the backend afterwards.

use solr_search_shared::{
    Condition, ConditionGroup, ConditionItem, Conjunction, FacetRequest, FieldValue,
    MultiIndexQuery, Operator, SearchQuery, Sort, RELEVANCE_FIELD,
};

use crate::errors::SearchBackendError;
use crate::solr::data_types::DataTypeRegistry;
use crate::solr::document_builder::format_date;
use crate::solr::escape::{escape_keys, phrase};
use crate::solr::field_mapping::{IndexFieldNames, SOLR_SCORE_FIELD};
use crate::solr::request::SolrRequest;
use crate::types::Index;

/// Rows returned when the query sets no limit.
pub const DEFAULT_ROWS: usize = 10;

/// Query matching every document.
const MATCH_ALL: &str = "*:*";

/// Resolves index field names against one or more indexes.
struct FieldResolver<'a> {
    indexes: Vec<(&'a Index, &'a IndexFieldNames)>,
}

impl<'a> FieldResolver<'a> {
    /// Distinct Solr fields an index field is stored in across the indexes.
    fn filter_fields(&self, field: &str) -> Result<Vec<&'a str>, SearchBackendError> {
        let mut fields = Vec::new();
        for &(_, names) in &self.indexes {
            if let Some(solr) = names.field(field) {
                if !fields.contains(&solr) {
                    fields.push(solr);
                }
            }
        }
        if fields.is_empty() {
            return Err(self.unknown_field(field));
        }
        Ok(fields)
    }

    fn sort_field(&self, field: &str) -> Result<&'a str, SearchBackendError> {
        if field == RELEVANCE_FIELD {
            return Ok(SOLR_SCORE_FIELD);
        }
        self.indexes
            .iter()
            .find_map(|&(_, names)| names.single_value_field(field))
            .ok_or_else(|| self.unknown_field(field))
    }

    /// Fulltext fields with their boosts, e.g. `tm_name^5`.
    fn fulltext_fields(
        &self,
        registry: &DataTypeRegistry,
        restrict: Option<&[String]>,
    ) -> Result<Vec<String>, SearchBackendError> {
        if let Some(restrict) = restrict {
            for field in restrict {
                let known = self.indexes.iter().any(|(index, _)| {
                    index
                        .field(field)
                        .is_some_and(|config| registry.is_fulltext(&config.type_id))
                });
                if !known {
                    return Err(SearchBackendError::validation(format!(
                        "Field {} is not a fulltext field",
                        field
                    )));
                }
            }
        }

        let mut fields = Vec::new();
        for (index, names) in &self.indexes {
            for (key, config) in &index.fields {
                if !registry.is_fulltext(&config.type_id) {
                    continue;
                }
                if restrict.is_some_and(|r| !r.contains(key)) {
                    continue;
                }
                let Some(solr) = names.field(key) else {
                    continue;
                };
                let entry = if (config.boost - 1.0).abs() > f64::EPSILON {
                    format!("{}^{}", solr, config.boost)
                } else {
                    solr.to_string()
                };
                if !fields.contains(&entry) {
                    fields.push(entry);
                }
            }
        }
        Ok(fields)
    }

    fn unknown_field(&self, field: &str) -> SearchBackendError {
        let ids: Vec<&str> = self.indexes.iter().map(|(index, _)| index.id.as_str()).collect();
        SearchBackendError::validation(format!(
            "Unknown field {} for index {}",
            field,
            ids.join(", ")
        ))
    }
}

/// Build the request for a search on one index.
///
/// # Errors
///
/// Returns a validation error for unknown fields in conditions, sorts or
/// facets, and for keyword searches on an index without fulltext fields.
pub fn build_search_request(
    index: &Index,
    names: &IndexFieldNames,
    registry: &DataTypeRegistry,
    site_hash: &str,
    query: &SearchQuery,
) -> Result<SolrRequest, SearchBackendError> {
    let resolver = FieldResolver {
        indexes: vec![(index, names)],
    };

    let mut request = base_request(
        &resolver,
        registry,
        query.effective_keys(),
        query.fulltext_fields.as_deref(),
    )?;
    request.add_param("fq", format!("index_id:{}", phrase(&index.id)));
    request.add_param("fq", format!("hash:{}", phrase(site_hash)));
    add_conditions(&mut request, &resolver, &query.conditions)?;
    add_sorts(&mut request, &resolver, &query.sorts)?;
    add_range(&mut request, query.offset, query.limit);
    request.set_param("fl", "item_id,score");
    request.set_param("wt", "json");
    add_facets(&mut request, names, &query.facets)?;

    request.choose_method();
    Ok(request)
}

/// Build the request for a search across several indexes.
pub fn build_multi_search_request(
    indexes: &[(&Index, &IndexFieldNames)],
    registry: &DataTypeRegistry,
    site_hash: &str,
    query: &MultiIndexQuery,
) -> Result<SolrRequest, SearchBackendError> {
    let resolver = FieldResolver {
        indexes: indexes.to_vec(),
    };

    let mut request = base_request(
        &resolver,
        registry,
        query.effective_keys(),
        query.fulltext_fields.as_deref(),
    )?;
    let index_filter = indexes
        .iter()
        .map(|(index, _)| phrase(&index.id))
        .collect::<Vec<_>>()
        .join(" OR ");
    request.add_param("fq", format!("index_id:({})", index_filter));
    request.add_param("fq", format!("hash:{}", phrase(site_hash)));
    add_conditions(&mut request, &resolver, &query.conditions)?;
    add_sorts(&mut request, &resolver, &query.sorts)?;
    add_range(&mut request, query.offset, query.limit);
    request.set_param("fl", "item_id,index_id,score");
    request.set_param("wt", "json");

    request.choose_method();
    Ok(request)
}

fn base_request(
    resolver: &FieldResolver<'_>,
    registry: &DataTypeRegistry,
    keys: Option<&str>,
    fulltext_fields: Option<&[String]>,
) -> Result<SolrRequest, SearchBackendError> {
    let Some(keys) = keys else {
        return Ok(SolrRequest::new(MATCH_ALL));
    };

    let fields = resolver.fulltext_fields(registry, fulltext_fields)?;
    if fields.is_empty() {
        return Err(SearchBackendError::validation(
            "Keyword search requires at least one fulltext field",
        ));
    }

    let mut request = SolrRequest::new(escape_keys(keys));
    request.set_param("defType", "edismax");
    request.set_param("q.op", "AND");
    request.set_param("qf", fields.join(" "));
    Ok(request)
}

/// Render a value for use in a filter query.
fn filter_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) | FieldValue::String(s) => phrase(s),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Decimal(d) => d.to_string(),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Date(date) => phrase(&format_date(date)),
    }
}

fn field_condition(field: &str, condition: &Condition) -> Result<String, SearchBackendError> {
    let value = condition.value.as_ref().map(filter_value);
    let query = match (condition.operator, value) {
        (Operator::Equal, None) => format!("(*:* -{}:[* TO *])", field),
        (Operator::NotEqual, None) => format!("{}:[* TO *]", field),
        (Operator::Equal, Some(v)) => format!("{}:{}", field, v),
        (Operator::NotEqual, Some(v)) => format!("(*:* -{}:{})", field, v),
        (Operator::LessThan, Some(v)) => format!("{}:[* TO {}}}", field, v),
        (Operator::LessThanOrEqual, Some(v)) => format!("{}:[* TO {}]", field, v),
        (Operator::GreaterThan, Some(v)) => format!("{}:{{{} TO *]", field, v),
        (Operator::GreaterThanOrEqual, Some(v)) => format!("{}:[{} TO *]", field, v),
        (operator, None) => {
            return Err(SearchBackendError::validation(format!(
                "Operator {:?} on field {} requires a value",
                operator, condition.field
            )))
        }
    };
    Ok(query)
}

fn condition_query(
    resolver: &FieldResolver<'_>,
    condition: &Condition,
) -> Result<String, SearchBackendError> {
    let parts = resolver
        .filter_fields(&condition.field)?
        .into_iter()
        .map(|field| field_condition(field, condition))
        .collect::<Result<Vec<_>, _>>()?;

    if parts.len() == 1 {
        Ok(parts.into_iter().next().unwrap_or_default())
    } else {
        Ok(format!("({})", parts.join(" OR ")))
    }
}

fn conjunction_str(conjunction: Conjunction) -> &'static str {
    match conjunction {
        Conjunction::And => " AND ",
        Conjunction::Or => " OR ",
    }
}

/// Queries of the members of a group, empty nested groups left out.
fn group_parts(
    resolver: &FieldResolver<'_>,
    group: &ConditionGroup,
) -> Result<Vec<String>, SearchBackendError> {
    let mut parts = Vec::new();
    for item in &group.conditions {
        match item {
            ConditionItem::Condition(condition) => parts.push(condition_query(resolver, condition)?),
            ConditionItem::Group(nested) => {
                let nested_parts = group_parts(resolver, nested)?;
                match nested_parts.len() {
                    0 => {}
                    1 => parts.extend(nested_parts),
                    _ => parts.push(format!(
                        "({})",
                        nested_parts.join(conjunction_str(nested.conjunction))
                    )),
                }
            }
        }
    }
    Ok(parts)
}

/// Add filter queries. Members of a top-level AND group become separate
/// `fq` parameters so Solr can cache them individually.
fn add_conditions(
    request: &mut SolrRequest,
    resolver: &FieldResolver<'_>,
    conditions: &ConditionGroup,
) -> Result<(), SearchBackendError> {
    let parts = group_parts(resolver, conditions)?;
    if parts.is_empty() {
        return Ok(());
    }

    match conditions.conjunction {
        Conjunction::And => {
            for part in parts {
                request.add_param("fq", part);
            }
        }
        Conjunction::Or => {
            request.add_param("fq", parts.join(conjunction_str(Conjunction::Or)));
        }
    }
    Ok(())
}

fn add_sorts(
    request: &mut SolrRequest,
    resolver: &FieldResolver<'_>,
    sorts: &[Sort],
) -> Result<(), SearchBackendError> {
    if sorts.is_empty() {
        return Ok(());
    }

    let mut clauses = Vec::with_capacity(sorts.len());
    for sort in sorts {
        let field = resolver.sort_field(&sort.field)?;
        clauses.push(format!("{} {}", field, sort.direction.as_str()));
    }
    request.set_param("sort", clauses.join(", "));
    Ok(())
}

fn add_range(request: &mut SolrRequest, offset: usize, limit: Option<usize>) {
    request.set_param("start", offset.to_string());
    request.set_param("rows", limit.unwrap_or(DEFAULT_ROWS).to_string());
}

fn add_facets(
    request: &mut SolrRequest,
    names: &IndexFieldNames,
    facets: &[FacetRequest],
) -> Result<(), SearchBackendError> {
    if facets.is_empty() {
        return Ok(());
    }

    request.set_param("facet", "true");
    request.set_param("facet.sort", "count");
    for facet in facets {
        let field = names.field(&facet.field).ok_or_else(|| {
            SearchBackendError::validation(format!("Unknown facet field {}", facet.field))
        })?;
        request.add_param("facet.field", field);
        if let Some(limit) = facet.limit {
            request.set_param(format!("f.{}.facet.limit", field), limit.to_string());
        }
        request.set_param(
            format!("f.{}.facet.mincount", field),
            facet.min_count.to_string(),
        );
    }
    Ok(())
}
