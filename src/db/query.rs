//! Typed descriptions of the reads, aggregations and indexes the report issues
//!
//! Each type lowers to the BSON the server expects. Keeping them typed lets
//! the in-memory test store evaluate the same queries the driver sends.

use mongodb::bson::{Bson, Document, doc};
use mongodb::options::FindOptions;

/// Sort or index key direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// A single field predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Bson),
    Gt(Bson),
}

/// A conjunction of field predicates. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.clauses
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn gt(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.clauses
            .push((field.to_string(), Condition::Gt(value.into())));
        self
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        for (field, condition) in &self.clauses {
            let value = match condition {
                Condition::Eq(v) => v.clone(),
                Condition::Gt(v) => Bson::Document(doc! { "$gt": v.clone() }),
            };
            filter.insert(field.clone(), value);
        }
        filter
    }
}

/// Update modifier that sets a single field, `{ $set: { field: value } }`
pub fn set_document(field: &str, value: Bson) -> Document {
    let mut set = Document::new();
    set.insert(field, value);
    doc! { "$set": set }
}

/// `explain` command for a find on `collection`, reporting execution statistics
pub fn explain_command(collection: &str, filter: &Filter) -> Document {
    doc! {
        "explain": { "find": collection, "filter": filter.to_document() },
        "verbosity": "executionStats",
    }
}

/// A find with optional projection, sort and paging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub projection: Option<Vec<String>>,
    pub sort: Option<(String, SortOrder)>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.projection = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_string(), order));
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn projection_document(&self) -> Option<Document> {
        self.projection.as_ref().map(|fields| {
            fields
                .iter()
                .map(|f| (f.clone(), Bson::Int32(1)))
                .collect::<Document>()
        })
    }

    pub fn sort_document(&self) -> Option<Document> {
        self.sort.as_ref().map(|(field, order)| {
            let mut sort = Document::new();
            sort.insert(field.clone(), order.direction());
            sort
        })
    }

    /// Driver options carrying the projection, sort and paging
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.projection = self.projection_document();
        options.sort = self.sort_document();
        options.skip = self.skip;
        options.limit = self.limit;
        options
    }
}

/// The fixed aggregations in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// `{ _id: genre, avg_price }` per genre
    AveragePriceByGenre,
    /// The single `{ _id: author, count }` with the most books
    TopAuthor,
    /// `{ _id: decade, count }` ascending by decade, where decade is `floor(year / 10)`
    CountByDecade,
}

impl Aggregation {
    pub fn pipeline(self) -> Vec<Document> {
        match self {
            Aggregation::AveragePriceByGenre => vec![doc! {
                "$group": { "_id": "$genre", "avg_price": { "$avg": "$price" } }
            }],
            Aggregation::TopAuthor => vec![
                doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
                doc! { "$limit": 1 },
            ],
            Aggregation::CountByDecade => vec![
                doc! { "$project": {
                    "decade": { "$toInt": { "$floor": { "$divide": ["$published_year", 10] } } }
                } },
                doc! { "$group": { "_id": "$decade", "count": { "$sum": 1 } } },
                doc! { "$sort": { "_id": 1 } },
            ],
        }
    }
}

/// Decade bucket for a publication year, `floor(year / 10)`
#[cfg_attr(not(test), allow(dead_code))]
pub fn decade_of(year: i64) -> i64 {
    year.div_euclid(10)
}

/// Keys of a single or compound index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(String, SortOrder)>,
}

impl IndexSpec {
    pub fn on(field: &str, order: SortOrder) -> Self {
        Self {
            keys: vec![(field.to_string(), order)],
        }
    }

    pub fn then(mut self, field: &str, order: SortOrder) -> Self {
        self.keys.push((field.to_string(), order));
        self
    }

    pub fn keys_document(&self) -> Document {
        self.keys
            .iter()
            .map(|(field, order)| (field.clone(), Bson::Int32(order.direction())))
            .collect()
    }

    /// The name the server assigns when none is given, e.g. `author_1_published_year_-1`
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn default_name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| format!("{}_{}", field, order.direction()))
            .collect::<Vec<_>>()
            .join("_")
    }
}
