//! The ordered list of report steps and how their outcomes are printed

use anyhow::Result;
use mongodb::bson::{Bson, Document};
use std::io::Write;

use crate::config;
use crate::db::query::{Aggregation, Filter, FindQuery, IndexSpec, SortOrder};
use crate::db::store::{BookStore, UpdateSummary};

/// Values the report queries with
#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    pub genre: String,
    pub published_after: i32,
    pub author: String,
    pub update_title: String,
    pub updated_price: f64,
    pub delete_title: String,
    pub in_stock_published_after: i32,
    pub projected_fields: Vec<String>,
    pub page_size: u64,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            genre: config::GENRE.to_string(),
            published_after: config::PUBLISHED_AFTER,
            author: config::AUTHOR.to_string(),
            update_title: config::UPDATE_TITLE.to_string(),
            updated_price: config::UPDATED_PRICE,
            delete_title: config::DELETE_TITLE.to_string(),
            in_stock_published_after: config::IN_STOCK_PUBLISHED_AFTER,
            projected_fields: config::PROJECTED_FIELDS.iter().map(|f| f.to_string()).collect(),
            page_size: config::PAGE_SIZE,
        }
    }
}

/// One store operation
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Find(FindQuery),
    SetField {
        filter: Filter,
        field: String,
        value: Bson,
    },
    DeleteOne(Filter),
    Aggregate(Aggregation),
    CreateIndex(IndexSpec),
    Explain(Filter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub heading: String,
    pub action: Action,
}

impl Step {
    fn new(heading: impl Into<String>, action: Action) -> Self {
        Self {
            heading: heading.into(),
            action,
        }
    }

    pub async fn run<S: BookStore + ?Sized>(&self, store: &S) -> Result<Outcome> {
        Ok(match &self.action {
            Action::Find(query) => Outcome::Documents(store.find(query).await?),
            Action::SetField {
                filter,
                field,
                value,
            } => Outcome::Updated(store.set_field(filter, field, value.clone()).await?),
            Action::DeleteOne(filter) => Outcome::Deleted(store.delete_one(filter).await?),
            Action::Aggregate(aggregation) => {
                Outcome::Documents(store.aggregate(*aggregation).await?)
            }
            Action::CreateIndex(index) => Outcome::IndexCreated(store.create_index(index).await?),
            Action::Explain(filter) => Outcome::Explained(store.explain(filter).await?),
        })
    }
}

/// What a step produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Documents(Vec<Document>),
    Updated(UpdateSummary),
    Deleted(u64),
    IndexCreated(String),
    Explained(Document),
}

impl Outcome {
    /// Number of documents a read step returned
    pub fn documents_returned(&self) -> usize {
        match self {
            Outcome::Documents(docs) => docs.len(),
            _ => 0,
        }
    }
}

/// The report, in the order it prints
pub fn default_steps(params: &ReportParams) -> Vec<Step> {
    let all = || FindQuery::new(Filter::all());
    let fields: Vec<&str> = params.projected_fields.iter().map(String::as_str).collect();
    let page = params.page_size as i64;
    let title_filter = Filter::all().eq("title", params.update_title.as_str());

    vec![
        // Basic reads and writes
        Step::new(
            format!("Books in {} Genre:", params.genre),
            Action::Find(FindQuery::new(Filter::all().eq("genre", params.genre.as_str()))),
        ),
        Step::new(
            format!("Books published after {}:", params.published_after),
            Action::Find(FindQuery::new(
                Filter::all().gt("published_year", params.published_after),
            )),
        ),
        Step::new(
            format!("Books by {}:", params.author),
            Action::Find(FindQuery::new(Filter::all().eq("author", params.author.as_str()))),
        ),
        Step::new(
            format!("Updated book price for \"{}\".", params.update_title),
            Action::SetField {
                filter: title_filter.clone(),
                field: "price".to_string(),
                value: Bson::Double(params.updated_price),
            },
        ),
        Step::new(
            format!("Deleted \"{}\" from collection.", params.delete_title),
            Action::DeleteOne(Filter::all().eq("title", params.delete_title.as_str())),
        ),
        // Advanced queries
        Step::new(
            format!(
                "Books in stock and published after {}:",
                params.in_stock_published_after
            ),
            Action::Find(FindQuery::new(
                Filter::all()
                    .eq("in_stock", true)
                    .gt("published_year", params.in_stock_published_after),
            )),
        ),
        Step::new(
            format!("Projection - {}:", title_case(&fields).join(", ")),
            Action::Find(all().project(&fields)),
        ),
        Step::new(
            "Books sorted by price (Ascending):",
            Action::Find(all().sort_by("price", SortOrder::Ascending)),
        ),
        Step::new(
            "Books sorted by price (Descending):",
            Action::Find(all().sort_by("price", SortOrder::Descending)),
        ),
        Step::new(
            format!("Pagination - First {} books:", page),
            Action::Find(all().limit(page)),
        ),
        Step::new(
            format!("Pagination - Next {} books:", page),
            Action::Find(all().skip(params.page_size).limit(page)),
        ),
        // Aggregations
        Step::new(
            "Average price by genre:",
            Action::Aggregate(Aggregation::AveragePriceByGenre),
        ),
        Step::new(
            "Author with the most books:",
            Action::Aggregate(Aggregation::TopAuthor),
        ),
        Step::new(
            "Books grouped by publication decade:",
            Action::Aggregate(Aggregation::CountByDecade),
        ),
        // Indexes
        Step::new(
            "Index on title created.",
            Action::CreateIndex(IndexSpec::on("title", SortOrder::Ascending)),
        ),
        Step::new(
            "Compound index on author and published year created.",
            Action::CreateIndex(
                IndexSpec::on("author", SortOrder::Ascending)
                    .then("published_year", SortOrder::Descending),
            ),
        ),
        Step::new(
            "Index performance with explain():",
            Action::Explain(title_filter),
        ),
    ]
}

fn title_case(fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .map(|f| {
            let mut chars = f.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Write a step's heading and outcome
pub fn render(out: &mut dyn Write, step: &Step, outcome: &Outcome) -> Result<()> {
    writeln!(out)?;
    match outcome {
        Outcome::Documents(docs) => {
            writeln!(out, "{}", step.heading)?;
            let docs = Bson::Array(docs.iter().cloned().map(Bson::Document).collect());
            writeln!(out, "{}", to_json(docs)?)?;
        }
        Outcome::Updated(summary) => writeln!(
            out,
            "{} (matched {}, modified {})",
            step.heading, summary.matched, summary.modified
        )?,
        Outcome::Deleted(count) => writeln!(out, "{} (deleted {})", step.heading, count)?,
        Outcome::IndexCreated(name) => writeln!(out, "{} ({})", step.heading, name)?,
        Outcome::Explained(plan) => {
            writeln!(out, "{}", step.heading)?;
            writeln!(out, "{}", to_json(Bson::Document(plan.clone()))?)?;
        }
    }
    Ok(())
}

fn to_json(value: impl Into<Bson>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&value.into().into_relaxed_extjson())?)
}
