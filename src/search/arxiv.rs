//! arXiv API Client
//!
//! Queries the public arXiv export API (`/api/query`) and parses the Atom feed
//! it returns into [`PaperHit`]s. One HTTP request per search; paging and
//! retries are left to the caller.

use super::{HitLink, IndexError, PaperHit, PaperIndex, SearchQuery};
use crate::config::SearchConfig;
use crate::utils::error_chain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// arXiv export API client
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base: String,
}

impl ArxivClient {
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self, IndexError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexError::Client(error_chain(&e)))?;

        Ok(Self {
            http,
            base: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl PaperIndex for ArxivClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperHit>, IndexError> {
        debug!(query = %query.text, max_results = query.max_results, "Querying arXiv");

        let resp = self
            .http
            .get(&self.base)
            .query(&[
                ("search_query", query.text.as_str()),
                ("sortBy", query.sort_by.as_param()),
                ("sortOrder", query.sort_order.as_param()),
            ])
            .query(&[("start", 0usize), ("max_results", query.max_results)])
            .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
            .send()
            .await
            .map_err(|e| IndexError::Transport(error_chain(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IndexError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IndexError::Transport(error_chain(&e)))?;

        let hits = parse_atom_feed(&body)?;
        debug!(count = hits.len(), "arXiv feed parsed");
        Ok(hits)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    Updated,
    AuthorName,
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    updated: String,
    authors: Vec<String>,
    links: Vec<HitLink>,
    primary_category: String,
    categories: Vec<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Id => &mut self.id,
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::AuthorName => match self.authors.last_mut() {
                Some(name) => name,
                None => return,
            },
        };
        target.push_str(text);
    }

    /// Collect data carried in attributes (links and category terms).
    fn apply_element(&mut self, e: &BytesStart<'_>) -> Result<(), IndexError> {
        match e.local_name().as_ref() {
            b"link" => {
                let mut link = HitLink {
                    href: String::new(),
                    rel: None,
                    title: None,
                    content_type: None,
                };
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| IndexError::Feed(err.to_string()))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|err| IndexError::Feed(err.to_string()))?
                        .into_owned();
                    match attr.key.local_name().as_ref() {
                        b"href" => link.href = value,
                        b"rel" => link.rel = Some(value),
                        b"title" => link.title = Some(value),
                        b"type" => link.content_type = Some(value),
                        _ => {}
                    }
                }
                if !link.href.is_empty() {
                    self.links.push(link);
                }
            }
            b"primary_category" => {
                if let Some(term) = term_attribute(e)? {
                    self.primary_category = term;
                }
            }
            b"category" => {
                if let Some(term) = term_attribute(e)? {
                    self.categories.push(term);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> Result<PaperHit, IndexError> {
        if self.id.contains("/api/errors") {
            let detail = if self.summary.trim().is_empty() {
                self.title
            } else {
                self.summary
            };
            return Err(IndexError::Api(detail.trim().to_string()));
        }

        Ok(PaperHit {
            published: parse_timestamp(&self.published, "published")?,
            updated: parse_timestamp(&self.updated, "updated")?,
            entry_id: self.id.trim().to_string(),
            title: self.title,
            summary: self.summary,
            authors: self.authors,
            links: self.links,
            primary_category: self.primary_category,
            categories: self.categories,
        })
    }
}

fn term_attribute(e: &BytesStart<'_>) -> Result<Option<String>, IndexError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IndexError::Feed(err.to_string()))?;
        if attr.key.local_name().as_ref() == b"term" {
            let value = attr
                .unescape_value()
                .map_err(|err| IndexError::Feed(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, IndexError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IndexError::Feed(format!("invalid {field} timestamp {raw:?}: {e}")))
}

/// Parse an arXiv Atom feed. Entries keep their document order.
pub(crate) fn parse_atom_feed(xml: &str) -> Result<Vec<PaperHit>, IndexError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut hits = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    entry = Some(EntryBuilder::default());
                    field = None;
                }
                b"author" => in_author = true,
                name => {
                    if let Some(current) = entry.as_mut() {
                        field = match name {
                            b"id" => Some(Field::Id),
                            b"title" => Some(Field::Title),
                            b"summary" => Some(Field::Summary),
                            b"published" => Some(Field::Published),
                            b"updated" => Some(Field::Updated),
                            b"name" if in_author => {
                                current.authors.push(String::new());
                                Some(Field::AuthorName)
                            }
                            _ => None,
                        };
                        current.apply_element(&e)?;
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(current) = entry.as_mut() {
                    current.apply_element(&e)?;
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(current), Some(f)) = (entry.as_mut(), field) {
                    let text = t.unescape().map_err(|e| IndexError::Feed(e.to_string()))?;
                    current.push_text(f, &text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        hits.push(done.build()?);
                    }
                    field = None;
                }
                b"author" => in_author = false,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IndexError::Feed(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(hits)
}
