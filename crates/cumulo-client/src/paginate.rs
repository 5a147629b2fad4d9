//! Lazy pagination over object listings.

use std::collections::VecDeque;

use cumulo_model::{ErrorResponse, S3Object, S3Prefix};

use crate::client::S3Client;
use crate::signer::ListObjectsQuery;

/// One entry yielded by a pagination walk.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    /// An object under the listed prefix.
    Object(S3Object),
    /// A folder collapsed by the delimiter.
    Prefix(S3Prefix),
}

/// A lazy walk over every page of an object listing.
///
/// Each pager starts a fresh walk from the first page; it is not reentrant
/// mid-iteration. Pages are fetched on demand while the service reports a
/// continuation token.
#[derive(Debug)]
pub struct ObjectsPager<'a> {
    client: &'a S3Client,
    bucket: String,
    query: ListObjectsQuery,
    use_cache: bool,
    buffered: VecDeque<ListEntry>,
    next_token: Option<String>,
    started: bool,
    finished: bool,
}

impl<'a> ObjectsPager<'a> {
    pub(crate) fn new(
        client: &'a S3Client,
        bucket: impl Into<String>,
        query: ListObjectsQuery,
        use_cache: bool,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            query,
            use_cache,
            buffered: VecDeque::new(),
            next_token: None,
            started: false,
            finished: false,
        }
    }

    /// The next entry, fetching further pages as needed. Returns `None` when
    /// the walk is exhausted; a listing failure ends the walk.
    pub async fn next_entry(&mut self) -> Option<Result<ListEntry, ErrorResponse>> {
        loop {
            if let Some(entry) = self.buffered.pop_front() {
                return Some(Ok(entry));
            }
            if self.finished || (self.started && self.next_token.is_none()) {
                return None;
            }

            let mut query = self.query.clone();
            query.continuation_token = self.next_token.take();
            let page = self
                .client
                .get_objects(&self.bucket, &query, self.use_cache)
                .await;
            self.started = true;

            match page.into_result() {
                Ok(list) => {
                    self.next_token = list.next_continuation_token;
                    if !list.truncated || self.next_token.is_none() {
                        self.finished = true;
                    }
                    self.buffered
                        .extend(list.common_prefixes.into_iter().map(ListEntry::Prefix));
                    self.buffered
                        .extend(list.objects.into_iter().map(ListEntry::Object));
                    if self.buffered.is_empty() && self.finished {
                        return None;
                    }
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }

    /// Drain the walk, collecting objects only (prefixes are skipped).
    pub async fn collect_objects(&mut self) -> Result<Vec<S3Object>, ErrorResponse> {
        let mut objects = Vec::new();
        while let Some(entry) = self.next_entry().await {
            match entry? {
                ListEntry::Object(object) => objects.push(object),
                ListEntry::Prefix(_) => {}
            }
        }
        Ok(objects)
    }
}
