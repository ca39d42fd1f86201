//! Generic pagination driver.
//!
//! A [`PagedFetcher`] repeatedly sends one request through a [`Transport`],
//! pulls a page of items and an optional continuation [`Cursor`] out of each
//! response, and yields the pages lazily until its [`StopPolicy`] says the
//! sequence is over.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{Error, Result, TransportError};

/// Continuation token used to request the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    Token(String),
    Number(u64),
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Token(t) => f.write_str(t),
            Cursor::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Cursor::Token(value.to_string())
    }
}

impl From<u64> for Cursor {
    fn from(value: u64) -> Self {
        Cursor::Number(value)
    }
}

/// A request whose pagination field can be overwritten between iterations.
pub trait PageRequest {
    /// Overwrites the page number or cursor the next call will send.
    fn set_cursor(&mut self, cursor: &Cursor);

    /// Page size the request asks the server for, if it carries one.
    fn page_size(&self) -> Option<usize> {
        None
    }
}

/// Performs one request/response exchange.
pub trait Transport<R> {
    type Response;

    fn fetch(&self, request: &R) -> Result<Self::Response, TransportError>;
}

impl<R, T: Transport<R> + ?Sized> Transport<R> for &T {
    type Response = T::Response;

    fn fetch(&self, request: &R) -> Result<Self::Response, TransportError> {
        (**self).fetch(request)
    }
}

/// When a paged sequence ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Stop after a page holding fewer than `page_size` items. Without an
    /// extracted cursor the page number is advanced from `first_page`.
    ShortPage { page_size: usize, first_page: u64 },
    /// Stop on an empty page or a missing cursor.
    CursorExhausted,
}

impl StopPolicy {
    pub fn short_page(page_size: usize) -> Self {
        StopPolicy::ShortPage {
            page_size,
            first_page: 1,
        }
    }
}

fn validate(policy: StopPolicy) -> Result<()> {
    match policy {
        StopPolicy::ShortPage { page_size: 0, .. } => Err(Error::Configuration(
            "page size must be greater than zero".to_string(),
        )),
        _ => Ok(()),
    }
}

type ItemsFn<'a, Resp, T> = Box<dyn FnMut(&Resp) -> Result<Vec<T>> + 'a>;
type CursorFn<'a, Resp> = Box<dyn FnMut(&Resp) -> Result<Option<Cursor>> + 'a>;

/// Lazy, finite, non-restartable sequence of pages.
///
/// Each call to [`Iterator::next`] issues exactly one request. A transport or
/// extraction error is yielded once and ends the sequence.
pub struct PagedFetcher<'a, R, Tr, T>
where
    Tr: Transport<R>,
{
    request: R,
    transport: Tr,
    extract_items: ItemsFn<'a, Tr::Response, T>,
    extract_cursor: Option<CursorFn<'a, Tr::Response>>,
    policy: StopPolicy,
    page_number: u64,
    requests: usize,
    done: bool,
}

impl<'a, R, Tr, T> PagedFetcher<'a, R, Tr, T>
where
    R: PageRequest,
    Tr: Transport<R>,
{
    pub fn new<FI, FC>(
        request: R,
        transport: Tr,
        extract_items: FI,
        extract_cursor: FC,
        policy: StopPolicy,
    ) -> Result<Self>
    where
        FI: FnMut(&Tr::Response) -> Result<Vec<T>> + 'a,
        FC: FnMut(&Tr::Response) -> Result<Option<Cursor>> + 'a,
    {
        validate(policy)?;
        Ok(Self::build(
            request,
            transport,
            Box::new(extract_items),
            Some(Box::new(extract_cursor)),
            policy,
        ))
    }

    fn build(
        mut request: R,
        transport: Tr,
        extract_items: ItemsFn<'a, Tr::Response, T>,
        extract_cursor: Option<CursorFn<'a, Tr::Response>>,
        policy: StopPolicy,
    ) -> Self {
        let page_number = match policy {
            StopPolicy::ShortPage { first_page, .. } => {
                request.set_cursor(&Cursor::Number(first_page));
                first_page
            }
            StopPolicy::CursorExhausted => 0,
        };
        Self {
            request,
            transport,
            extract_items,
            extract_cursor,
            policy,
            page_number,
            requests: 0,
            done: false,
        }
    }

    /// Page-numbered fetcher using the page size carried by `request`.
    ///
    /// The first page number is written into the request before the first
    /// call.
    pub fn short_page<FI>(request: R, transport: Tr, extract_items: FI) -> Result<Self>
    where
        FI: FnMut(&Tr::Response) -> Result<Vec<T>> + 'a,
    {
        let page_size = request.page_size().ok_or_else(|| {
            Error::Configuration("short-page pagination needs a page size".to_string())
        })?;
        let policy = StopPolicy::short_page(page_size);
        validate(policy)?;
        Ok(Self::build(
            request,
            transport,
            Box::new(extract_items),
            None,
            policy,
        ))
    }

    /// Cursor-following fetcher.
    pub fn cursor<FI, FC>(request: R, transport: Tr, extract_items: FI, extract_cursor: FC) -> Self
    where
        FI: FnMut(&Tr::Response) -> Result<Vec<T>> + 'a,
        FC: FnMut(&Tr::Response) -> Result<Option<Cursor>> + 'a,
    {
        Self::build(
            request,
            transport,
            Box::new(extract_items),
            Some(Box::new(extract_cursor)),
            StopPolicy::CursorExhausted,
        )
    }

    pub fn policy(&self) -> StopPolicy {
        self.policy
    }

    /// Number of requests sent so far.
    pub fn requests_issued(&self) -> usize {
        self.requests
    }

    pub fn request(&self) -> &R {
        &self.request
    }

    pub fn into_request(self) -> R {
        self.request
    }

    /// Drains every page into one vector, stopping at the first error.
    pub fn collect_all(self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in self {
            all.extend(page?);
        }
        Ok(all)
    }

    fn fail(&mut self, err: Error) -> Option<Result<Vec<T>>> {
        self.done = true;
        Some(Err(err))
    }

    fn extracted_cursor(&mut self, response: &Tr::Response) -> Result<Option<Cursor>> {
        match self.extract_cursor.as_mut() {
            Some(extract) => extract(response),
            None => Ok(None),
        }
    }

    // Returns the cursor for the next request, or None when the sequence ends.
    fn next_cursor(&mut self, page_len: usize, response: &Tr::Response) -> Result<Option<Cursor>> {
        match self.policy {
            StopPolicy::ShortPage { page_size, .. } => {
                if page_len < page_size {
                    info!(
                        requests = self.requests,
                        page_len, page_size, "reached last page (short page)"
                    );
                    return Ok(None);
                }
                self.page_number += 1;
                let cursor = self.extracted_cursor(response)?;
                Ok(Some(cursor.unwrap_or(Cursor::Number(self.page_number))))
            }
            StopPolicy::CursorExhausted => {
                if page_len == 0 {
                    info!(requests = self.requests, "reached last page (empty page)");
                    return Ok(None);
                }
                let cursor = self.extracted_cursor(response)?;
                if cursor.is_none() {
                    info!(requests = self.requests, "reached last page (no cursor)");
                }
                Ok(cursor)
            }
        }
    }
}

impl<R, Tr, T> Iterator for PagedFetcher<'_, R, Tr, T>
where
    R: PageRequest,
    Tr: Transport<R>,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.requests += 1;
        let response = match self.transport.fetch(&self.request) {
            Ok(r) => r,
            Err(e) => {
                warn!(requests = self.requests, error = %e, "page request failed");
                return self.fail(e.into());
            }
        };

        let page = match (self.extract_items)(&response) {
            Ok(p) => p,
            Err(e) => return self.fail(e),
        };
        debug!(request = self.requests, items = page.len(), "received page");

        match self.next_cursor(page.len(), &response) {
            Ok(Some(cursor)) => {
                debug!(%cursor, "advancing to next page");
                self.request.set_cursor(&cursor);
            }
            Ok(None) => self.done = true,
            Err(e) => return self.fail(e),
        }

        Some(Ok(page))
    }
}

impl<R, Tr, T> std::iter::FusedIterator for PagedFetcher<'_, R, Tr, T>
where
    R: PageRequest,
    Tr: Transport<R>,
{
}
