//! Cursor pagination shared by the inbox and conversation endpoints

use std::collections::HashSet;
use std::future::Future;

use anyhow::Result;

/// Upstream marker for the last page of a timeline.
pub const AT_END: &str = "AT_END";

/// One page of results plus the timeline metadata that decides
/// whether there is another one.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub status: Option<String>,
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn is_at_end(&self) -> bool {
        self.status.as_deref() == Some(AT_END)
    }

    fn next_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Stop when the timeline says so or when there is nothing to follow.
pub fn at_end_or_exhausted<T>(page: &Page<T>) -> bool {
    page.is_at_end() || page.next_cursor().is_none()
}

/// Remembers every cursor followed during one run and stops as soon
/// as the upstream hands back one it has already seen.
#[derive(Debug, Default)]
pub struct CycleGuard {
    seen: HashSet<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_stop<T>(&mut self, page: &Page<T>) -> bool {
        if at_end_or_exhausted(page) {
            return true;
        }
        match page.next_cursor() {
            Some(cursor) => !self.seen.insert(cursor.to_string()),
            None => true,
        }
    }
}

/// Fetch pages until `should_stop` says the last one was terminal.
///
/// `fetch_page` gets the cursor to request (`None` for the first page)
/// and the zero based page number. Items of the terminal page are
/// kept. A page without a cursor always ends the run, whatever the
/// predicate says.
pub async fn paginate<T, F, Fut, S>(mut fetch_page: F, mut should_stop: S) -> Result<Vec<T>>
where
    F: FnMut(Option<String>, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
    S: FnMut(&Page<T>) -> bool,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_number = 0;

    loop {
        let page = fetch_page(cursor.take(), page_number).await?;
        let stop = should_stop(&page);
        let next = page.next_cursor().map(str::to_string);
        tracing::debug!(
            page = page_number,
            items = page.items.len(),
            status = ?page.status,
            stop,
            "Fetched page"
        );
        items.extend(page.items);

        match (stop, next) {
            (false, Some(next)) => cursor = Some(next),
            _ => break,
        }
        page_number += 1;
    }

    Ok(items)
}
