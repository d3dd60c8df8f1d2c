//! Options shared by the whole-document serializers.

use std::ops::RangeInclusive;

/// Options for rendering whole documents.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Which logical pages to include
    pub page_selection: PageSelection,

    /// Emit a complete HTML document instead of a fragment
    pub standalone: bool,

    /// Precede each page's text with a `Page N` line
    pub page_headers: bool,

    /// Collect content statistics alongside the output
    pub collect_stats: bool,
}

impl RenderOptions {
    /// Defaults: every page, HTML fragment, no headers or stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Select a page range (1-indexed, inclusive).
    pub fn with_page_range(mut self, range: RangeInclusive<usize>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Select specific pages (1-indexed).
    pub fn with_page_list(mut self, pages: Vec<usize>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }

    /// Enable or disable standalone HTML output.
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Enable or disable per-page text headers.
    pub fn with_page_headers(mut self, headers: bool) -> Self {
        self.page_headers = headers;
        self
    }

    /// Collect [`ContentStats`](super::ContentStats) alongside the output.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }
}

/// Logical page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<usize>),
    /// Specific pages (1-indexed)
    Pages(Vec<usize>),
}

impl PageSelection {
    /// Check if a 1-indexed page number is selected.
    pub fn includes(&self, page: usize) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a selection such as `all`, `2-4` or `1,3,5-7`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = parse_bounds(start, end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = parse_bounds(start, end)?;
                    pages.extend(start..=end);
                }
                None => pages.push(parse_page(part)?),
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("page numbers start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("invalid page number: {:?}", s.trim())),
    }
}

fn parse_bounds(start: &str, end: &str) -> Result<(usize, usize), String> {
    let start = parse_page(start)?;
    let end = parse_page(end)?;
    if start > end {
        return Err(format!("range {}-{} is reversed", start, end));
    }
    Ok((start, end))
}
