// ============================
// confmock-backend-lib/src/pagination.rs
// ============================
//! Deterministic windowing of ordered result sets.
//!
//! Tokens are the literal next start offset in decimal, so pagination
//! is resumable: a client can walk a list purely on `next_page_token`
//! without tracking `page_number` itself. The empty string means no
//! further pages.

/// Vendor defaults for list endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 30;
pub const MAX_PAGE_SIZE: usize = 300;

/// Raw paging inputs as they arrive on the query string.
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
    pub next_page_token: String,
}

impl PageParams {
    pub fn new(page_size: Option<i64>, page_number: Option<i64>, token: impl Into<String>) -> Self {
        Self {
            page_size,
            page_number,
            next_page_token: token.into(),
        }
    }
}

/// One resolved window over a result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_size: usize,
    pub page_number: usize,
    pub page_count: usize,
    pub total_records: usize,
    pub next_page_token: String,
}

/// Slice `items` with the vendor clamps: `page_size` in
/// `[1, MAX_PAGE_SIZE]` (default 30), `page_number >= 1`. An inbound
/// token that parses as an offset overrides `page_number`.
pub fn paginate<T: Clone>(items: &[T], params: &PageParams) -> Page<T> {
    paginate_with(items, params, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
}

/// Same contract with caller-chosen defaults (chat uses 50/200).
pub fn paginate_with<T: Clone>(
    items: &[T],
    params: &PageParams,
    default_size: usize,
    max_size: usize,
) -> Page<T> {
    let page_size = params
        .page_size
        .map_or(default_size, |n| n.max(1) as usize)
        .min(max_size);
    let start = params
        .next_page_token
        .parse::<usize>()
        .ok()
        .unwrap_or_else(|| {
            let page_number = params.page_number.map_or(1, |n| n.max(1)) as usize;
            (page_number - 1) * page_size
        });

    let total_records = items.len();
    let end = (start + page_size).min(total_records);
    let window = if start < total_records {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    let has_more = start + page_size < total_records;
    Page {
        items: window,
        page_size,
        page_number: start / page_size + 1,
        page_count: total_records.div_ceil(page_size).max(1),
        total_records,
        next_page_token: if has_more {
            (start + page_size).to_string()
        } else {
            String::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(size: i64, number: i64) -> PageParams {
        PageParams::new(Some(size), Some(number), "")
    }

    #[test]
    fn test_basic_window() {
        let items: Vec<u32> = (0..10).collect();
        let page = paginate(&items, &params(3, 2));
        assert_eq!(page.items, vec![3, 4, 5]);
        assert_eq!(page.total_records, 10);
        assert_eq!(page.page_count, 4);
        assert_eq!(page.next_page_token, "6");
    }

    #[test]
    fn test_pages_cover_sequence_without_gaps() {
        let items: Vec<u32> = (0..23).collect();
        for page_size in [1usize, 4, 7, 23, 30] {
            let mut collected = Vec::new();
            let mut token = String::new();
            loop {
                let page = paginate(
                    &items,
                    &PageParams::new(Some(page_size as i64), None, token.clone()),
                );
                collected.extend(page.items);
                if page.next_page_token.is_empty() {
                    break;
                }
                token = page.next_page_token;
            }
            assert_eq!(collected, items, "page_size {page_size}");
        }
    }

    #[test]
    fn test_determinism() {
        let items: Vec<u32> = (0..50).collect();
        let first = paginate(&items, &params(7, 3));
        let second = paginate(&items, &params(7, 3));
        assert_eq!(first.items, second.items);
        assert_eq!(first.next_page_token, second.next_page_token);
    }

    #[test]
    fn test_clamping() {
        let items: Vec<u32> = (0..5).collect();

        // page_size clamped up to 1
        let page = paginate(&items, &params(0, 1));
        assert_eq!(page.page_size, 1);

        // page_size clamped down to the max
        let page = paginate(&items, &params(1000, 1));
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        // page_number below 1 behaves as 1
        let page = paginate(&items, &params(2, -3));
        assert_eq!(page.items, vec![0, 1]);
        assert_eq!(page.page_number, 1);
    }

    #[test]
    fn test_token_overrides_page_number() {
        let items: Vec<u32> = (0..10).collect();
        let page = paginate(&items, &PageParams::new(Some(4), Some(1), "8"));
        assert_eq!(page.items, vec![8, 9]);
        assert_eq!(page.next_page_token, "");
    }

    #[test]
    fn test_window_past_end_is_empty() {
        let items: Vec<u32> = (0..4).collect();
        let page = paginate(&items, &params(10, 5));
        assert!(page.items.is_empty());
        assert_eq!(page.total_records, 4);
        assert_eq!(page.next_page_token, "");
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, &PageParams::default());
        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
    }
}
