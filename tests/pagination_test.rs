//! Integration tests for the pagination engine.

use folio::error::Error;
use folio::paginate::{PaginationOptions, Paginator, SliceSource};
use folio::PageGeometry;

fn source(height: f64, logical_index: usize, logical_count: usize) -> SliceSource {
    SliceSource {
        image_id: format!("page-{}", logical_index + 1),
        height,
        logical_index,
        logical_count,
    }
}

#[test]
fn test_two_and_a_half_pages() {
    let paginator = Paginator::with_geometry(PageGeometry::a4()).unwrap();
    let p = paginator.slice_height_limit();
    let height = 2.5 * p;

    let pages = paginator.paginate(&source(height, 0, 1), 1).unwrap();
    let slices: Vec<f64> = pages
        .iter()
        .flat_map(|page| page.placements.iter().map(|pl| pl.slice_height))
        .collect();

    assert_eq!(pages.len(), 3);
    assert_eq!(slices, vec![p, p, 0.5 * p]);
    assert_eq!(slices.iter().sum::<f64>(), height);
}

#[test]
fn test_zero_height_single_empty_slice() {
    let paginator = Paginator::with_geometry(PageGeometry::letter()).unwrap();
    let pages = paginator.paginate(&source(0.0, 0, 1), 1).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].placements.len(), 1);
    assert_eq!(pages[0].placements[0].slice_height, 0.0);
}

#[test]
fn test_slices_sum_to_height() {
    let paginator = Paginator::with_geometry(PageGeometry::a4()).unwrap();
    for height in [1.0, 236.9, 237.0, 237.1, 1000.0, 4321.123] {
        let pages = paginator.paginate(&source(height, 0, 1), 1).unwrap();
        let total: f64 = pages.iter().map(|p| p.content_height()).sum();
        assert!((total - height).abs() < 1e-6, "height {height} summed to {total}");
        for page in &pages {
            assert!(page.content_height() <= paginator.slice_height_limit() + 1e-9);
        }
    }
}

#[test]
fn test_footers_across_logical_pages() {
    let paginator = Paginator::with_geometry(PageGeometry::a4()).unwrap();
    let limit = paginator.slice_height_limit();

    let first = paginator.paginate(&source(limit * 1.5, 0, 2), 1).unwrap();
    let second = paginator
        .paginate(&source(10.0, 1, 2), 1 + first.len())
        .unwrap();

    let footers: Vec<&str> = first
        .iter()
        .chain(second.iter())
        .map(|p| p.footer.as_str())
        .collect();
    assert_eq!(
        footers,
        vec!["Page 1 of 2", "Page 1 of 2 (continued)", "Page 2 of 2"]
    );
    assert_eq!(second[0].index, 3);
    assert_eq!(second[0].placements[0].physical_page_index, 3);
}

#[test]
fn test_margin_too_large_rejected() {
    let geometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 150.0,
    };
    assert!(matches!(
        Paginator::new(geometry, PaginationOptions::default()),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_custom_footer_reserve() {
    let paginator = Paginator::new(
        PageGeometry::a4(),
        PaginationOptions::new().with_footer_reserve(0.0),
    )
    .unwrap();
    assert_eq!(paginator.slice_height_limit(), 257.0);
    assert_eq!(paginator.page_count_for(514.0), 2);
}

#[test]
fn test_enormous_height_fails_fast() {
    let paginator = Paginator::with_geometry(PageGeometry::a4()).unwrap();
    let started = std::time::Instant::now();

    for height in [1e20, 1e300, f64::MAX] {
        let result = paginator.paginate(&source(height, 0, 1), 1);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
    assert_eq!(paginator.page_count_for(1e9), 4_219_410);
}
