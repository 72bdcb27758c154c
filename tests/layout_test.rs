use bed_sideview::app::report::{render_layout, OutputFormat};
use bed_sideview::{BedError, DetectorLayout, ElementCounts, ElementKind, WorldPoint, WorldRect};

fn assert_well_formed(layout: &DetectorLayout) {
    let bounds = layout.bounds();
    let regions: Vec<_> = layout.regions().collect();

    for region in &regions {
        assert!(region.rect.width > 0.0 && region.rect.height > 0.0, "{:?}", region);
        assert!(bounds.encloses(&region.rect), "{} escapes {:?}", region.tag(), bounds);
    }
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            assert!(!a.rect.intersects(&b.rect), "{} overlaps {}", a.tag(), b.tag());
        }
    }
}

#[test]
fn test_layouts_are_well_formed_for_various_bounds() {
    let bounds = [
        WorldRect::default(),
        WorldRect::new(-5.0, 10.0, 12.0, 12.0),
        WorldRect::new(0.0, 0.0, 800.0, 600.0),
        WorldRect::new(100.0, -50.0, 2.0, 9.0),
    ];
    for bounds in bounds {
        for counts in [ElementCounts::SINGLE_CRYSTAL, ElementCounts::FOUR_CRYSTALS] {
            let layout = DetectorLayout::compute(bounds, counts).unwrap();
            assert_eq!(layout.bars().len(), counts.bars());
            assert_eq!(layout.vetoes().len(), counts.total_vetoes());
            assert_well_formed(&layout);
        }
    }
}

#[test]
fn test_every_region_center_locates_itself() {
    let layout =
        DetectorLayout::compute(WorldRect::new(0.0, 0.0, 800.0, 600.0), ElementCounts::FOUR_CRYSTALS)
            .unwrap();
    for region in layout.regions() {
        assert_eq!(layout.locate(region.rect.center()), Some(region.tag()));
    }
}

#[test]
fn test_bar_numbering_is_independent_of_vetoes() {
    let single = DetectorLayout::compute(WorldRect::default(), ElementCounts::SINGLE_CRYSTAL).unwrap();
    let four = DetectorLayout::compute(WorldRect::default(), ElementCounts::FOUR_CRYSTALS).unwrap();

    for i in 0..9 {
        let center = single.bars()[i].rect.center();
        let found = four.locate(center).unwrap();
        assert_eq!(found.kind(), ElementKind::Bar);
        assert_eq!(found.number(), i + 1);
    }
}

#[test]
fn test_points_outside_every_region() {
    let layout = DetectorLayout::compute(WorldRect::default(), ElementCounts::SINGLE_CRYSTAL).unwrap();
    assert_eq!(layout.locate(WorldPoint::new(-1.0, 1.5)), None);
    assert_eq!(layout.locate(WorldPoint::new(0.01, 0.01)), None);
    assert_eq!(layout.locate(WorldPoint::new(1.5, 4.0)), None);
}

#[test]
fn test_degenerate_bounds_rejected() {
    let err = DetectorLayout::compute(WorldRect::new(0.0, 0.0, 0.0, 3.0), ElementCounts::SINGLE_CRYSTAL)
        .unwrap_err();
    assert!(matches!(err, BedError::DegenerateBounds { .. }));
}

#[test]
fn test_layout_report_lists_every_region() {
    let layout = DetectorLayout::compute(WorldRect::default(), ElementCounts::FOUR_CRYSTALS).unwrap();
    let csv = render_layout(&layout, OutputFormat::Csv).unwrap();
    assert_eq!(csv.lines().count(), 1 + 43);
    assert!(csv.lines().last().unwrap().starts_with("v34,veto,"));
}
