use crate::domain::model::{ElementCounts, ElementKind, ElementTag};

/// Every tag a well-formed calibration file lists, in file order:
/// `b1..b<bars>`, then `v1..v<total vetoes>` (crystals, internal ring, external ring).
pub fn tag_universe(counts: &ElementCounts) -> Vec<ElementTag> {
    let bars = (0..counts.bars()).map(|index| ElementTag::from_index(ElementKind::Bar, index));
    let vetoes = (0..counts.total_vetoes()).map(|index| ElementTag::from_index(ElementKind::Veto, index));
    bars.chain(vetoes).collect()
}

/// True when `tag` names an element of this detector configuration.
pub fn in_universe(counts: &ElementCounts, tag: &ElementTag) -> bool {
    match tag.kind() {
        ElementKind::Bar => tag.number() <= counts.bars(),
        ElementKind::Veto => tag.number() <= counts.total_vetoes(),
    }
}
