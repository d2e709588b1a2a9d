//! Printer's spread page mapping
//!
//! A booklet of `2N` pages printed as a printer's spread occupies `N` sheets.
//! Sheet `s` carries logical pages `s + 1` and `2N - s`. Reading order is
//! recovered in two passes over the sheets:
//!
//! - forward over sheets `0..N` for pages `1..=N`
//! - backward over sheets `N-1..=0` for pages `N+1..=2N`
//!
//! The half cut from a sheet alternates with every emitted page and is never
//! reset between the passes, so output page `j` (0-based) always takes
//! `[Bottom, Top][j % 2]`.

use crate::error::{Error, Result};
use crate::layout::{Half, Rect, SpreadCrops};

/// Half used for the first emitted page; the rest alternate from here
const HALF_CYCLE: [Half; 2] = [Half::Bottom, Half::Top];

/// One page of the output document: which sheet, which half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPage {
    /// 0-based index of the source sheet
    pub source_index: usize,
    pub half: Half,
}

impl OutputPage {
    pub fn crop(&self, crops: &SpreadCrops) -> Rect {
        crops.crop(self.half)
    }
}

/// Half cut for the output page at 0-based position `j`
pub fn half_for_position(j: usize) -> Half {
    HALF_CYCLE[j % 2]
}

/// Map `page_count` spread sheets to `2 * page_count` output pages
///
/// Fails with `UnsupportedDocument` for an empty document and with
/// `InvalidArgument` for an odd sheet count, which cannot hold a contiguous
/// booklet.
pub fn remap(page_count: usize) -> Result<Vec<OutputPage>> {
    if page_count == 0 {
        return Err(Error::UnsupportedDocument("document has no pages".to_string()));
    }
    if page_count % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "printer's spread needs an even number of sheets, got {}",
            page_count
        )));
    }

    let forward = 0..page_count;
    let backward = (0..page_count).rev();

    let pages = forward
        .chain(backward)
        .enumerate()
        .map(|(j, source_index)| OutputPage {
            source_index,
            half: half_for_position(j),
        })
        .collect();

    Ok(pages)
}

/// Output pages paired with the crop rectangles they resolve to
#[derive(Debug, Clone, PartialEq)]
pub struct CropPlan {
    pub crops: SpreadCrops,
    pub pages: Vec<OutputPage>,
}

impl CropPlan {
    pub fn new(page_count: usize, crops: SpreadCrops) -> Result<Self> {
        Ok(Self {
            crops,
            pages: remap(page_count)?,
        })
    }

    /// `(source_index, crop)` pairs in output order
    pub fn pages(&self) -> impl Iterator<Item = (usize, Rect)> + '_ {
        self.pages
            .iter()
            .map(move |page| (page.source_index, page.crop(&self.crops)))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MarginOffset;

    /// Logical page printed on a given half of a sheet in a `2n`-page booklet
    fn printed_page(sheet: usize, half: Half, sheet_count: usize) -> usize {
        let front = sheet + 1;
        let back = 2 * sheet_count - sheet;
        match (sheet % 2 == 0, half) {
            (true, Half::Bottom) | (false, Half::Top) => front,
            (true, Half::Top) | (false, Half::Bottom) => back,
        }
    }

    #[test]
    fn test_two_sheet_booklet() {
        // Sheets (p4 / p1) and (p2 / p3), top over bottom
        let pages = remap(2).unwrap();
        let expected = vec![
            OutputPage { source_index: 0, half: Half::Bottom },
            OutputPage { source_index: 1, half: Half::Top },
            OutputPage { source_index: 1, half: Half::Bottom },
            OutputPage { source_index: 0, half: Half::Top },
        ];
        assert_eq!(pages, expected);

        let layout = [[4, 1], [2, 3]]; // [top, bottom] per sheet
        let read: Vec<usize> = pages
            .iter()
            .map(|p| match p.half {
                Half::Top => layout[p.source_index][0],
                Half::Bottom => layout[p.source_index][1],
            })
            .collect();
        assert_eq!(read, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reading_order_for_even_sheet_counts() {
        for n in (2..=40).step_by(2) {
            let read: Vec<usize> = remap(n)
                .unwrap()
                .iter()
                .map(|p| printed_page(p.source_index, p.half, n))
                .collect();
            let expected: Vec<usize> = (1..=2 * n).collect();
            assert_eq!(read, expected, "reading order broken for {} sheets", n);
        }
    }

    #[test]
    fn test_each_sheet_visited_once_per_half() {
        let n = 12;
        let pages = remap(n).unwrap();
        assert_eq!(pages.len(), 2 * n);
        for sheet in 0..n {
            let halves: Vec<Half> = pages
                .iter()
                .filter(|p| p.source_index == sheet)
                .map(|p| p.half)
                .collect();
            assert_eq!(halves.len(), 2);
            assert_ne!(halves[0], halves[1]);
        }
    }

    #[test]
    fn test_alternation_continues_across_passes() {
        let pages = remap(4).unwrap();
        for (j, page) in pages.iter().enumerate() {
            assert_eq!(page.half, half_for_position(j));
        }
        // Last of the forward pass and first of the backward pass hit the same sheet
        assert_eq!(pages[3].source_index, 3);
        assert_eq!(pages[4].source_index, 3);
        assert_ne!(pages[3].half, pages[4].half);
    }

    #[test]
    fn test_remap_is_deterministic() {
        assert_eq!(remap(24).unwrap(), remap(24).unwrap());
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(remap(0), Err(Error::UnsupportedDocument(_))));
    }

    #[test]
    fn test_odd_sheet_count_rejected() {
        for n in [1, 3, 23] {
            assert!(matches!(remap(n), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_crop_plan_resolves_rectangles() {
        let media_box = Rect::from_media_box(0.0, 0.0, 500.0, 800.0);
        let crops = SpreadCrops::split(media_box, MarginOffset::new(5.0).unwrap()).unwrap();
        let plan = CropPlan::new(2, crops).unwrap();
        assert_eq!(plan.len(), 4);

        let resolved: Vec<(usize, Rect)> = plan.pages().collect();
        assert_eq!(resolved[0], (0, Rect::new(5.0, 5.0, 495.0, 395.0)));
        assert_eq!(resolved[1], (1, Rect::new(5.0, 405.0, 495.0, 795.0)));
        assert_eq!(resolved[2], (1, Rect::new(5.0, 5.0, 495.0, 395.0)));
        assert_eq!(resolved[3], (0, Rect::new(5.0, 405.0, 495.0, 795.0)));
    }
}
