//! Scanline seed fill.
//!
//! Starting at the seed, the row is scanned left and right for the maximal run of pixels
//! similar to the seed's original color. Every discovered run is queued; processing a run
//! scans the rows directly above and below across its extent, and each unvisited similar
//! sub-run found there is queued in turn. A per-row cache of discovered runs marks visited
//! columns, so every run is found exactly once and the work queue is explicit (no recursion).

use crate::color::{Color, ColorSimilarity};
use crate::error::FillError;
use crate::geometry::{PixelPoint, PixelRect};
use crate::pixel_buffer::PixelBuffer;
use std::collections::BTreeMap;

/// A maximal horizontal run `x1..=x2` of similar pixels in row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanlineRun {
    pub y: i32,
    pub x1: i32,
    pub x2: i32,
}

impl ScanlineRun {
    pub fn len(&self) -> usize {
        (self.x2 - self.x1 + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.x2 < self.x1
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.x1, self.y, self.x2 - self.x1 + 1, 1)
    }
}

/// Computes and applies a flood fill on a [`PixelBuffer`].
///
/// The run set is computed once (lazily, on the first call that needs it) and cached, so
/// undoing and redoing a fill does not rescan the image.
#[derive(Debug, Clone)]
pub struct FloodFill {
    seed: PixelPoint,
    color: Color,
    processed_similarity: i32,
    color_to_change: Option<Color>,
    fill_entire_buffer: bool,
    runs: Option<Vec<ScanlineRun>>,
    bounding_rect: PixelRect,
}

impl FloodFill {
    pub fn new(seed: PixelPoint, color: Color, similarity: ColorSimilarity) -> Self {
        Self {
            seed,
            color,
            processed_similarity: similarity.processed(),
            color_to_change: None,
            fill_entire_buffer: false,
            runs: None,
            bounding_rect: PixelRect::EMPTY,
        }
    }

    /// Skips the scan and treats the whole buffer as the fill region.
    ///
    /// Only valid when the caller knows the buffer is uniform, e.g. a brand-new document.
    pub fn with_fill_entire_buffer(mut self, fill_entire: bool) -> Self {
        self.fill_entire_buffer = fill_entire;
        self
    }

    pub fn fills_entire_buffer(&self) -> bool {
        self.fill_entire_buffer
    }

    pub fn seed(&self) -> PixelPoint {
        self.seed
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn processed_similarity(&self) -> i32 {
        self.processed_similarity
    }

    /// The seed pixel's original color, once recorded.
    pub fn color_to_change(&self) -> Option<Color> {
        self.color_to_change
    }

    /// Records the seed pixel's current color as the color to replace.
    pub fn prepare_color_to_change(&mut self, buffer: &PixelBuffer) -> Result<Color, FillError> {
        if buffer.is_empty() {
            log::warn!("Flood fill requested on an empty buffer");
            return Err(FillError::EmptyBuffer);
        }

        let Some(color) = buffer.pixel(self.seed.x, self.seed.y) else {
            log::warn!(
                "Flood fill seed {} outside {}x{} buffer",
                self.seed,
                buffer.width(),
                buffer.height()
            );
            return Err(FillError::SeedOutOfBounds {
                seed: self.seed,
                width: buffer.width(),
                height: buffer.height(),
            });
        };

        self.color_to_change = Some(color);
        Ok(color)
    }

    /// Runs the scanline search. Does nothing if it already ran.
    pub fn prepare(&mut self, buffer: &PixelBuffer) -> Result<(), FillError> {
        if self.runs.is_some() {
            return Ok(());
        }

        let reference = match self.color_to_change {
            Some(color) => color,
            None => self.prepare_color_to_change(buffer)?,
        };

        if self.fill_entire_buffer {
            self.bounding_rect = buffer.rect();
            self.runs = Some(
                (0..buffer.height() as i32)
                    .map(|y| ScanlineRun {
                        y,
                        x1: 0,
                        x2: buffer.width() as i32 - 1,
                    })
                    .collect(),
            );
            return Ok(());
        }

        let mut scan = Scan {
            buffer,
            reference,
            processed_similarity: self.processed_similarity,
            visited: vec![BTreeMap::new(); buffer.height() as usize],
            runs: Vec::new(),
            pending: Vec::new(),
        };
        scan.run(self.seed);

        self.bounding_rect = scan
            .runs
            .iter()
            .fold(PixelRect::EMPTY, |acc, run| acc.union(&run.rect()));
        log::debug!(
            "Flood fill from {} found {} runs covering {}",
            self.seed,
            scan.runs.len(),
            self.bounding_rect
        );
        self.runs = Some(scan.runs);
        Ok(())
    }

    /// Bounding rectangle of the fill region; scans on first use.
    pub fn bounding_rect(&mut self, buffer: &PixelBuffer) -> Result<PixelRect, FillError> {
        self.prepare(buffer)?;
        Ok(self.bounding_rect)
    }

    /// The discovered runs, if [`FloodFill::prepare`] already ran.
    pub fn runs(&self) -> Option<&[ScanlineRun]> {
        self.runs.as_deref()
    }

    pub fn is_prepared(&self) -> bool {
        self.runs.is_some()
    }

    /// Paints the fill color over every discovered run and returns the affected rectangle.
    pub fn fill(&mut self, buffer: &mut PixelBuffer) -> Result<PixelRect, FillError> {
        self.prepare(buffer)?;

        if self.fill_entire_buffer {
            buffer.fill(self.color);
            return Ok(self.bounding_rect);
        }

        if let Some(runs) = &self.runs {
            for run in runs {
                buffer.fill_span(run.y, run.x1, run.x2, self.color);
            }
        }
        Ok(self.bounding_rect)
    }
}

/// Working state of one scan.
struct Scan<'a> {
    buffer: &'a PixelBuffer,
    reference: Color,
    processed_similarity: i32,
    /// Per row: run start -> run end of every run found so far.
    visited: Vec<BTreeMap<i32, i32>>,
    runs: Vec<ScanlineRun>,
    /// Indices into `runs` whose neighbors have not been scanned yet.
    pending: Vec<usize>,
}

impl Scan<'_> {
    fn run(&mut self, seed: PixelPoint) {
        let first = self.find_run(seed.x, seed.y);
        self.push(first);

        while let Some(index) = self.pending.pop() {
            let run = self.runs[index];
            self.scan_adjacent_row(run, -1);
            self.scan_adjacent_row(run, 1);
        }
    }

    fn push(&mut self, run: ScanlineRun) {
        self.visited[run.y as usize].insert(run.x1, run.x2);
        self.pending.push(self.runs.len());
        self.runs.push(run);
    }

    fn is_similar(&self, x: i32, y: i32) -> bool {
        self.buffer
            .pixel(x, y)
            .is_some_and(|c| c.is_similar(&self.reference, self.processed_similarity))
    }

    /// End of the already-found run covering `(x, y)`, if any.
    fn visited_run_end(&self, x: i32, y: i32) -> Option<i32> {
        self.visited[y as usize]
            .range(..=x)
            .next_back()
            .and_then(|(_, &x2)| (x2 >= x).then_some(x2))
    }

    fn find_run(&self, x: i32, y: i32) -> ScanlineRun {
        let mut x1 = x;
        while self.is_similar(x1 - 1, y) {
            x1 -= 1;
        }
        let mut x2 = x;
        while self.is_similar(x2 + 1, y) {
            x2 += 1;
        }
        ScanlineRun { y, x1, x2 }
    }

    fn scan_adjacent_row(&mut self, run: ScanlineRun, dy: i32) {
        let y = run.y + dy;
        if y < 0 || y >= self.buffer.height() as i32 {
            return;
        }

        let mut x = run.x1;
        while x <= run.x2 {
            if let Some(end) = self.visited_run_end(x, y) {
                x = end + 1;
            } else if self.is_similar(x, y) {
                let found = self.find_run(x, y);
                x = found.x2 + 1;
                self.push(found);
            } else {
                x += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new(width, height, Color::WHITE).unwrap()
    }

    #[test]
    fn uniform_buffer_fills_every_row() {
        let mut buffer = white(10, 10);
        let mut fill = FloodFill::new(PixelPoint::new(5, 5), Color::BLACK, ColorSimilarity::EXACT);
        let rect = fill.fill(&mut buffer).unwrap();

        assert_eq!(rect, PixelRect::new(0, 0, 10, 10));
        let runs = fill.runs().unwrap();
        assert_eq!(runs.len(), 10);
        assert!(runs.iter().all(|r| r.x1 == 0 && r.x2 == 9));
        assert!(buffer.pixels().iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn wall_stops_the_fill() {
        let mut buffer = white(10, 10);
        buffer.fill_rect(PixelRect::new(5, 0, 1, 10), Color::BLACK);
        let mut fill = FloodFill::new(PixelPoint::new(0, 0), Color::BLACK, ColorSimilarity::EXACT);
        let rect = fill.fill(&mut buffer).unwrap();

        assert_eq!(rect, PixelRect::new(0, 0, 5, 10));
        for y in 0..10 {
            for x in 0..10 {
                let expected = if x <= 5 { Color::BLACK } else { Color::WHITE };
                assert_eq!(buffer.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn fill_is_four_connected() {
        // Diagonal neighbours are not connected.
        let mut buffer = white(3, 3);
        buffer.set_pixel(1, 0, Color::BLACK);
        buffer.set_pixel(0, 1, Color::BLACK);
        let mut fill = FloodFill::new(PixelPoint::new(0, 0), Color::RED, ColorSimilarity::EXACT);
        fill.fill(&mut buffer).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some(Color::RED));
        assert_eq!(buffer.pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn snaking_region_is_found_once() {
        // A serpentine corridor forces runs to be discovered from both above and below.
        let mut buffer = white(9, 9);
        for y in [1, 5] {
            buffer.fill_rect(PixelRect::new(0, y, 8, 1), Color::BLACK);
        }
        for y in [3, 7] {
            buffer.fill_rect(PixelRect::new(1, y, 8, 1), Color::BLACK);
        }
        let mut fill = FloodFill::new(PixelPoint::new(0, 0), Color::RED, ColorSimilarity::EXACT);
        fill.prepare(&buffer).unwrap();

        let runs = fill.runs().unwrap();
        let mut sorted = runs.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), runs.len(), "no run may be found twice");

        let covered: usize = runs.iter().map(ScanlineRun::len).sum();
        let white_pixels = buffer.pixels().iter().filter(|&&c| c == Color::WHITE).count();
        assert_eq!(covered, white_pixels);
    }

    #[test]
    fn tolerance_widens_the_region() {
        let mut buffer = white(4, 1);
        buffer.set_pixel(2, 0, Color::rgb(250, 250, 250));
        let mut exact = FloodFill::new(PixelPoint::new(0, 0), Color::BLACK, ColorSimilarity::EXACT);
        assert_eq!(exact.bounding_rect(&buffer).unwrap(), PixelRect::new(0, 0, 2, 1));

        let mut loose =
            FloodFill::new(PixelPoint::new(0, 0), Color::BLACK, ColorSimilarity::from_percent(5));
        assert_eq!(loose.bounding_rect(&buffer).unwrap(), PixelRect::new(0, 0, 4, 1));
    }

    #[test]
    fn transparent_region_fills_exactly() {
        let mut buffer = PixelBuffer::new(3, 1, Color::Transparent).unwrap();
        buffer.set_pixel(2, 0, Color::WHITE);
        let mut fill =
            FloodFill::new(PixelPoint::new(0, 0), Color::BLUE, ColorSimilarity::MAX);
        fill.fill(&mut buffer).unwrap();
        assert_eq!(buffer.pixel(1, 0), Some(Color::BLUE));
        assert_eq!(buffer.pixel(2, 0), Some(Color::WHITE));
    }

    #[test]
    fn seed_outside_is_rejected() {
        let mut buffer = white(4, 4);
        let mut fill = FloodFill::new(PixelPoint::new(4, 0), Color::BLACK, ColorSimilarity::EXACT);
        assert!(matches!(
            fill.fill(&mut buffer),
            Err(FillError::SeedOutOfBounds { .. })
        ));
        assert!(buffer.pixels().iter().all(|&c| c == Color::WHITE));
    }

    #[test]
    fn refilling_with_same_color_finds_same_runs() {
        let mut buffer = white(6, 6);
        buffer.fill_rect(PixelRect::new(0, 3, 6, 1), Color::BLACK);

        let mut first = FloodFill::new(PixelPoint::new(2, 1), Color::RED, ColorSimilarity::EXACT);
        first.fill(&mut buffer).unwrap();
        let mut second = FloodFill::new(PixelPoint::new(2, 1), Color::RED, ColorSimilarity::EXACT);
        second.fill(&mut buffer).unwrap();

        let mut a = first.runs().unwrap().to_vec();
        let mut b = second.runs().unwrap().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(buffer.pixel(0, 4), Some(Color::WHITE));
    }

    #[test]
    fn entire_buffer_fast_path_skips_the_scan() {
        let mut buffer = white(5, 4);
        let mut fill = FloodFill::new(PixelPoint::new(1, 1), Color::GREEN, ColorSimilarity::EXACT)
            .with_fill_entire_buffer(true);
        assert_eq!(fill.fill(&mut buffer).unwrap(), buffer.rect());
        assert!(buffer.pixels().iter().all(|&c| c == Color::GREEN));
    }
}
